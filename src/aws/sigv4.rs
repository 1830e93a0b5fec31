//! AWS Signature Version 4 for JSON-protocol requests
//!
//! Thin adapter over `aws-sigv4`: takes the request parts `AwsHttpClient`
//! already holds and returns the headers to attach.

use super::auth::Credentials;
use super::error::ApiError;
use aws_sigv4::http_request::{
    sign as sign_request, SignableBody, SignableRequest, SigningParams as RequestSigningParams,
    SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use std::time::SystemTime;
use url::Url;

/// Everything needed to sign one request
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: SystemTime,
}

/// Sign a request.
///
/// `headers` are the headers the caller will send (besides `host`, which is
/// derived from `url`). Returns the extra headers to attach: `x-amz-date`,
/// `x-amz-security-token` when a session token is present, and
/// `authorization`.
pub fn sign(
    params: &SigningParams<'_>,
    method: &str,
    url: &Url,
    headers: &[(String, String)],
    payload: &[u8],
) -> Result<Vec<(String, String)>, ApiError> {
    let identity: Identity = params.credentials.clone().into();
    let signing_params: RequestSigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(params.region)
        .name(params.service)
        .time(params.time)
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| ApiError::Config(format!("invalid signing parameters: {}", e)))?
        .into();

    let signable = SignableRequest::new(
        method,
        url.as_str(),
        headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        SignableBody::Bytes(payload),
    )
    .map_err(|e| ApiError::Config(format!("unsignable request: {}", e)))?;

    let (instructions, _signature) = sign_request(signable, &signing_params)
        .map_err(|e| ApiError::Config(format!("failed to sign request: {}", e)))?
        .into_parts();
    let (added, _query) = instructions.into_parts();

    Ok(added
        .iter()
        .map(|h| (h.name().to_string(), h.value().to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn header<'a>(added: &'a [(String, String)], name: &str) -> Option<&'a str> {
        added
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_get_vanilla_vector() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET, None, None, "test");
        let params = SigningParams {
            credentials: &credentials,
            region: "us-east-1",
            service: "service",
            time: Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap().into(),
        };
        let url = Url::parse("https://example.amazonaws.com/").unwrap();

        let added = sign(&params, "GET", &url, &[], b"").unwrap();

        assert_eq!(
            header(&added, "authorization").unwrap(),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert_eq!(header(&added, "x-amz-date"), Some("20150830T123600Z"));
    }

    #[test]
    fn test_session_token_is_signed() {
        let credentials = Credentials::new(
            "AKIDEXAMPLE",
            SECRET,
            Some("session".to_string()),
            None,
            "test",
        );
        let params = SigningParams {
            credentials: &credentials,
            region: "eu-west-1",
            service: "sagemaker",
            time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap().into(),
        };
        let url = Url::parse("https://api.sagemaker.eu-west-1.amazonaws.com/").unwrap();
        let headers = vec![(
            "x-amz-target".to_string(),
            "SageMaker.ListApps".to_string(),
        )];

        let added = sign(&params, "POST", &url, &headers, b"{}").unwrap();

        assert_eq!(header(&added, "x-amz-security-token"), Some("session"));
        let auth = header(&added, "authorization").unwrap();
        assert!(auth.contains("SignedHeaders=host;x-amz-date;x-amz-security-token;x-amz-target"), "{auth}");
        assert!(auth.contains("/20240102/eu-west-1/sagemaker/aws4_request"));
    }

    #[test]
    fn test_local_endpoint_with_port() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET, None, None, "test");
        let params = SigningParams {
            credentials: &credentials,
            region: "us-east-1",
            service: "sagemaker",
            time: SystemTime::now(),
        };
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();

        let added = sign(&params, "POST", &url, &[], b"{}").unwrap();
        assert!(header(&added, "authorization").is_some());
    }
}
