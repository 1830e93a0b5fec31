//! HTTP utilities for AWS JSON 1.1 API calls

use super::auth::AwsCredentials;
use super::error::{sanitize_error_code, ApiError, UNKNOWN_ERROR_CODE};
use super::sigv4::{self, SigningParams};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::SystemTime;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Endpoint for `service` in `region`, honoring the standard overrides
pub fn resolve_endpoint(
    service: &str,
    region: &str,
    configured: Option<&str>,
) -> Result<Option<Url>> {
    let env_key = format!("AWS_ENDPOINT_URL_{}", service.to_ascii_uppercase());
    let override_url = std::env::var(&env_key)
        .ok()
        .or_else(|| std::env::var("AWS_ENDPOINT_URL").ok())
        .or_else(|| configured.map(str::to_string))
        .filter(|u| !u.trim().is_empty());

    if let Some(raw) = override_url {
        let url = Url::parse(&raw).with_context(|| format!("Invalid endpoint URL: {}", raw))?;
        return Ok(Some(url));
    }

    if region.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(&format!("https://api.{}.{}.amazonaws.com/", service, region))
        .with_context(|| format!("Invalid region: {}", region))?;
    Ok(Some(url))
}

/// HTTP client wrapper for one AWS JSON-protocol service
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
    endpoint: Option<Url>,
    region: String,
    signing_name: String,
    target_prefix: String,
    credentials: AwsCredentials,
}

impl AwsHttpClient {
    /// Create a new client for `signing_name` (e.g. `sagemaker`) whose
    /// operations are addressed as `<target_prefix>.<Operation>`
    pub fn new(
        signing_name: &str,
        target_prefix: &str,
        region: &str,
        endpoint_url: Option<&str>,
        credentials: AwsCredentials,
    ) -> Result<Self> {
        let endpoint = resolve_endpoint(signing_name, region, endpoint_url)?;
        Self::with_endpoint(signing_name, target_prefix, region, endpoint, credentials)
    }

    /// Create a client against an explicit endpoint
    pub fn with_endpoint(
        signing_name: &str,
        target_prefix: &str,
        region: &str,
        endpoint: Option<Url>,
        credentials: AwsCredentials,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("mohua/{}", crate::VERSION))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            region: region.to_string(),
            signing_name: signing_name.to_string(),
            target_prefix: target_prefix.to_string(),
            credentials,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Invoke `operation` with a JSON input and decode the JSON output
    pub async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O, ApiError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Err(ApiError::Config(format!(
                "failed to resolve service endpoint for {}, an AWS region is required",
                operation
            )));
        };

        let body = serde_json::to_vec(input)?;
        let credentials = self.credentials.get().await?;
        let target = format!("{}.{}", self.target_prefix, operation);

        let headers = vec![
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("x-amz-target".to_string(), target),
        ];
        let signing_region = if self.region.is_empty() {
            "us-east-1"
        } else {
            self.region.as_str()
        };
        let params = SigningParams {
            credentials: &credentials,
            region: signing_region,
            service: &self.signing_name,
            time: SystemTime::now(),
        };
        let signed = sigv4::sign(&params, "POST", endpoint, &headers, &body)?;

        let mut header_map = HeaderMap::new();
        for (name, value) in headers.iter().chain(signed.iter()) {
            header_map.insert(
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| ApiError::Config(format!("invalid header {}: {}", name, e)))?,
                HeaderValue::from_str(value)
                    .map_err(|e| ApiError::Config(format!("invalid header {}: {}", name, e)))?,
            );
        }
        header_map.insert(
            "amz-sdk-invocation-id",
            HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
                .map_err(|e| ApiError::Config(e.to_string()))?,
        );

        tracing::debug!("POST {} ({})", endpoint, operation);

        let response = self
            .client
            .post(endpoint.clone())
            .headers(header_map)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let error_type = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let request_id = response
            .headers()
            .get("x-amzn-requestid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(parse_error_response(
                status.as_u16(),
                error_type.as_deref(),
                request_id,
                &text,
            ));
        }

        // Operations with no output send an empty body
        if text.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Build a structured error from a failed JSON-protocol response
pub fn parse_error_response(
    status: u16,
    error_type_header: Option<&str>,
    request_id: Option<String>,
    body: &str,
) -> ApiError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    let code = error_type_header
        .filter(|h| !h.trim().is_empty())
        .or_else(|| parsed.get("__type").and_then(|v| v.as_str()))
        .or_else(|| parsed.get("code").and_then(|v| v.as_str()))
        .map(sanitize_error_code)
        .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string());

    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    ApiError::Service {
        code,
        message,
        status,
        request_id,
    }
}
