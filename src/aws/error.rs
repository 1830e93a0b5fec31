//! Raw AWS failures
//!
//! These are the failures exactly as the transport or the service reported
//! them. Deciding what they *mean* (retry, give up, fix credentials) is the
//! classifier's job in [`crate::sagemaker::errors`].

use thiserror::Error;

/// Code used when a service error response carried no recognizable code
pub const UNKNOWN_ERROR_CODE: &str = "UnknownError";

/// A failure returned by a remote call
#[derive(Debug, Error)]
pub enum ApiError {
    /// Structured error response from the service
    #[error("{code}: {message}")]
    Service {
        code: String,
        message: String,
        status: u16,
        request_id: Option<String>,
    },

    /// No usable credentials could be resolved
    #[error("{0}")]
    Credentials(String),

    /// The request never produced a response (connect, timeout, body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client-side configuration problem (e.g. no region to build an endpoint)
    #[error("{0}")]
    Config(String),
}

impl ApiError {
    /// Build a service error; mostly useful for tests and mocks
    pub fn service(code: &str, message: &str) -> Self {
        Self::Service {
            code: code.to_string(),
            message: message.to_string(),
            status: 400,
            request_id: None,
        }
    }

    /// Provider error code, if the failure came from the service
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// HTTP status of a service error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Normalize an AWS error code.
///
/// JSON protocols may send `aws.protocoltests#ThrottlingException` in
/// `__type` or `ThrottlingException:http://internal.amazon.com/...` in the
/// `x-amzn-ErrorType` header. Both reduce to `ThrottlingException`.
pub fn sanitize_error_code(raw: &str) -> String {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    let without_namespace = without_suffix.rsplit('#').next().unwrap_or(without_suffix);
    without_namespace.trim().to_string()
}
