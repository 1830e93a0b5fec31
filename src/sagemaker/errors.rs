//! Error classification
//!
//! Turns a raw [`ApiError`] into a [`ClassifiedError`]: authentication
//! problems the user has to fix, transient faults worth retrying, and
//! everything else.

use crate::aws::error::ApiError;
use thiserror::Error;

/// Provider codes meaning the credentials or permissions are unusable
pub const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDeniedException",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "ExpiredTokenException",
    "UnrecognizedClientException",
];

/// Provider codes for throttling and transient server-side faults
pub const TRANSIENT_ERROR_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "InternalFailure",
    "InternalServerError",
    "InternalError",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "RequestTimeout",
    "RequestTimeoutException",
];

/// Failure texts produced when no role could be resolved from instance metadata
const ROLE_RESOLUTION_PATTERNS: &[&str] = &[
    "no EC2 IMDS role found",
    "failed to refresh cached credentials",
    "no valid credential sources",
    "no providers in chain provided credentials",
];

pub const HINT_NO_ROLE: &str = "No AWS role configured.";
pub const HINT_ACCESS_DENIED: &str =
    "The configured identity is not allowed to list SageMaker resources.";
pub const HINT_BAD_CREDENTIALS: &str =
    "AWS credentials are invalid or expired. Refresh them or select another profile.";

/// A failure after classification. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    /// Credentials or permissions are unusable; the user must fix them
    #[error("{message}")]
    Authentication {
        code: Option<String>,
        message: String,
        hint: String,
    },

    /// Expected to resolve itself on retry
    #[error("{message}")]
    Transient { code: Option<String>, message: String },

    /// Retrying will not help
    #[error("{message}")]
    Permanent { code: Option<String>, message: String },

    /// A transient failure that outlasted the retry budget
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ClassifiedError>,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl ClassifiedError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Remediation hint for authentication failures
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Authentication { hint, .. } => Some(hint.as_str()),
            _ => None,
        }
    }

    /// Provider code, looking through a retry-exhaustion wrapper
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Authentication { code, .. }
            | Self::Transient { code, .. }
            | Self::Permanent { code, .. } => code.as_deref(),
            Self::RetriesExhausted { last, .. } => last.code(),
            Self::Cancelled => None,
        }
    }

    /// Number of attempts made, when retries ran out
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Decides what a raw failure means
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, err: ApiError) -> ClassifiedError;
}

/// Classification rules for AWS services
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsErrorClassifier;

impl ErrorClassifier for AwsErrorClassifier {
    fn classify(&self, err: ApiError) -> ClassifiedError {
        let message = err.to_string();
        let code = err.code().map(str::to_string);

        if let Some(c) = code.as_deref() {
            if AUTH_ERROR_CODES.contains(&c) {
                let hint = if c == "AccessDeniedException" {
                    HINT_ACCESS_DENIED
                } else {
                    HINT_BAD_CREDENTIALS
                };
                return ClassifiedError::Authentication {
                    code,
                    message,
                    hint: hint.to_string(),
                };
            }
        }

        if ROLE_RESOLUTION_PATTERNS.iter().any(|p| message.contains(p)) {
            return ClassifiedError::Authentication {
                code,
                message,
                hint: HINT_NO_ROLE.to_string(),
            };
        }

        if matches!(err, ApiError::Credentials(_)) {
            return ClassifiedError::Authentication {
                code,
                message,
                hint: HINT_BAD_CREDENTIALS.to_string(),
            };
        }

        if is_transient(&err) {
            return ClassifiedError::Transient { code, message };
        }

        ClassifiedError::Permanent { code, message }
    }
}

fn is_transient(err: &ApiError) -> bool {
    match err {
        ApiError::Service { code, status, .. } => {
            TRANSIENT_ERROR_CODES.contains(&code.as_str()) || *status == 429 || *status >= 500
        }
        ApiError::Transport(e) => {
            e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
        }
        ApiError::Credentials(_) | ApiError::Decode(_) | ApiError::Config(_) => false,
    }
}
