/*
[INPUT]:  Transport failures, Task Service status codes, token state, payload decoding
[OUTPUT]: `TaskdeckError` with retry and auth classification
[POS]:    Error handling layer - every adapter call returns this
[UPDATE]: When the service grows a new failure mode or retry rules change
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the Task Service.
///
/// Lenient task fields never surface here; `Serialization` means the payload
/// shape itself was unreadable.
#[derive(Error, Debug)]
pub enum TaskdeckError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than auth and rate limiting
    #[error("Task Service error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// 401/403 from the service
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No bearer token is configured; requests are suppressed
    #[error("No bearer token configured, request suppressed")]
    MissingToken,

    #[error("Bearer token expired, please sign in again")]
    TokenExpired,

    #[error("Could not decode Task Service payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid Task Service URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// 429 with the service's `Retry-After`
    #[error("Task Service is throttling requests, retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Task Service did not answer within {duration}s")]
    Timeout { duration: u64 },
}

impl TaskdeckError {
    /// Whether a GET may be sent again. Writes are never retried by the client.
    pub fn is_retryable(&self) -> bool {
        match self {
            TaskdeckError::Http(_)
            | TaskdeckError::RateLimit { .. }
            | TaskdeckError::Timeout { .. } => true,
            TaskdeckError::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Delay the service asked for, in seconds
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            TaskdeckError::RateLimit { retry_after } => Some(*retry_after),
            TaskdeckError::Timeout { .. } => Some(1),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            TaskdeckError::Authentication { .. }
                | TaskdeckError::MissingToken
                | TaskdeckError::TokenExpired
        )
    }

    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        TaskdeckError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskdeckError>;
