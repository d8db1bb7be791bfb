use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    Internal,
    #[default]
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::Validation,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            429 => ErrorCode::RateLimited,
            500..=599 => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

/// Error body returned by the storefront API on non-2xx responses.
///
/// The server only guarantees `message`; `code` is filled from the HTTP
/// status when the body omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    #[serde(default)]
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Decodes an error body, falling back to the raw text when it is not JSON.
    pub fn from_response(status: u16, body: &str) -> Self {
        let status_code = ErrorCode::from_status(status);
        match serde_json::from_str::<ApiError>(body) {
            Ok(mut parsed) => {
                if parsed.code == ErrorCode::Unknown {
                    parsed.code = status_code;
                }
                if parsed.message.is_empty() {
                    parsed.message = format!("request failed with status {status}");
                }
                parsed
            }
            Err(_) => {
                let trimmed = body.trim();
                let message = if trimmed.is_empty() {
                    format!("request failed with status {status}")
                } else {
                    trimmed.to_string()
                };
                Self::new(status_code, message)
            }
        }
    }
}
