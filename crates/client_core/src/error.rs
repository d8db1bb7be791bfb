use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} returned status {status}: {error}")]
    Status {
        endpoint: String,
        status: u16,
        error: ApiError,
    },
    #[error("failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiClientError {
    /// True when the server was never reached (connect, timeout, body read).
    pub fn is_network(&self) -> bool {
        matches!(self, ApiClientError::Transport { .. })
    }

    /// Short text suitable for showing next to stale results.
    pub fn user_message(&self) -> String {
        match self {
            ApiClientError::Status { error, .. } if !error.message.is_empty() => {
                error.message.clone()
            }
            ApiClientError::Transport { .. } => {
                "Server unreachable; check your connection and retry.".to_string()
            }
            other => other.to_string(),
        }
    }
}
