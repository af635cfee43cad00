use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error (status {}): {}", .status.as_u16(), .detail)]
    Api {
        status: StatusCode,
        detail: ErrorDetail,
    },

    #[error("API error (status {}): {body}", .status.as_u16())]
    Http { status: StatusCode, body: String },

    #[error("request failed after retries: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("token refresh failed: {0}")]
    Refresh(#[source] BoxError),

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Maps a non-2xx response, preferring the structured error body.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorDetail>(body) {
            Ok(detail) if !detail.is_empty() => ApiError::Api { status, detail },
            _ => ApiError::Http {
                status,
                body: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } | ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Error body returned by the 42 API and its OAuth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    // Some endpoints only send "message"
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDetail {
    fn is_empty(&self) -> bool {
        self.error.is_none() && self.error_description.is_none() && self.message.is_none()
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let human = self
            .message
            .as_deref()
            .or(self.error_description.as_deref());
        match (self.error.as_deref(), human) {
            (Some(code), Some(human)) => write!(f, "{}: {}", code, human),
            (Some(code), None) => f.write_str(code),
            (None, Some(human)) => f.write_str(human),
            (None, None) => f.write_str("unknown error"),
        }
    }
}
