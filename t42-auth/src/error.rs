use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not logged in. Run `t42 auth login` first.")]
    NotLoggedIn,

    #[error("Access token expired and no refresh token is stored. Run `t42 auth login` again.")]
    RefreshUnavailable,

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("OAuth state mismatch in callback; the redirect was not issued for this login")]
    StateMismatch,

    #[error("Authorization server returned {error}: {}", .description.as_deref().unwrap_or("no description"))]
    Provider {
        error: String,
        description: Option<String>,
    },

    #[error("Callback did not include an authorization code")]
    MissingCode,

    #[error("Timed out after {}s waiting for the browser redirect", .0.as_secs())]
    CallbackTimeout(Duration),

    #[error("Login cancelled")]
    Cancelled,

    #[error("Could not bind a loopback callback listener: {0}")]
    Bind(String),

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("Token request failed: {0}")]
    TokenRequest(String),

    #[error("Could not generate PKCE parameters: {0}")]
    Pkce(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
