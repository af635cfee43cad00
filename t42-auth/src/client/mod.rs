mod config;
mod flow;
mod oauth_client;
mod token_storage;

pub use config::{Settings, config_dir, credentials_path, dotenv_path, settings_path};
pub use flow::{Browser, FlowState, LoginFlow, NoBrowser, SystemBrowser};
pub use oauth_client::OAuthClient;
pub use token_storage::{EXPIRY_BUFFER, TokenStore, needs_refresh_at};

use crate::common::Credentials;
use crate::error::AuthError;
use chrono::Utc;

/// Loads stored credentials, refreshing and re-saving them when close to expiry.
///
/// Credentials without a refresh token stay usable until they actually expire;
/// after that the user has to log in again.
pub async fn ensure_fresh_credentials(
    store: &TokenStore,
    oauth: &OAuthClient,
) -> Result<Credentials, AuthError> {
    let credentials = store.load()?;
    if !store.needs_refresh(&credentials) {
        return Ok(credentials);
    }

    if !credentials.can_refresh() {
        if credentials.is_expired(Utc::now()) {
            return Err(AuthError::RefreshUnavailable);
        }
        return Ok(credentials);
    }

    tracing::info!(expires_at = %credentials.expires_at, "Access token near expiry, refreshing");
    refresh_stored(store, oauth, &credentials).await
}

/// Refreshes `current` and persists the result before handing it out.
pub async fn refresh_stored(
    store: &TokenStore,
    oauth: &OAuthClient,
    current: &Credentials,
) -> Result<Credentials, AuthError> {
    let refreshed = oauth.refresh(current).await?;
    store.save(&refreshed)?;
    Ok(refreshed)
}
