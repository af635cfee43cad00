//! Builds API clients from settings and stored credentials.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use std::sync::Arc;
use t42_api::{BoxError, Client, ClientConfig, TokenRefresher};
use t42_auth::{
    AuthError, Credentials, LoginFlow, OAuthClient, Settings, TokenStore, ensure_fresh_credentials,
    refresh_stored,
};
use tokio_util::sync::CancellationToken;

/// Refreshes the user token through the stored refresh token, saving the result.
pub struct StoredCredentialsRefresher {
    store: TokenStore,
    oauth: OAuthClient,
}

impl StoredCredentialsRefresher {
    pub fn new(store: TokenStore, oauth: OAuthClient) -> Self {
        Self { store, oauth }
    }
}

#[async_trait]
impl TokenRefresher for StoredCredentialsRefresher {
    async fn refresh(&self) -> Result<SecretString, BoxError> {
        let current = self.store.load()?;
        let refreshed = refresh_stored(&self.store, &self.oauth, &current).await?;
        tracing::info!(expires_at = %refreshed.expires_at, "User token refreshed after 401");
        Ok(SecretString::from(refreshed.access_token))
    }
}

/// Re-acquires an application token; these are never persisted.
pub struct ClientCredentialsRefresher {
    oauth: OAuthClient,
}

impl ClientCredentialsRefresher {
    pub fn new(oauth: OAuthClient) -> Self {
        Self { oauth }
    }
}

#[async_trait]
impl TokenRefresher for ClientCredentialsRefresher {
    async fn refresh(&self) -> Result<SecretString, BoxError> {
        let credentials = self.oauth.client_credentials().await?;
        Ok(SecretString::from(credentials.access_token))
    }
}

pub fn client_config(settings: &Settings) -> ClientConfig {
    let config =
        ClientConfig::new(settings.api_base_url.as_str()).timeout(settings.request_timeout());
    match settings.user_agent.as_deref() {
        Some(user_agent) => config.user_agent(user_agent),
        None => config,
    }
}

/// Client authenticated as the logged-in user, refreshing the stored token as needed.
pub async fn user_client(
    settings: &Settings,
    store: TokenStore,
    cancel: &CancellationToken,
) -> Result<Client> {
    let config = client_config(settings);

    let oauth = match OAuthClient::new(settings) {
        Ok(oauth) => oauth,
        // Without a client secret the stored token is still usable, just not refreshable
        Err(AuthError::Configuration(reason)) => {
            let credentials = usable_without_refresh(store.load()?)?;
            tracing::warn!(%reason, "Client credentials missing, token refresh disabled");
            return Ok(Client::with_config(&credentials.access_token, config)?
                .with_cancellation(cancel.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    let credentials = ensure_fresh_credentials(&store, &oauth).await?;
    let refresher = StoredCredentialsRefresher::new(store, oauth);

    Ok(Client::with_config(&credentials.access_token, config)?
        .with_refresher(Arc::new(refresher))
        .with_cancellation(cancel.clone()))
}

/// Client authenticated as the application itself (Client Credentials grant).
pub async fn app_client(settings: &Settings, cancel: &CancellationToken) -> Result<Client> {
    let mut flow = LoginFlow::new(settings)
        .context("Application credentials are needed to read project session rules")?;
    let credentials = flow
        .client_credentials(cancel)
        .await
        .context("Failed to obtain an application token")?;
    let refresher = ClientCredentialsRefresher::new(OAuthClient::new(settings)?);

    Ok(Client::with_config(&credentials.access_token, client_config(settings))?
        .with_refresher(Arc::new(refresher))
        .with_cancellation(cancel.clone()))
}

fn usable_without_refresh(credentials: Credentials) -> Result<Credentials, AuthError> {
    if credentials.is_expired(Utc::now()) {
        return Err(AuthError::RefreshUnavailable);
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use secrecy::ExposeSecret;
    use std::time::Duration as StdDuration;

    #[test]
    fn config_follows_settings() {
        let settings = Settings {
            api_base_url: "http://127.0.0.1:9000/".into(),
            request_timeout_secs: 5,
            user_agent: Some("t42-test".into()),
            ..Settings::default()
        };

        let config = client_config(&settings);

        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, StdDuration::from_secs(5));
        assert_eq!(config.user_agent, "t42-test");
    }

    #[tokio::test]
    async fn stored_token_is_used_without_client_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));
        let now = Utc::now();
        store
            .save(&Credentials {
                access_token: "stored".into(),
                refresh_token: None,
                token_type: "bearer".into(),
                scope: "public".into(),
                created_at: now,
                expires_at: now + Duration::hours(1),
            })
            .unwrap();

        let client = user_client(&Settings::default(), store, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.current_token().expose_secret(), "stored");
    }

    #[tokio::test]
    async fn missing_credentials_file_means_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));

        let err = user_client(&Settings::default(), store, &CancellationToken::new())
            .await
            .err()
            .unwrap();

        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::NotLoggedIn)
        ));
    }
}
