use super::config::Settings;
use crate::common::Credentials;
use crate::error::AuthError;
use crate::pkce::PkceParams;
use chrono::{DateTime, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest,
    HttpResponse, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use std::time::Duration;

/// 42 tokens are valid for two hours when the response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7200);

// Async HTTP client for oauth2 token requests
async fn http_client(request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .build()?;
    let mut builder = client
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;

    Ok(http_response)
}

/// Token endpoint operations against the 42 OAuth provider.
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    scope: String,
    auth_url: AuthUrl,
    token_url: TokenUrl,
}

impl OAuthClient {
    pub fn new(settings: &Settings) -> Result<Self, AuthError> {
        let (client_id, client_secret) = settings.client_credentials()?;

        let auth_url = AuthUrl::new(settings.authorize_url())
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(settings.token_url())
            .map_err(|e| AuthError::Configuration(format!("Invalid token URL: {}", e)))?;

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: settings.scope.clone(),
            auth_url,
            token_url,
        })
    }

    fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.scope
            .split_whitespace()
            .map(|s| Scope::new(s.to_string()))
    }

    /// Authorization URL carrying state and the S256 PKCE challenge.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        state: &str,
        pkce: &PkceParams,
    ) -> Result<String, AuthError> {
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;
        let csrf_token = CsrfToken::new(state.to_string());

        let (url, _) = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(redirect_url)
            .authorize_url(|| csrf_token)
            .add_scopes(self.scopes())
            .add_extra_param("code_challenge", pkce.code_challenge.clone())
            .add_extra_param("code_challenge_method", "S256")
            .url();

        Ok(url.to_string())
    }

    /// Exchanges an authorization code, proving possession of the PKCE verifier.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<Credentials, AuthError> {
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(redirect_url)
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(code_verifier.to_string()))
            .request_async(&http_client)
            .await
            .map_err(token_error)?;

        let credentials = credentials_from_response(&token_result, Utc::now(), &self.scope);
        tracing::debug!(expires_at = %credentials.expires_at, "Exchanged authorization code");
        Ok(credentials)
    }

    /// Application token from the client credentials grant. Carries no refresh token.
    pub async fn client_credentials(&self) -> Result<Credentials, AuthError> {
        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(self.token_url.clone())
            .exchange_client_credentials()
            .add_scopes(self.scopes())
            .request_async(&http_client)
            .await
            .map_err(token_error)?;

        let credentials = credentials_from_response(&token_result, Utc::now(), &self.scope);
        tracing::debug!(expires_at = %credentials.expires_at, "Obtained client credentials token");
        Ok(credentials)
    }

    /// Refreshes `current`, keeping its refresh token if the provider does not rotate it.
    pub async fn refresh(&self, current: &Credentials) -> Result<Credentials, AuthError> {
        let refresh_token = current
            .refresh_token
            .as_ref()
            .ok_or(AuthError::RefreshUnavailable)?;

        let token_result = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(self.token_url.clone())
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&http_client)
            .await
            .map_err(|e| AuthError::Refresh(token_error(e).to_string()))?;

        let credentials = credentials_from_response(&token_result, Utc::now(), &current.scope)
            .inherit_refresh_token(current);
        tracing::debug!(expires_at = %credentials.expires_at, "Refreshed access token");
        Ok(credentials)
    }
}

fn credentials_from_response(
    response: &BasicTokenResponse,
    now: DateTime<Utc>,
    requested_scope: &str,
) -> Credentials {
    let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
    let lifetime = chrono::Duration::from_std(lifetime)
        .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME.as_secs() as i64));

    let scope = response
        .scopes()
        .map(|scopes| {
            scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_else(|| requested_scope.to_string());

    Credentials {
        access_token: response.access_token().secret().to_string(),
        refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
        token_type: response.token_type().as_ref().to_string(),
        scope,
        created_at: now,
        expires_at: now + lifetime,
    }
}

fn token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> AuthError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => AuthError::Provider {
            error: response.error().to_string(),
            description: response.error_description().cloned(),
        },
        RequestTokenError::Request(e) => AuthError::TokenRequest(e.to_string()),
        RequestTokenError::Parse(e, _) => {
            AuthError::TokenRequest(format!("unexpected token response: {}", e))
        }
        RequestTokenError::Other(message) => AuthError::TokenRequest(message),
    }
}
