use super::config::Settings;
use super::oauth_client::OAuthClient;
use crate::callback::{CALLBACK_TIMEOUT, CallbackServer, code_from_pasted};
use crate::common::Credentials;
use crate::error::AuthError;
use crate::pkce;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingRedirect,
    ExchangingCode,
    ExchangingCredentials,
    Authenticated,
    Failed,
}

/// Opens the authorization URL for the user.
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// Never launches anything; the URL is printed for manual use.
pub struct NoBrowser;

impl Browser for NoBrowser {
    fn open(&self, _url: &str) -> std::io::Result<()> {
        Err(std::io::Error::other("browser launch disabled"))
    }
}

pub struct LoginFlow {
    oauth: OAuthClient,
    browser: Box<dyn Browser>,
    state: FlowState,
    redirect_port: u16,
    timeout: Duration,
}

impl LoginFlow {
    pub fn new(settings: &Settings) -> Result<Self, AuthError> {
        Ok(Self {
            oauth: OAuthClient::new(settings)?,
            browser: Box::new(SystemBrowser),
            state: FlowState::Idle,
            redirect_port: settings.redirect_port,
            timeout: CALLBACK_TIMEOUT,
        })
    }

    pub fn with_browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    fn transition(&mut self, next: FlowState) {
        tracing::info!(from = ?self.state, to = ?next, "Login flow transition");
        self.state = next;
    }

    fn finish(&mut self, result: Result<Credentials, AuthError>) -> Result<Credentials, AuthError> {
        match &result {
            Ok(_) => self.transition(FlowState::Authenticated),
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.transition(FlowState::Failed);
            }
        }
        result
    }

    /// Authorization Code + PKCE through the browser and a loopback redirect.
    pub async fn authorize(&mut self, cancel: &CancellationToken) -> Result<Credentials, AuthError> {
        let result = self.run_authorization_code(cancel).await;
        self.finish(result)
    }

    /// Authorization Code + PKCE without a listener. The user pastes the
    /// redirected URL, or just its code, into `input`.
    ///
    /// The redirect URI is fixed to the configured port, so it has to be set.
    pub async fn authorize_pasted<R>(
        &mut self,
        cancel: &CancellationToken,
        input: R,
    ) -> Result<Credentials, AuthError>
    where
        R: AsyncBufRead + Unpin,
    {
        let result = self.run_pasted_code(cancel, input).await;
        self.finish(result)
    }

    /// Client Credentials grant; no browser, PKCE, or state involved.
    pub async fn client_credentials(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Credentials, AuthError> {
        self.transition(FlowState::ExchangingCredentials);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
            result = self.oauth.client_credentials() => result,
        };
        self.finish(result)
    }

    async fn run_authorization_code(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Credentials, AuthError> {
        let state = pkce::generate_state()?;
        let pkce = pkce::generate()?;

        let server = CallbackServer::bind(self.redirect_port, &state).await?;
        let redirect_uri = server.redirect_uri().to_string();
        let authorize_url = self.oauth.authorize_url(&redirect_uri, &state, &pkce)?;
        tracing::info!(url = %authorize_url, "Authorization URL ready");

        self.transition(FlowState::AwaitingRedirect);
        self.present(&authorize_url);

        let code = server.wait_for_code(self.timeout, cancel).await?;
        self.exchange(cancel, &code, &redirect_uri, &pkce.code_verifier).await
    }

    async fn run_pasted_code<R>(
        &mut self,
        cancel: &CancellationToken,
        mut input: R,
    ) -> Result<Credentials, AuthError>
    where
        R: AsyncBufRead + Unpin,
    {
        if self.redirect_port == 0 {
            return Err(AuthError::Configuration(
                "Manual code entry needs a fixed redirect port matching the application's \
                 redirect URI. Pass --redirect-port or set T42_REDIRECT_PORT."
                    .to_string(),
            ));
        }

        let state = pkce::generate_state()?;
        let pkce = pkce::generate()?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", self.redirect_port);
        let authorize_url = self.oauth.authorize_url(&redirect_uri, &state, &pkce)?;
        tracing::info!(url = %authorize_url, "Authorization URL ready");

        self.transition(FlowState::AwaitingRedirect);
        self.present(&authorize_url);
        eprintln!("After authorizing, paste the URL your browser was redirected to (or just its code):");

        let mut line = String::new();
        let read = tokio::select! {
            _ = cancel.cancelled() => return Err(AuthError::Cancelled),
            _ = tokio::time::sleep(self.timeout) => return Err(AuthError::CallbackTimeout(self.timeout)),
            read = input.read_line(&mut line) => read?,
        };
        if read == 0 {
            return Err(AuthError::MissingCode);
        }

        let code = code_from_pasted(&line, &state)?;
        self.exchange(cancel, &code, &redirect_uri, &pkce.code_verifier).await
    }

    fn present(&self, authorize_url: &str) {
        match self.browser.open(authorize_url) {
            Ok(()) => {
                eprintln!("Opened your browser to authorize t42. If nothing happened, visit:\n\n  {authorize_url}\n");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not open a browser");
                eprintln!("Open this URL in your browser to authorize t42:\n\n  {authorize_url}\n");
            }
        }
    }

    async fn exchange(
        &mut self,
        cancel: &CancellationToken,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<Credentials, AuthError> {
        self.transition(FlowState::ExchangingCode);
        tokio::select! {
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
            result = self.oauth.exchange_code(code, redirect_uri, code_verifier) => result,
        }
    }
}
