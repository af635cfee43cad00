use crate::error::{ApiError, BoxError};
use crate::pagination::{Page, PageCursor, PaginationMeta};
use crate::request::{Method, NoData, Paginated, Request, RequestData};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.intra.42.fr";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Immutable settings for a [`Client`], fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before retry `n` is `n * retry_base_delay`
    pub retry_base_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: APP_USER_AGENT.to_string(),
            max_retries: MAX_RETRIES,
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().base_url(base_url)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }
}

/// Produces a replacement access token after the API rejected the current one.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<SecretString, BoxError>;
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final request URL, query string included
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(ApiError::Decode)
    }
}

pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    token: RwLock<Arc<SecretString>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    cancel: CancellationToken,
}

impl Client {
    pub fn new(access_token: &str) -> Result<Self, ApiError> {
        Self::with_config(access_token, ClientConfig::default())
    }

    pub fn with_config(access_token: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            http,
            config,
            token: RwLock::new(Arc::new(SecretString::from(access_token.to_string()))),
            refresher: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the bearer token; refresh swaps the slot rather than editing it.
    pub fn current_token(&self) -> Arc<SecretString> {
        Arc::clone(&self.token.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, ApiError>
    where
        R: Request,
    {
        let response = self
            .execute(R::METHOD, &request.endpoint(), request.data())
            .await?;
        response.json()
    }

    pub async fn fetch_page<R, T>(&self, request: &R) -> Result<Page<T>, ApiError>
    where
        R: Request<Response = Vec<T>>,
        T: DeserializeOwned,
    {
        let response = self
            .execute(R::METHOD, &request.endpoint(), request.data())
            .await?;
        into_page(response)
    }

    /// Follows `meta.next` verbatim; `None` when there is no further page.
    pub async fn fetch_next<T>(&self, meta: &PaginationMeta) -> Result<Option<Page<T>>, ApiError>
    where
        T: DeserializeOwned,
    {
        let Some(next) = meta.next.as_deref() else {
            return Ok(None);
        };
        let response = self
            .execute(Method::GET, next, RequestData::<&NoData>::Empty)
            .await?;
        into_page(response).map(Some)
    }

    /// Collects every page of a listing, in server order, each page at most once.
    pub async fn drain<R, T>(&self, request: &R) -> Result<Vec<T>, ApiError>
    where
        R: Paginated<Response = Vec<T>>,
        T: DeserializeOwned,
    {
        let per_page = request.per_page() as usize;
        let mut items = Vec::new();
        let mut page: Page<T> = self.fetch_page(request).await?;
        let mut cursor = PageCursor::new(&page.meta);

        loop {
            let short = page.items.len() < per_page;
            items.extend(page.items);
            if short {
                break;
            }
            let Some(next) = cursor.next_link(&page.meta) else {
                break;
            };

            tracing::debug!(url = %next, collected = items.len(), "Fetching next page");
            let response = self
                .execute(Method::GET, &next, RequestData::<&NoData>::Empty)
                .await?;
            page = into_page(response)?;
            if !cursor.accept(&page.meta) {
                break;
            }
        }

        Ok(items)
    }

    /// Runs one authenticated request through retry and 401-refresh handling.
    pub async fn execute<T>(
        &self,
        method: Method,
        target: &str,
        data: RequestData<&T>,
    ) -> Result<RawResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.resolve(target)?;
        let token = self.current_token();

        let mut response = self.send_with_retry(&method, &url, &data, &token).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            if let Some(refresher) = &self.refresher {
                tracing::info!(url = %url, "Access token rejected, refreshing once");
                let fresh = self.refresh_token(refresher.as_ref()).await?;
                response = self.send_with_retry(&method, &url, &data, &fresh).await?;
            }
        }

        if !response.status.is_success() {
            tracing::debug!(status = response.status.as_u16(), url = %url, "API returned an error");
            return Err(ApiError::from_response(response.status, &response.body));
        }

        Ok(response)
    }

    fn resolve(&self, target: &str) -> Result<Url, ApiError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            Ok(Url::parse(target)?)
        } else {
            Ok(Url::parse(&format!("{}{}", self.config.base_url, target))?)
        }
    }

    async fn refresh_token(
        &self,
        refresher: &dyn TokenRefresher,
    ) -> Result<Arc<SecretString>, ApiError> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            result = refresher.refresh() => result.map_err(ApiError::Refresh),
        };
        let fresh = Arc::new(result?);

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&fresh);
        Ok(fresh)
    }

    async fn send_with_retry<T>(
        &self,
        method: &Method,
        url: &Url,
        data: &RequestData<&T>,
        token: &SecretString,
    ) -> Result<RawResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                let delay = self.config.retry_base_delay * attempt;
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, url = %url, "Backing off before retry");
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let request = self.build_request(method, url, data, token);
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                outcome = read_response(request) => outcome,
            };

            match outcome {
                Ok(response)
                    if is_retryable(response.status) && attempt < self.config.max_retries =>
                {
                    tracing::warn!(
                        status = response.status.as_u16(),
                        attempt,
                        url = %url,
                        "Retryable response from API"
                    );
                }
                Ok(response) => return Ok(response),
                Err(err) if !err.is_builder() && attempt < self.config.max_retries => {
                    tracing::warn!(error = %err, attempt, url = %url, "Request failed");
                }
                Err(err) => return Err(ApiError::Transport(err)),
            }

            attempt += 1;
        }
    }

    fn build_request<T>(
        &self,
        method: &Method,
        url: &Url,
        data: &RequestData<&T>,
        token: &SecretString,
    ) -> reqwest::RequestBuilder
    where
        T: Serialize + ?Sized,
    {
        let builder = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, "application/json");

        match data {
            RequestData::Empty => builder,
            RequestData::Query(query) => builder.query(query),
            RequestData::Json(body) => builder.json(body),
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn read_response(request: reqwest::RequestBuilder) -> Result<RawResponse, reqwest::Error> {
    let response = request.send().await?;
    let url = response.url().clone();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(RawResponse {
        url,
        status,
        headers,
        body,
    })
}

fn into_page<T: DeserializeOwned>(response: RawResponse) -> Result<Page<T>, ApiError> {
    let items: Vec<T> = response.json()?;
    let mut meta = PaginationMeta::from_headers(&response.headers, items.len());
    meta.url = Some(response.url.to_string());
    Ok(Page { items, meta })
}
