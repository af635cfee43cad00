//! One handler per subcommand, all sharing a [`Context`].

mod auth;
mod campus;
mod eligible;
mod projects;
mod users;

use crate::cli::Command;
use crate::session;
use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use t42_api::request::Paginated;
use t42_api::{Client, PaginationMeta};
use t42_auth::{Settings, TokenStore};
use tokio_util::sync::CancellationToken;

pub struct Context {
    pub settings: Settings,
    pub cancel: CancellationToken,
    pub json: bool,
}

impl Context {
    pub fn new(settings: Settings, cancel: CancellationToken, json: bool) -> Self {
        Self {
            settings,
            cancel,
            json,
        }
    }

    pub fn store(&self) -> Result<TokenStore> {
        Ok(TokenStore::new()?)
    }

    pub async fn user_client(&self) -> Result<Client> {
        session::user_client(&self.settings, self.store()?, &self.cancel).await
    }

    pub async fn app_client(&self) -> Result<Client> {
        session::app_client(&self.settings, &self.cancel).await
    }
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Auth { action } => auth::run(action, ctx).await,
        Command::User { action } => users::run(action, ctx).await,
        Command::Project { action } => projects::run(action, ctx).await,
        Command::Campus { action } => campus::run(action, ctx).await,
        Command::Eligible(args) => eligible::run(args, ctx).await,
    }
}

/// Items of a listing command; `meta` is only set when a single page was fetched.
#[derive(Debug, Serialize)]
struct Listing<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<PaginationMeta>,
}

async fn fetch_listing<R, T>(client: &Client, request: &R, all: bool) -> Result<Listing<T>>
where
    R: Paginated<Response = Vec<T>>,
    T: DeserializeOwned,
{
    if all {
        let items = client.drain(request).await?;
        tracing::debug!(count = items.len(), "Fetched every page");
        return Ok(Listing { items, meta: None });
    }

    let page = client.fetch_page(request).await?;
    Ok(Listing {
        items: page.items,
        meta: Some(page.meta),
    })
}
