mod client;
pub mod endpoints;
mod error;
mod macros;
pub mod pagination;
pub mod repositories;
pub mod request;

pub use crate::client::{
    Client, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, MAX_RETRIES, RETRY_BASE_DELAY,
    RawResponse, TokenRefresher,
};
pub use crate::error::{ApiError, BoxError, ErrorDetail};
pub use crate::pagination::{DEFAULT_PER_PAGE, Page, PageCursor, PaginationMeta};
use repositories::*;

/// Entry point for building typed requests, e.g. `Request::users().get("jdoe")`.
pub struct Request;

impl Request {
    pub fn users() -> UserRepository {
        UserRepository::new()
    }

    pub fn projects() -> ProjectRepository {
        ProjectRepository::new()
    }

    pub fn campus() -> CampusRepository {
        CampusRepository::new()
    }

    pub fn cursus() -> CursusRepository {
        CursusRepository::new()
    }

    pub fn token() -> TokenRepository {
        TokenRepository::new()
    }
}
