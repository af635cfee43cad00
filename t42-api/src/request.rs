use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

pub use reqwest::Method;

/// Payload attached to an outgoing request.
#[derive(Debug, Clone, Copy)]
pub enum RequestData<T> {
    Empty,
    Query(T),
    Json(T),
}

/// Placeholder data type for requests without a payload.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoData;

/// A typed API call: where it goes, how it is sent, and what comes back.
pub trait Request {
    type Data: Serialize;
    type Response: DeserializeOwned;

    const METHOD: Method = Method::GET;

    fn endpoint(&self) -> Cow<'_, str>;

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Empty
    }
}

/// A listing request whose response is one page of items.
pub trait Paginated: Request {
    /// Page size asked of the server; a shorter page means the listing is done.
    fn per_page(&self) -> u32;
}
