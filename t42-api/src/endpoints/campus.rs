use crate::macros::setter;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::request::{Paginated, Request, RequestData};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub users_count: Option<u64>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub website: Option<String>,
}

impl Campus {
    /// Case-insensitive match against the campus name or its city.
    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query)
            || self
                .city
                .as_deref()
                .is_some_and(|city| city.eq_ignore_ascii_case(query))
    }

    /// `Name (City)` when the city differs from the name.
    pub fn label(&self) -> String {
        match self.city.as_deref() {
            Some(city) if !city.is_empty() && !city.eq_ignore_ascii_case(&self.name) => {
                format!("{} ({})", self.name, city)
            }
            _ => self.name.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListCampus {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[active]", skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl Default for ListCampus {
    fn default() -> Self {
        Self {
            page: None,
            per_page: DEFAULT_PER_PAGE,
            active: None,
            sort: None,
        }
    }
}

impl ListCampus {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt active: bool);
    setter!(opt sort: String);
}

impl Request for ListCampus {
    type Data = Self;
    type Response = Vec<Campus>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/campus".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListCampus {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

#[derive(Debug, Clone)]
pub struct GetCampus {
    id: u64,
}

impl GetCampus {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

impl Request for GetCampus {
    type Data = ();
    type Response = Campus;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/campus/{}", self.id).into()
    }
}
