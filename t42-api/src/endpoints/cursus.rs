use super::LevelRange;
use crate::macros::setter;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::request::{Paginated, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursus {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Minimal user record embedded in listings such as `cursus_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub displayname: Option<String>,
}

/// A user's progress in one cursus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursusUser {
    pub id: u64,
    #[serde(default)]
    pub cursus_id: Option<u64>,
    #[serde(default)]
    pub level: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub begin_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blackholed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub cursus: Option<Cursus>,
}

impl CursusUser {
    pub fn is_blackholed(&self, now: DateTime<Utc>) -> bool {
        self.blackholed_at.is_some_and(|at| at < now)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_at.is_some_and(|at| at < now)
    }

    /// Whole days until the blackhole, negative once it has passed.
    pub fn days_until_blackhole(&self, now: DateTime<Utc>) -> Option<i64> {
        self.blackholed_at.map(|at| (at - now).num_days())
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListCursus {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
}

impl Default for ListCursus {
    fn default() -> Self {
        Self {
            page: None,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListCursus {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
}

impl Request for ListCursus {
    type Data = Self;
    type Response = Vec<Cursus>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/cursus".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListCursus {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCursusUsers {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[cursus_id]")]
    cursus_id: u64,
    #[serde(rename = "filter[campus_id]", skip_serializing_if = "Option::is_none")]
    campus_id: Option<u64>,
    #[serde(rename = "filter[active]", skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(rename = "range[level]", skip_serializing_if = "Option::is_none")]
    level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl ListCursusUsers {
    pub fn new(cursus_id: u64) -> Self {
        Self {
            page: None,
            per_page: DEFAULT_PER_PAGE,
            cursus_id,
            campus_id: None,
            active: None,
            level: None,
            sort: None,
        }
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt campus_id: u64);
    setter!(opt active: bool);
    setter!(opt sort: String);

    pub fn level_range(mut self, range: LevelRange) -> Self {
        self.level = range.to_query();
        self
    }
}

impl Request for ListCursusUsers {
    type Data = Self;
    type Response = Vec<CursusUser>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/cursus_users".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListCursusUsers {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn blackhole_and_end_are_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let record = CursusUser {
            id: 1,
            cursus_id: Some(21),
            level: 7.5,
            grade: None,
            begin_at: None,
            end_at: Some(now + Duration::days(30)),
            blackholed_at: Some(now - Duration::hours(1)),
            user: None,
            cursus: None,
        };

        assert!(record.is_blackholed(now));
        assert!(!record.has_ended(now));
        assert_eq!(record.days_until_blackhole(now), Some(0));
        assert!(!record.is_blackholed(now - Duration::days(1)));
    }

    #[test]
    fn query_uses_filter_and_range_keys() {
        let request = ListCursusUsers::new(21)
            .campus_id(26u64)
            .sort("-level")
            .level_range(LevelRange::new(Some(5.0), Some(9.0)));

        let query = serde_json::to_value(&request).unwrap();
        assert_eq!(query["filter[cursus_id]"], 21);
        assert_eq!(query["filter[campus_id]"], 26);
        assert_eq!(query["range[level]"], "5,9");
        assert_eq!(query["sort"], "-level");
        assert_eq!(query["per_page"], 100);
        assert!(query.get("page").is_none());
    }
}
