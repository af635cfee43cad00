use super::UserRef;
use super::cursus::Cursus;
use super::project_sessions::ProjectSession;
use crate::macros::setter;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::request::{Paginated, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Statuses in which a project counts as ongoing for a user.
pub const ONGOING_STATUSES: [&str; 4] = [
    "in_progress",
    "waiting_for_correction",
    "creating_group",
    "searching_a_group",
];

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub exam: bool,
    #[serde(default)]
    pub cursus: Vec<Cursus>,
    #[serde(default)]
    pub project_sessions: Vec<ProjectSession>,
}

impl Project {
    pub fn session_for(&self, campus_id: u64, cursus_id: u64) -> Option<&ProjectSession> {
        self.project_sessions
            .iter()
            .find(|s| s.campus_id == Some(campus_id) && s.cursus_id == Some(cursus_id))
    }
}

/// Project reference embedded in a `ProjectUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// A user's engagement with one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUser {
    pub id: u64,
    #[serde(default)]
    pub occurrence: Option<u32>,
    #[serde(default)]
    pub final_mark: Option<i64>,
    pub status: String,
    #[serde(default, rename = "validated?")]
    pub validated: Option<bool>,
    pub project: ProjectSummary,
    #[serde(default)]
    pub cursus_ids: Vec<u64>,
    #[serde(default)]
    pub marked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectUser {
    pub fn is_ongoing(&self) -> bool {
        ONGOING_STATUSES.contains(&self.status.as_str())
    }

    /// Only an explicit `validated? == true` counts.
    pub fn is_validated(&self) -> bool {
        self.validated == Some(true)
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListProjects {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[slug]", skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(rename = "filter[cursus_id]", skip_serializing_if = "Option::is_none")]
    cursus_id: Option<u64>,
    #[serde(rename = "search[slug]", skip_serializing_if = "Option::is_none")]
    search_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl Default for ListProjects {
    fn default() -> Self {
        Self {
            page: None,
            per_page: DEFAULT_PER_PAGE,
            slug: None,
            cursus_id: None,
            search_slug: None,
            sort: None,
        }
    }
}

impl ListProjects {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt slug: String);
    setter!(opt cursus_id: u64);
    setter!(opt search_slug: String);
    setter!(opt sort: String);
}

impl Request for ListProjects {
    type Data = Self;
    type Response = Vec<Project>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/projects".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListProjects {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

/// `/v2/projects/{id}`; the API also resolves a slug in place of the id.
#[derive(Debug, Clone)]
pub struct GetProject {
    project: String,
}

impl GetProject {
    pub fn new(project: impl ToString) -> Self {
        Self {
            project: project.to_string(),
        }
    }
}

impl Request for GetProject {
    type Data = ();
    type Response = Project;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/projects/{}", self.project).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListUserProjects {
    #[serde(skip)]
    user: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[cursus]", skip_serializing_if = "Option::is_none")]
    cursus_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl ListUserProjects {
    pub fn new(user: impl Into<UserRef>) -> Self {
        Self {
            user: user.into(),
            page: None,
            per_page: DEFAULT_PER_PAGE,
            cursus_id: None,
            sort: None,
        }
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt cursus_id: u64);
    setter!(opt sort: String);
}

impl Request for ListUserProjects {
    type Data = Self;
    type Response = Vec<ProjectUser>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/users/{}/projects_users", self.user).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListUserProjects {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}
