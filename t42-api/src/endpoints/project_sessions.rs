use crate::request::Request;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// Common

/// One run of a project on a given campus and cursus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSession {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub campus_id: Option<u64>,
    #[serde(default)]
    pub cursus_id: Option<u64>,
    #[serde(default)]
    pub begin_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimate_time: Option<String>,
    #[serde(default)]
    pub project_sessions_rules: Vec<ProjectSessionRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSessionRule {
    pub id: u64,
    #[serde(default)]
    pub required: bool,
    pub rule: RuleDefinition,
    #[serde(default)]
    pub params: Vec<RuleParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub kind: String,
    pub internal_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleParam {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub param_id: Option<u64>,
    pub value: String,
}

// Requests

#[derive(Debug, Clone)]
pub struct GetProjectSession {
    id: u64,
}

impl GetProjectSession {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

impl Request for GetProjectSession {
    type Data = ();
    type Response = ProjectSession;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/project_sessions/{}", self.id).into()
    }
}
