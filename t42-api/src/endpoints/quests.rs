use super::UserRef;
use crate::macros::setter;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::request::{Paginated, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestUser {
    pub id: u64,
    #[serde(default)]
    pub quest_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
    pub quest: Quest,
}

impl QuestUser {
    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListUserQuests {
    #[serde(skip)]
    user: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
}

impl ListUserQuests {
    pub fn new(user: impl Into<UserRef>) -> Self {
        Self {
            user: user.into(),
            page: None,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
}

impl Request for ListUserQuests {
    type Data = Self;
    type Response = Vec<QuestUser>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/users/{}/quests_users", self.user).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListUserQuests {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}
