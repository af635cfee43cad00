use super::UserRef;
use super::campus::Campus;
use super::cursus::CursusUser;
use super::projects::ProjectUser;
use crate::macros::setter;
use crate::pagination::DEFAULT_PER_PAGE;
use crate::request::{Paginated, Request, RequestData};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub displayname: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub pool_month: Option<String>,
    #[serde(default)]
    pub pool_year: Option<String>,
    #[serde(default)]
    pub wallet: Option<i64>,
    #[serde(default)]
    pub correction_point: Option<i64>,
    #[serde(default, rename = "staff?")]
    pub staff: bool,
    #[serde(default, rename = "alumni?")]
    pub alumni: bool,
    #[serde(default, rename = "active?")]
    pub active: Option<bool>,
    #[serde(default)]
    pub campus: Vec<Campus>,
    #[serde(default)]
    pub campus_users: Vec<CampusUser>,
    #[serde(default)]
    pub cursus_users: Vec<CursusUser>,
    #[serde(default)]
    pub projects_users: Vec<ProjectUser>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.displayname.as_deref().unwrap_or(&self.login)
    }

    /// The campus flagged primary in `campus_users`, or the only campus listed.
    pub fn primary_campus(&self) -> Option<&Campus> {
        let primary_id = self
            .campus_users
            .iter()
            .find(|cu| cu.is_primary)
            .map(|cu| cu.campus_id);

        match primary_id {
            Some(id) => self.campus.iter().find(|c| c.id == id),
            None if self.campus.len() == 1 => self.campus.first(),
            None => None,
        }
    }

    pub fn primary_campus_id(&self) -> Option<u64> {
        self.campus_users
            .iter()
            .find(|cu| cu.is_primary)
            .map(|cu| cu.campus_id)
            .or_else(|| self.primary_campus().map(|c| c.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusUser {
    pub id: u64,
    pub user_id: u64,
    pub campus_id: u64,
    #[serde(default)]
    pub is_primary: bool,
}

// Requests

#[derive(Debug, Clone, Default)]
pub struct GetMe;

impl Request for GetMe {
    type Data = ();
    type Response = User;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/me".into()
    }
}

#[derive(Debug, Clone)]
pub struct GetUser {
    user: UserRef,
}

impl GetUser {
    pub fn new(user: impl Into<UserRef>) -> Self {
        Self { user: user.into() }
    }
}

impl Request for GetUser {
    type Data = ();
    type Response = User;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/users/{}", self.user).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListUsers {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[campus_id]", skip_serializing_if = "Option::is_none")]
    campus_id: Option<u64>,
    #[serde(rename = "filter[cursus_id]", skip_serializing_if = "Option::is_none")]
    cursus_id: Option<u64>,
    #[serde(rename = "filter[active]", skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(rename = "filter[alumni?]", skip_serializing_if = "Option::is_none")]
    alumni: Option<bool>,
    #[serde(rename = "filter[staff?]", skip_serializing_if = "Option::is_none")]
    staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl Default for ListUsers {
    fn default() -> Self {
        Self {
            page: None,
            per_page: DEFAULT_PER_PAGE,
            campus_id: None,
            cursus_id: None,
            active: None,
            alumni: None,
            staff: None,
            sort: None,
        }
    }
}

impl ListUsers {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt campus_id: u64);
    setter!(opt cursus_id: u64);
    setter!(opt active: bool);
    setter!(opt alumni: bool);
    setter!(opt staff: bool);
    setter!(opt sort: String);
}

impl Request for ListUsers {
    type Data = Self;
    type Response = Vec<User>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/v2/users".into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListUsers {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

/// Users of one campus. The campus lives in the path, so no campus filter is offered.
#[derive(Debug, Clone, Serialize)]
pub struct ListCampusUsers {
    #[serde(skip)]
    campus_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    per_page: u32,
    #[serde(rename = "filter[cursus_id]", skip_serializing_if = "Option::is_none")]
    cursus_id: Option<u64>,
    #[serde(rename = "filter[active]", skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(rename = "filter[alumni?]", skip_serializing_if = "Option::is_none")]
    alumni: Option<bool>,
    #[serde(rename = "filter[staff?]", skip_serializing_if = "Option::is_none")]
    staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<String>,
}

impl ListCampusUsers {
    pub fn new(campus_id: u64) -> Self {
        Self {
            campus_id,
            page: None,
            per_page: DEFAULT_PER_PAGE,
            cursus_id: None,
            active: None,
            alumni: None,
            staff: None,
            sort: None,
        }
    }

    setter!(opt page: u32);
    setter!(per_page: u32);
    setter!(opt cursus_id: u64);
    setter!(opt active: bool);
    setter!(opt alumni: bool);
    setter!(opt staff: bool);
    setter!(opt sort: String);
}

impl Request for ListCampusUsers {
    type Data = Self;
    type Response = Vec<User>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/v2/campus/{}/users", self.campus_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

impl Paginated for ListCampusUsers {
    fn per_page(&self) -> u32 {
        self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_profile_with_question_mark_fields() {
        let json = r#"{
            "id": 42,
            "login": "jdoe",
            "displayname": "John Doe",
            "staff?": false,
            "alumni?": true,
            "active?": true,
            "campus": [{"id": 1, "name": "Paris", "city": "Paris"}, {"id": 26, "name": "Tokyo", "city": "Tokyo"}],
            "campus_users": [
                {"id": 10, "user_id": 42, "campus_id": 1, "is_primary": false},
                {"id": 11, "user_id": 42, "campus_id": 26, "is_primary": true}
            ]
        }"#;

        let user: User = serde_json::from_str(json).unwrap();

        assert!(user.alumni);
        assert_eq!(user.active, Some(true));
        assert_eq!(user.display_name(), "John Doe");
        assert_eq!(user.primary_campus().map(|c| c.name.as_str()), Some("Tokyo"));
        assert_eq!(user.primary_campus_id(), Some(26));
        assert!(user.projects_users.is_empty());
    }

    #[test]
    fn single_campus_is_primary_without_flag() {
        let json = r#"{"id": 1, "login": "a", "campus": [{"id": 9, "name": "Lyon"}]}"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.primary_campus_id(), Some(9));
        assert_eq!(user.display_name(), "a");
    }

    #[test]
    fn campus_users_endpoint_keeps_campus_in_path() {
        let request = ListCampusUsers::new(26).cursus_id(21u64);
        assert_eq!(request.endpoint(), "/v2/campus/26/users");

        let query = serde_json::to_value(&request).unwrap();
        assert_eq!(query["filter[cursus_id]"], 21);
        assert!(query.get("campus_id").is_none());
    }

    #[test]
    fn account_filters_use_question_mark_keys() {
        let request = ListUsers::new().active(false).alumni(true).staff(true);

        let query = serde_json::to_value(&request).unwrap();
        assert_eq!(query["filter[active]"], false);
        assert_eq!(query["filter[alumni?]"], true);
        assert_eq!(query["filter[staff?]"], true);
        assert!(query.get("filter[campus_id]").is_none());
    }
}
