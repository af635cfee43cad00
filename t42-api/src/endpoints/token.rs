use crate::request::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub uid: String,
}

/// Introspection of the bearer token, as returned by `/oauth/token/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub resource_owner_id: Option<u64>,
    #[serde(default, alias = "scope")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Fields not modelled above, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct GetTokenInfo;

impl Request for GetTokenInfo {
    type Data = ();
    type Response = TokenInfo;

    fn endpoint(&self) -> Cow<'_, str> {
        "/oauth/token/info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unknown_fields() {
        let json = r#"{
            "resource_owner_id": 74,
            "scopes": ["public", "projects"],
            "expires_in_seconds": 7174,
            "application": {"uid": "u-s4t2ud-abc"},
            "created_at": 1700000000,
            "owner_kind": "user"
        }"#;
        let info: TokenInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.resource_owner_id, Some(74));
        assert_eq!(info.scopes, vec!["public", "projects"]);
        assert_eq!(info.extra.get("owner_kind"), Some(&Value::from("user")));
    }
}
