use chrono::{DateTime, Duration, Utc, serde::ts_seconds};
use serde::{Deserialize, Serialize};

/// Credentials persisted after a successful token exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCredentials")]
pub struct Credentials {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub scope: String,
    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Lifetime granted at issue time, in seconds.
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.created_at).num_seconds()
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Carries the previous refresh token over when the provider did not rotate it.
    pub fn inherit_refresh_token(mut self, previous: &Credentials) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = previous.refresh_token.clone();
        }
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// On-disk shape, accepting files written with `expires_in` instead of `expires_at`.
#[derive(Deserialize)]
struct StoredCredentials {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TryFrom<StoredCredentials> for Credentials {
    type Error = String;

    fn try_from(raw: StoredCredentials) -> Result<Self, Self::Error> {
        if raw.access_token.is_empty() {
            return Err("credentials file has an empty access_token".to_string());
        }

        let (created, expires) = match (raw.created_at, raw.expires_at, raw.expires_in) {
            (created, Some(expires_at), _) => (created.unwrap_or(expires_at), expires_at),
            (Some(created), None, Some(expires_in)) => (created, created + expires_in),
            _ => {
                return Err(
                    "credentials file needs expires_at, or created_at with expires_in".to_string(),
                );
            }
        };

        let timestamp = |secs: i64| {
            DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| format!("timestamp {secs} is out of range"))
        };

        Ok(Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token.filter(|t| !t.is_empty()),
            token_type: raw.token_type,
            scope: raw.scope,
            created_at: timestamp(created)?,
            expires_at: timestamp(expires)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_absolute_expiry() {
        let json = r#"{
            "access_token": "abc",
            "refresh_token": "def",
            "token_type": "bearer",
            "scope": "public",
            "created_at": 1700000000,
            "expires_at": 1700007200
        }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();

        assert_eq!(creds.expires_in(), 7200);
        assert_eq!(creds.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn converts_legacy_expires_in() {
        let json = r#"{
            "access_token": "abc",
            "refresh_token": "",
            "expires_in": 7200,
            "created_at": 1700000000,
            "token_type": "bearer",
            "scope": "public"
        }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();

        assert_eq!(creds.expires_at.timestamp(), 1700007200);
        assert_eq!(creds.refresh_token, None);
        assert!(!creds.can_refresh());
    }

    #[test]
    fn rejects_file_without_expiry() {
        let json = r#"{"access_token": "abc", "created_at": 1700000000}"#;
        assert!(serde_json::from_str::<Credentials>(json).is_err());
    }

    #[test]
    fn rejects_empty_access_token() {
        let json = r#"{"access_token": "", "expires_at": 1700000000}"#;
        assert!(serde_json::from_str::<Credentials>(json).is_err());
    }

    #[test]
    fn serializes_absolute_expiry_only() {
        let creds = Credentials {
            access_token: "abc".into(),
            refresh_token: None,
            token_type: "bearer".into(),
            scope: "public".into(),
            created_at: DateTime::from_timestamp(100, 0).unwrap(),
            expires_at: DateTime::from_timestamp(200, 0).unwrap(),
        };
        let value = serde_json::to_value(&creds).unwrap();

        assert_eq!(value["expires_at"], 200);
        assert!(value.get("expires_in").is_none());
        assert!(value.get("refresh_token").is_none());
        assert!(!format!("{creds:?}").contains("abc"));
    }

    #[test]
    fn keeps_previous_refresh_token_when_not_rotated() {
        let at = DateTime::from_timestamp(100, 0).unwrap();
        let old = Credentials {
            access_token: "old".into(),
            refresh_token: Some("r1".into()),
            token_type: "bearer".into(),
            scope: "public".into(),
            created_at: at,
            expires_at: at,
        };
        let fresh = Credentials {
            access_token: "new".into(),
            refresh_token: None,
            ..old.clone()
        };

        assert_eq!(
            fresh.inherit_refresh_token(&old).refresh_token.as_deref(),
            Some("r1")
        );
    }
}
