pub mod campus;
pub mod cursus;
pub mod project_sessions;
pub mod projects;
pub mod quests;
pub mod token;
pub mod users;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Addresses a user either by numeric id or by login; the API accepts both in paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(u64),
    Login(String),
}

impl Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Login(login) => f.write_str(login),
        }
    }
}

impl From<u64> for UserRef {
    fn from(id: u64) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(id) => UserRef::Id(id),
            Err(_) => UserRef::Login(s.to_string()),
        }
    }
}

impl From<String> for UserRef {
    fn from(s: String) -> Self {
        UserRef::from(s.as_str())
    }
}

/// Lower and upper bound for `range[level]`; the API wants both ends.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl LevelRange {
    pub const FLOOR: f64 = 0.0;
    pub const CEILING: f64 = 100.0;

    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Query value such as `6,9`, or `None` when neither end is set.
    pub fn to_query(&self) -> Option<String> {
        if self.is_unbounded() {
            return None;
        }
        Some(format!(
            "{},{}",
            self.min.unwrap_or(Self::FLOOR),
            self.max.unwrap_or(Self::CEILING)
        ))
    }
}
