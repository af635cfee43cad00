//! Finds users who meet a project session's inscription rules.

mod lookup;
pub mod rules;
mod scan;

pub use lookup::{CampusSelector, MAX_ALTERNATIVES, find_session, resolve_campus, resolve_project};
pub use rules::{InscriptionRequirements, Rejection};
pub use scan::{
    EligibilityQuery, EligibilityReport, EligibilityScanner, EligibleUser, ScanStats, ScanTarget,
    fetch_requirements,
};

use t42_api::ApiError;
use thiserror::Error;

/// A name or slug given on the command line did not resolve.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("campus {query:?} not found; available campuses: {}", listing(.available))]
    CampusNotFound {
        query: String,
        available: Vec<String>,
    },

    #[error("project {slug:?} not found; similar slugs: {}", listing(.suggestions))]
    ProjectNotFound {
        slug: String,
        suggestions: Vec<String>,
    },

    #[error(
        "no session of {project} for campus {campus_id} in cursus {cursus_id}; sessions exist for (campus/cursus): {}",
        listing(.available)
    )]
    SessionNotFound {
        project: String,
        campus_id: u64,
        cursus_id: u64,
        available: Vec<String>,
    },

    #[error("{login} has no primary campus; pass --campus or --campus-id")]
    NoPrimaryCampus { login: String },
}

#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn listing(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
