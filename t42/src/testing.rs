//! Fixture builders for API records, shared by unit and integration tests.

use chrono::{DateTime, Utc};
use std::hash::{DefaultHasher, Hash, Hasher};
use t42_api::endpoints::campus::Campus;
use t42_api::endpoints::cursus::{CursusUser, UserSummary};
use t42_api::endpoints::project_sessions::{
    ProjectSession, ProjectSessionRule, RuleDefinition, RuleParam,
};
use t42_api::endpoints::projects::{Project, ProjectSummary, ProjectUser};
use t42_api::endpoints::quests::{Quest, QuestUser};
use t42_api::endpoints::users::{CampusUser, User};

/// Deterministic id from a slug, so fixtures built separately still agree.
pub fn fixture_id(slug: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    slug.hash(&mut hasher);
    hasher.finish() % 1_000_000
}

pub fn campus(id: u64, name: &str, city: &str) -> Campus {
    Campus {
        id,
        name: name.to_string(),
        city: Some(city.to_string()),
        country: None,
        time_zone: None,
        users_count: None,
        active: Some(true),
        website: None,
    }
}

/// User with a primary campus and the given project history.
pub fn user(id: u64, login: &str, campus_id: u64, projects_users: Vec<ProjectUser>) -> User {
    User {
        id,
        login: login.to_string(),
        email: Some(format!("{login}@student.42.fr")),
        displayname: Some(format!("{} Student", login.to_uppercase())),
        location: None,
        pool_month: None,
        pool_year: None,
        wallet: Some(0),
        correction_point: Some(5),
        staff: false,
        alumni: false,
        active: Some(true),
        campus: Vec::new(),
        campus_users: vec![CampusUser {
            id: id * 10,
            user_id: id,
            campus_id,
            is_primary: true,
        }],
        cursus_users: Vec::new(),
        projects_users,
    }
}

pub fn cursus_user(
    user_id: u64,
    login: &str,
    level: f64,
    blackholed_at: Option<DateTime<Utc>>,
) -> CursusUser {
    CursusUser {
        id: user_id + 100_000,
        cursus_id: Some(21),
        level,
        grade: Some("Learner".to_string()),
        begin_at: None,
        end_at: None,
        blackholed_at,
        user: Some(UserSummary {
            id: user_id,
            login: login.to_string(),
            displayname: None,
        }),
        cursus: None,
    }
}

pub fn project_user(slug: &str, status: &str, validated: Option<bool>) -> ProjectUser {
    let id = fixture_id(slug);
    ProjectUser {
        id: id + 1,
        occurrence: Some(0),
        final_mark: validated.map(|v| if v { 100 } else { 0 }),
        status: status.to_string(),
        validated,
        project: ProjectSummary {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            parent_id: None,
        },
        cursus_ids: vec![21],
        marked_at: None,
        updated_at: None,
    }
}

pub fn quest_user(slug: &str, validated_at: Option<DateTime<Utc>>) -> QuestUser {
    let id = fixture_id(slug);
    QuestUser {
        id: id + 1,
        quest_id: Some(id),
        user_id: None,
        end_at: None,
        validated_at,
        quest: Quest {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            kind: None,
        },
    }
}

pub fn session_rule(kind: &str, internal_name: &str, values: &[&str]) -> ProjectSessionRule {
    ProjectSessionRule {
        id: fixture_id(internal_name),
        required: true,
        rule: RuleDefinition {
            kind: kind.to_string(),
            internal_name: internal_name.to_string(),
            name: None,
            description: None,
        },
        params: values
            .iter()
            .map(|value| RuleParam {
                id: None,
                param_id: None,
                value: value.to_string(),
            })
            .collect(),
    }
}

pub fn session(
    id: u64,
    campus_id: u64,
    cursus_id: u64,
    rules: Vec<ProjectSessionRule>,
) -> ProjectSession {
    ProjectSession {
        id,
        project_id: None,
        campus_id: Some(campus_id),
        cursus_id: Some(cursus_id),
        begin_at: None,
        end_at: None,
        estimate_time: None,
        project_sessions_rules: rules,
    }
}

pub fn project(id: u64, slug: &str, sessions: Vec<ProjectSession>) -> Project {
    Project {
        id,
        name: slug.replace('_', " "),
        slug: slug.to_string(),
        difficulty: Some(15000),
        exam: false,
        cursus: Vec::new(),
        project_sessions: sessions,
    }
}
