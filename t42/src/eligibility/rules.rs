use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use t42_api::endpoints::cursus::CursusUser;
use t42_api::endpoints::project_sessions::ProjectSessionRule;
use t42_api::endpoints::projects::ProjectUser;
use t42_api::endpoints::quests::QuestUser;

const INSCRIPTION: &str = "inscription";
const QUESTS_VALIDATED: &str = "QuestsValidated";
const QUESTS_NOT_VALIDATED: &str = "QuestsNotValidated";
const NEITHER_ONGOING_OR_VALIDATED: &str = "NeitherOngoingOrValidated";

/// Inscription prerequisites of one project session, as slug sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InscriptionRequirements {
    pub required_quests: BTreeSet<String>,
    pub forbidden_quests: BTreeSet<String>,
    pub forbidden_projects: BTreeSet<String>,
}

impl InscriptionRequirements {
    /// Keeps rules of kind `inscription`; unknown rule names are ignored.
    pub fn parse(rules: &[ProjectSessionRule]) -> Self {
        let mut requirements = Self::default();

        for rule in rules.iter().filter(|r| r.rule.kind == INSCRIPTION) {
            let bucket = match rule.rule.internal_name.as_str() {
                QUESTS_VALIDATED => &mut requirements.required_quests,
                QUESTS_NOT_VALIDATED => &mut requirements.forbidden_quests,
                NEITHER_ONGOING_OR_VALIDATED => &mut requirements.forbidden_projects,
                other => {
                    tracing::debug!(rule = other, "Ignoring unsupported inscription rule");
                    continue;
                }
            };
            bucket.extend(
                rule.params
                    .iter()
                    .map(|p| p.value.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            );
        }

        requirements
    }

    pub fn rule_count(&self) -> usize {
        self.required_quests.len() + self.forbidden_quests.len() + self.forbidden_projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Blackholed,
    CursusEnded,
    ForbiddenProject { slug: String, status: String },
    MissingQuest(String),
    ForbiddenQuest(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Blackholed => write!(f, "blackholed"),
            Rejection::CursusEnded => write!(f, "cursus ended"),
            Rejection::ForbiddenProject { slug, status } => {
                write!(f, "project {slug} is {status}")
            }
            Rejection::MissingQuest(slug) => write!(f, "quest {slug} not validated"),
            Rejection::ForbiddenQuest(slug) => write!(f, "quest {slug} already validated"),
        }
    }
}

/// Cheap checks on the cursus record, before any profile is fetched.
pub fn screen_cursus_user(record: &CursusUser, now: DateTime<Utc>) -> Result<(), Rejection> {
    if record.is_blackholed(now) {
        return Err(Rejection::Blackholed);
    }
    if record.has_ended(now) {
        return Err(Rejection::CursusEnded);
    }
    Ok(())
}

/// No forbidden project may be ongoing or validated.
pub fn check_forbidden_projects(
    projects: &[ProjectUser],
    forbidden: &BTreeSet<String>,
) -> Result<(), Rejection> {
    if forbidden.is_empty() {
        return Ok(());
    }

    match projects
        .iter()
        .filter(|p| forbidden.contains(&p.project.slug))
        .find(|p| p.is_ongoing() || p.is_validated())
    {
        Some(p) => Err(Rejection::ForbiddenProject {
            slug: p.project.slug.clone(),
            status: if p.is_ongoing() {
                p.status.clone()
            } else {
                "validated".to_string()
            },
        }),
        None => Ok(()),
    }
}

/// Every required quest must be validated; an absent record never counts.
pub fn check_required_quests(
    quests: &[QuestUser],
    required: &BTreeSet<String>,
) -> Result<(), Rejection> {
    let validated = validated_slugs(quests);
    match required.iter().find(|slug| !validated.contains(slug.as_str())) {
        Some(slug) => Err(Rejection::MissingQuest(slug.clone())),
        None => Ok(()),
    }
}

pub fn check_forbidden_quests(
    quests: &[QuestUser],
    forbidden: &BTreeSet<String>,
) -> Result<(), Rejection> {
    match quests
        .iter()
        .find(|q| q.is_validated() && forbidden.contains(&q.quest.slug))
    {
        Some(q) => Err(Rejection::ForbiddenQuest(q.quest.slug.clone())),
        None => Ok(()),
    }
}

/// Both quest rules against a candidate's quest history.
pub fn check_quests(
    requirements: &InscriptionRequirements,
    quests: &[QuestUser],
) -> Result<(), Rejection> {
    check_required_quests(quests, &requirements.required_quests)?;
    check_forbidden_quests(quests, &requirements.forbidden_quests)
}

fn validated_slugs(quests: &[QuestUser]) -> HashSet<&str> {
    quests
        .iter()
        .filter(|q| q.is_validated())
        .map(|q| q.quest.slug.as_str())
        .collect()
}
