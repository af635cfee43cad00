use super::lookup::{self, CampusSelector};
use super::rules::{self, InscriptionRequirements};
use super::EligibilityError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use t42_api::endpoints::LevelRange;
use t42_api::endpoints::campus::Campus;
use t42_api::endpoints::cursus::CursusUser;
use t42_api::endpoints::projects::Project;
use t42_api::endpoints::quests::QuestUser;
use t42_api::endpoints::users::User;
use t42_api::{ApiError, Client, DEFAULT_PER_PAGE, Page, PageCursor, Request};

#[derive(Debug, Clone)]
pub struct EligibilityQuery {
    pub project: String,
    pub campus: CampusSelector,
    pub cursus_id: u64,
    pub levels: LevelRange,
    pub limit: usize,
}

/// What a query resolved to before any candidate is examined.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub project: Project,
    pub campus: Campus,
    pub session_id: u64,
    pub cursus_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibleUser {
    pub user: User,
    /// The cursus record the candidate was found through.
    pub cursus_user: CursusUser,
    /// Validated completions of the required quests.
    pub quests: Vec<QuestUser>,
}

impl EligibleUser {
    pub fn login(&self) -> &str {
        &self.user.login
    }

    pub fn level(&self) -> f64 {
        self.cursus_user.level
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub examined: usize,
    pub accepted: usize,
    pub pages_fetched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub project_slug: String,
    pub project_name: String,
    pub campus: Campus,
    pub cursus_id: u64,
    pub session_id: u64,
    pub min_level: Option<f64>,
    pub max_level: Option<f64>,
    pub limit: usize,
    pub requirements: InscriptionRequirements,
    pub eligible: Vec<EligibleUser>,
    pub stats: ScanStats,
}

/// Session rules are only readable with an application token.
pub async fn fetch_requirements(
    app: &Client,
    session_id: u64,
) -> Result<InscriptionRequirements, EligibilityError> {
    let session = app.send(Request::projects().session(session_id)).await?;
    let requirements = InscriptionRequirements::parse(&session.project_sessions_rules);
    tracing::info!(
        session_id,
        required_quests = ?requirements.required_quests,
        forbidden_quests = ?requirements.forbidden_quests,
        forbidden_projects = ?requirements.forbidden_projects,
        "Parsed inscription requirements"
    );
    Ok(requirements)
}

/// Walks `/v2/cursus_users` by descending level, one candidate at a time.
pub struct EligibilityScanner<'a> {
    client: &'a Client,
    now: DateTime<Utc>,
    per_page: u32,
}

impl<'a> EligibilityScanner<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            now: Utc::now(),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Reference time for blackhole and end-of-cursus checks.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub async fn resolve(&self, query: &EligibilityQuery) -> Result<ScanTarget, EligibilityError> {
        let campus = lookup::resolve_campus(self.client, &query.campus).await?;
        tracing::info!(campus = %campus.label(), campus_id = campus.id, "Resolved campus");

        let project = lookup::resolve_project(self.client, &query.project).await?;
        let session_id = lookup::find_session(&project, campus.id, query.cursus_id)?.id;
        tracing::info!(project = %project.slug, session_id, "Resolved project session");

        Ok(ScanTarget {
            project,
            campus,
            session_id,
            cursus_id: query.cursus_id,
        })
    }

    pub async fn scan(
        &self,
        target: ScanTarget,
        requirements: InscriptionRequirements,
        query: &EligibilityQuery,
    ) -> Result<EligibilityReport, EligibilityError> {
        let request = Request::cursus()
            .users(target.cursus_id)
            .campus_id(target.campus.id)
            .sort("-level")
            .level_range(query.levels)
            .per_page(self.per_page);

        let mut stats = ScanStats::default();
        let mut eligible = Vec::new();

        let mut page: Page<CursusUser> = self.client.fetch_page(&request).await?;
        let mut cursor = PageCursor::new(&page.meta);
        stats.pages_fetched += 1;
        if let Some(total) = page.meta.total_count {
            tracing::info!(total, "Candidates in range");
        }

        'pages: loop {
            let Page { items, meta } = page;
            let short = items.len() < self.per_page as usize;

            for record in items {
                if eligible.len() >= query.limit {
                    break 'pages;
                }
                stats.examined += 1;
                if let Some(found) = self.examine(record, &requirements).await? {
                    eligible.push(found);
                    tracing::info!(found = eligible.len(), limit = query.limit, "Eligible user found");
                }
            }

            if eligible.len() >= query.limit || short {
                break;
            }
            if cursor.next_link(&meta).is_none() {
                break;
            }

            page = match self.client.fetch_next(&meta).await? {
                Some(page) => page,
                None => break,
            };
            stats.pages_fetched += 1;
            if !cursor.accept(&page.meta) {
                break;
            }
        }

        stats.accepted = eligible.len();
        tracing::info!(
            examined = stats.examined,
            accepted = stats.accepted,
            pages = stats.pages_fetched,
            "Eligibility scan finished"
        );

        Ok(EligibilityReport {
            project_slug: target.project.slug,
            project_name: target.project.name,
            campus: target.campus,
            cursus_id: target.cursus_id,
            session_id: target.session_id,
            min_level: query.levels.min,
            max_level: query.levels.max,
            limit: query.limit,
            requirements,
            eligible,
            stats,
        })
    }

    /// Resolve, read the rules with `app`, then scan.
    pub async fn run(
        &self,
        app: &Client,
        query: &EligibilityQuery,
    ) -> Result<EligibilityReport, EligibilityError> {
        let target = self.resolve(query).await?;
        let requirements = fetch_requirements(app, target.session_id).await?;
        self.scan(target, requirements, query).await
    }

    async fn examine(
        &self,
        record: CursusUser,
        requirements: &InscriptionRequirements,
    ) -> Result<Option<EligibleUser>, EligibilityError> {
        let Some(summary) = record.user.clone() else {
            tracing::warn!(
                cursus_user_id = record.id,
                "Cursus record without a user, skipping"
            );
            return Ok(None);
        };
        let login = summary.login.as_str();

        if let Err(rejection) = rules::screen_cursus_user(&record, self.now) {
            tracing::debug!(login, %rejection, "Candidate skipped");
            return Ok(None);
        }

        tracing::debug!(login, level = record.level, "Checking candidate");
        let profile = self.client.send(Request::users().get(summary.id)).await;
        let Some(user) = skip_missing(login, profile)? else {
            return Ok(None);
        };
        if let Err(rejection) =
            rules::check_forbidden_projects(&user.projects_users, &requirements.forbidden_projects)
        {
            tracing::debug!(login, %rejection, "Candidate rejected");
            return Ok(None);
        }

        let history = self.client.drain(&Request::users().quests(summary.id)).await;
        let Some(quests) = skip_missing(login, history)? else {
            return Ok(None);
        };
        if let Err(rejection) = rules::check_quests(requirements, &quests) {
            tracing::debug!(login, %rejection, "Candidate rejected");
            return Ok(None);
        }

        let quests = quests
            .into_iter()
            .filter(|q| q.is_validated() && requirements.required_quests.contains(&q.quest.slug))
            .collect();

        Ok(Some(EligibleUser {
            user,
            cursus_user: record,
            quests,
        }))
    }
}

/// A vanished profile is skipped; any other failure aborts the scan.
fn skip_missing<T>(
    login: &str,
    result: Result<T, ApiError>,
) -> Result<Option<T>, EligibilityError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!(login, "Candidate data not found (404), skipping");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
