use super::{EligibilityError, LookupError};
use t42_api::endpoints::campus::Campus;
use t42_api::endpoints::project_sessions::ProjectSession;
use t42_api::endpoints::projects::Project;
use t42_api::{Client, Request};

/// Cap on the alternatives listed in a lookup error.
pub const MAX_ALTERNATIVES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampusSelector {
    Id(u64),
    /// Name or city, case-insensitive.
    Name(String),
    /// The logged-in user's primary campus.
    Primary,
}

pub async fn resolve_campus(
    client: &Client,
    selector: &CampusSelector,
) -> Result<Campus, EligibilityError> {
    match selector {
        CampusSelector::Id(id) => campus_by_id(client, *id).await,
        CampusSelector::Name(name) => {
            let campuses = client.drain(&Request::campus().list()).await?;
            match campuses.iter().find(|c| c.matches(name)) {
                Some(campus) => Ok(campus.clone()),
                None => Err(LookupError::CampusNotFound {
                    query: name.clone(),
                    available: labels(&campuses),
                }
                .into()),
            }
        }
        CampusSelector::Primary => {
            let me = client.send(Request::users().me()).await?;
            if let Some(campus) = me.primary_campus() {
                return Ok(campus.clone());
            }
            match me.primary_campus_id() {
                Some(id) => campus_by_id(client, id).await,
                None => Err(LookupError::NoPrimaryCampus { login: me.login }.into()),
            }
        }
    }
}

async fn campus_by_id(client: &Client, id: u64) -> Result<Campus, EligibilityError> {
    match client.send(Request::campus().get(id)).await {
        Ok(campus) => Ok(campus),
        Err(e) if e.is_not_found() => {
            let campuses = client.drain(&Request::campus().list()).await?;
            Err(LookupError::CampusNotFound {
                query: id.to_string(),
                available: labels(&campuses),
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

fn labels(campuses: &[Campus]) -> Vec<String> {
    campuses
        .iter()
        .take(MAX_ALTERNATIVES)
        .map(|c| format!("{} [{}]", c.label(), c.id))
        .collect()
}

/// Full project detail, sessions included, for an exact slug.
pub async fn resolve_project(client: &Client, slug: &str) -> Result<Project, EligibilityError> {
    let exact = client
        .fetch_page(&Request::projects().list().slug(slug).per_page(1u32))
        .await?;

    let Some(found) = exact.items.into_iter().next() else {
        let similar = client
            .fetch_page(
                &Request::projects()
                    .list()
                    .search_slug(slug)
                    .per_page(MAX_ALTERNATIVES as u32),
            )
            .await?;
        return Err(LookupError::ProjectNotFound {
            slug: slug.to_string(),
            suggestions: similar
                .items
                .into_iter()
                .take(MAX_ALTERNATIVES)
                .map(|p| p.slug)
                .collect(),
        }
        .into());
    };

    tracing::debug!(project_id = found.id, slug = %found.slug, "Resolved project");
    Ok(client.send(Request::projects().get(found.id)).await?)
}

/// The session of `project` run on this campus for this cursus.
pub fn find_session(
    project: &Project,
    campus_id: u64,
    cursus_id: u64,
) -> Result<&ProjectSession, LookupError> {
    project
        .session_for(campus_id, cursus_id)
        .ok_or_else(|| LookupError::SessionNotFound {
            project: project.slug.clone(),
            campus_id,
            cursus_id,
            available: project
                .project_sessions
                .iter()
                .filter_map(|s| Some(format!("{}/{}", s.campus_id?, s.cursus_id?)))
                .take(MAX_ALTERNATIVES)
                .collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{project, session};

    #[test]
    fn session_must_match_campus_and_cursus() {
        let detail = project(
            1337,
            "ft_transcendence",
            vec![session(1, 26, 21, Vec::new()), session(2, 1, 21, Vec::new())],
        );

        assert_eq!(find_session(&detail, 26, 21).unwrap().id, 1);

        match find_session(&detail, 26, 9) {
            Err(LookupError::SessionNotFound { available, .. }) => {
                assert_eq!(available, vec!["26/21".to_string(), "1/21".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
