use super::Context;
use crate::cli::CampusAction;
use crate::eligibility::{CampusSelector, resolve_campus};
use crate::output::{self, Table, truncate};
use anyhow::Result;
use t42_api::endpoints::campus::Campus;
use t42_api::{Client, Request};

pub async fn run(action: CampusAction, ctx: &Context) -> Result<()> {
    let client = ctx.user_client().await?;
    match action {
        CampusAction::List {
            search,
            active_only,
        } => list(&client, ctx, search.as_deref(), active_only).await,
        CampusAction::Show { campus } => show(&client, ctx, &campus).await,
    }
}

/// Substring match on name, city, or country, ignoring case.
fn matches_search(campus: &Campus, search: &str) -> bool {
    let needle = search.to_lowercase();
    [Some(campus.name.as_str()), campus.city.as_deref(), campus.country.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

async fn list(
    client: &Client,
    ctx: &Context,
    search: Option<&str>,
    active_only: bool,
) -> Result<()> {
    let mut request = Request::campus().list();
    if active_only {
        request = request.active(true);
    }
    let campuses: Vec<Campus> = client
        .drain(&request)
        .await?
        .into_iter()
        .filter(|c| !active_only || c.is_active())
        .filter(|c| search.is_none_or(|s| matches_search(c, s)))
        .collect();

    if ctx.json {
        return output::print_json(&campuses);
    }
    if campuses.is_empty() {
        println!("No campuses found.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "NAME", "CITY", "COUNTRY", "ACTIVE"]);
    for campus in &campuses {
        table.row([
            campus.id.to_string(),
            truncate(&campus.name, 25),
            truncate(output::or_dash(campus.city.as_deref()), 20),
            truncate(output::or_dash(campus.country.as_deref()), 15),
            output::yes_no(campus.is_active()).to_string(),
        ]);
    }
    print!("{table}");
    println!("\nTotal: {} campuses", campuses.len());
    Ok(())
}

async fn show(client: &Client, ctx: &Context, campus: &str) -> Result<()> {
    let selector = match campus.parse::<u64>() {
        Ok(id) => CampusSelector::Id(id),
        Err(_) => CampusSelector::Name(campus.to_string()),
    };
    let campus = resolve_campus(client, &selector).await?;
    if ctx.json {
        return output::print_json(&campus);
    }

    println!("Campus:   {} (ID: {})", campus.name, campus.id);
    println!("City:     {}", output::or_dash(campus.city.as_deref()));
    println!("Country:  {}", output::or_dash(campus.country.as_deref()));
    println!("Timezone: {}", output::or_dash(campus.time_zone.as_deref()));
    if let Some(users) = campus.users_count {
        println!("Users:    {users}");
    }
    println!("Active:   {}", output::yes_no(campus.is_active()));
    if let Some(website) = campus.website.as_deref().filter(|w| !w.is_empty()) {
        println!("Website:  {website}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::campus;

    #[test]
    fn search_covers_name_city_and_country() {
        let mut tokyo = campus(26, "Tokyo", "Minato");
        tokyo.country = Some("Japan".into());

        assert!(matches_search(&tokyo, "tok"));
        assert!(matches_search(&tokyo, "MINATO"));
        assert!(matches_search(&tokyo, "jap"));
        assert!(!matches_search(&tokyo, "paris"));
    }
}
