use super::{Context, Listing, fetch_listing};
use crate::cli::{BlackholeStatus, DEFAULT_CURSUS_ID, UserAction, UserFilterArgs, UserListArgs};
use crate::eligibility::resolve_campus;
use crate::output::{self, Table, truncate};
use anyhow::Result;
use chrono::{DateTime, Utc};
use t42_api::endpoints::cursus::CursusUser;
use t42_api::endpoints::users::User;
use t42_api::{Client, Request};

pub async fn run(action: UserAction, ctx: &Context) -> Result<()> {
    let client = ctx.user_client().await?;
    match action {
        UserAction::List(args) => list(&client, ctx, &args).await,
        UserAction::Show { login } => show(&client, ctx, &login).await,
        UserAction::Quests { login } => quests(&client, ctx, &login).await,
    }
}

async fn list(client: &Client, ctx: &Context, args: &UserListArgs) -> Result<()> {
    let campus_id = match args.campus.selector() {
        Some(selector) => Some(resolve_campus(client, &selector).await?.id),
        None => None,
    };
    let page = &args.page;
    let filters = &args.filters;

    // Levels and blackholes live on cursus records, so either implies the default cursus
    let levels = args.levels.range();
    if args.cursus_id.is_some() || !levels.is_unbounded() || filters.blackhole_status.is_some() {
        let cursus_id = args.cursus_id.unwrap_or(DEFAULT_CURSUS_ID);
        let mut request = Request::cursus()
            .users(cursus_id)
            .level_range(levels)
            .per_page(page.per_page)
            .sort(page.sort.clone().unwrap_or_else(|| "-level".to_string()));
        if let Some(id) = campus_id {
            request = request.campus_id(id);
        }
        if let Some(active) = filters.active() {
            request = request.active(active);
        }
        if let Some(n) = page.page {
            request = request.page(n);
        }
        let mut listing = fetch_listing(client, &request, args.all).await?;
        retain_cursus_users(&mut listing.items, filters, Utc::now());
        return print_cursus_users(ctx, &listing);
    }

    let mut listing = match campus_id {
        Some(id) => {
            let mut request = Request::users().in_campus(id).per_page(page.per_page);
            if let Some(sort) = &page.sort {
                request = request.sort(sort.as_str());
            }
            if let Some(n) = page.page {
                request = request.page(n);
            }
            if let Some(active) = filters.active() {
                request = request.active(active);
            }
            if let Some(alumni) = filters.alumni() {
                request = request.alumni(alumni);
            }
            if let Some(staff) = filters.staff() {
                request = request.staff(staff);
            }
            fetch_listing(client, &request, args.all).await?
        }
        None => {
            let mut request = Request::users().list().per_page(page.per_page);
            if let Some(sort) = &page.sort {
                request = request.sort(sort.as_str());
            }
            if let Some(n) = page.page {
                request = request.page(n);
            }
            if let Some(active) = filters.active() {
                request = request.active(active);
            }
            if let Some(alumni) = filters.alumni() {
                request = request.alumni(alumni);
            }
            if let Some(staff) = filters.staff() {
                request = request.staff(staff);
            }
            fetch_listing(client, &request, args.all).await?
        }
    };
    retain_users(&mut listing.items, filters);
    print_users(ctx, &listing)
}

/// Client-side filters for cursus records; the page footer still counts the server page.
fn retain_cursus_users(records: &mut Vec<CursusUser>, filters: &UserFilterArgs, now: DateTime<Utc>) {
    if let Some(status) = filters.blackhole_status {
        let before = records.len();
        records.retain(|record| matches_blackhole(record, status, filters.blackhole_days, now));
        tracing::debug!(?status, before, after = records.len(), "Applied blackhole filter");
    }
}

fn retain_users(users: &mut Vec<User>, filters: &UserFilterArgs) {
    if let Some(min) = filters.min_projects {
        let before = users.len();
        users.retain(|user| validated_projects(user) >= min);
        tracing::debug!(min, before, after = users.len(), "Applied validated project filter");
    }
}

fn matches_blackhole(
    record: &CursusUser,
    status: BlackholeStatus,
    days: i64,
    now: DateTime<Utc>,
) -> bool {
    match status {
        BlackholeStatus::None => record.blackholed_at.is_none(),
        BlackholeStatus::Active => record.blackholed_at.is_some() && record.end_at.is_none(),
        BlackholeStatus::Past => record.is_blackholed(now),
        BlackholeStatus::Upcoming => {
            !record.is_blackholed(now)
                && record.days_until_blackhole(now).is_some_and(|left| left < days)
        }
    }
}

fn validated_projects(user: &User) -> usize {
    user.projects_users.iter().filter(|p| p.is_validated()).count()
}

fn print_cursus_users(ctx: &Context, listing: &Listing<CursusUser>) -> Result<()> {
    if ctx.json {
        return output::print_json(listing);
    }
    if listing.items.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let now = Utc::now();
    let mut table = Table::new(&["LOGIN", "NAME", "LEVEL", "GRADE", "BLACKHOLE"]);
    for record in &listing.items {
        let (login, name) = match &record.user {
            Some(user) => (
                user.login.as_str(),
                user.displayname.as_deref().unwrap_or(&user.login),
            ),
            None => ("?", "?"),
        };
        table.row([
            truncate(login, 18),
            truncate(name, 28),
            output::level(record.level),
            output::or_dash(record.grade.as_deref()).to_string(),
            output::blackhole(record.blackholed_at, now),
        ]);
    }
    print!("{table}");
    print_footer(listing, "users");
    Ok(())
}

fn print_users(ctx: &Context, listing: &Listing<User>) -> Result<()> {
    if ctx.json {
        return output::print_json(listing);
    }
    if listing.items.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut table = Table::new(&["LOGIN", "NAME", "LOCATION", "POOL"]);
    for user in &listing.items {
        let pool = match (&user.pool_month, &user.pool_year) {
            (Some(month), Some(year)) => format!("{month} {year}"),
            _ => "-".to_string(),
        };
        table.row([
            truncate(&user.login, 18),
            truncate(user.display_name(), 28),
            output::or_dash(user.location.as_deref()).to_string(),
            pool,
        ]);
    }
    print!("{table}");
    print_footer(listing, "users");
    Ok(())
}

fn print_footer<T>(listing: &Listing<T>, noun: &str) {
    match &listing.meta {
        Some(meta) => println!("\n{}", output::page_footer(meta, noun)),
        None => println!("\nTotal: {} {noun}", listing.items.len()),
    }
}

async fn show(client: &Client, ctx: &Context, login: &str) -> Result<()> {
    let user = client.send(Request::users().get(login)).await?;
    if ctx.json {
        return output::print_json(&user);
    }

    let now = Utc::now();
    println!("User:       {} ({})", user.display_name(), user.login);
    println!("Email:      {}", output::or_dash(user.email.as_deref()));
    if let Some(campus) = user.primary_campus() {
        println!("Campus:     {}", campus.label());
    }
    println!("Location:   {}", output::or_dash(user.location.as_deref()));
    if let (Some(month), Some(year)) = (&user.pool_month, &user.pool_year) {
        println!("Pool:       {month} {year}");
    }
    println!("Wallet:     {}", user.wallet.unwrap_or(0));
    println!("Correction: {} points", user.correction_point.unwrap_or(0));
    println!(
        "Status:     {}",
        if user.active.unwrap_or(true) { "active" } else { "inactive" }
    );
    if user.alumni {
        println!("Alumni:     yes");
    }
    if user.staff {
        println!("Staff:      yes");
    }

    if !user.cursus_users.is_empty() {
        println!("\nCursus:");
        for record in &user.cursus_users {
            let name = record
                .cursus
                .as_ref()
                .map(|c| c.name.clone())
                .or_else(|| record.cursus_id.map(|id| format!("cursus {id}")))
                .unwrap_or_else(|| "unknown cursus".to_string());
            let mut line = format!("  {name}: level {}", output::level(record.level));
            if let Some(grade) = &record.grade {
                line.push_str(&format!(" ({grade})"));
            }
            if record.blackholed_at.is_some() {
                line.push_str(&format!(
                    ", blackhole {}",
                    output::blackhole(record.blackholed_at, now)
                ));
            }
            println!("{line}");
        }
    }

    let validated = user.projects_users.iter().filter(|p| p.is_validated()).count();
    let ongoing = user.projects_users.iter().filter(|p| p.is_ongoing()).count();
    println!("\nProjects:   {validated} validated, {ongoing} ongoing");
    Ok(())
}

async fn quests(client: &Client, ctx: &Context, login: &str) -> Result<()> {
    let quests = client.drain(&Request::users().quests(login)).await?;
    if ctx.json {
        return output::print_json(&quests);
    }
    if quests.is_empty() {
        println!("No quests found for {login}.");
        return Ok(());
    }

    let mut table = Table::new(&["QUEST", "SLUG", "STATUS", "VALIDATED AT"]);
    for quest in &quests {
        let (status, validated_at) = match quest.validated_at {
            Some(at) => ("validated", at.format("%Y-%m-%d").to_string()),
            None => ("in progress", "-".to_string()),
        };
        table.row([
            truncate(&quest.quest.name, 30),
            quest.quest.slug.clone(),
            status.to_string(),
            validated_at,
        ]);
    }
    print!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cursus_user, project_user, user};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn filters(status: Option<BlackholeStatus>, days: i64) -> UserFilterArgs {
        UserFilterArgs {
            blackhole_status: status,
            blackhole_days: days,
            ..Default::default()
        }
    }

    #[test]
    fn upcoming_blackhole_respects_the_window() {
        let soon = cursus_user(1, "soon", 5.0, Some(now() + Duration::days(3)));
        let later = cursus_user(2, "later", 5.0, Some(now() + Duration::days(45)));
        let gone = cursus_user(3, "gone", 5.0, Some(now() - Duration::hours(2)));
        let unset = cursus_user(4, "unset", 5.0, None);

        for (record, expected) in [(&soon, true), (&later, false), (&gone, false), (&unset, false)] {
            assert_eq!(
                matches_blackhole(record, BlackholeStatus::Upcoming, 30, now()),
                expected,
                "{:?}",
                record.user
            );
        }
        assert!(matches_blackhole(&later, BlackholeStatus::Upcoming, 60, now()));
    }

    #[test]
    fn past_none_and_active_blackhole_statuses() {
        let gone = cursus_user(1, "gone", 5.0, Some(now() - Duration::days(1)));
        let unset = cursus_user(2, "unset", 5.0, None);
        let mut finished = cursus_user(3, "finished", 5.0, Some(now() + Duration::days(9)));
        finished.end_at = Some(now() - Duration::days(1));

        assert!(matches_blackhole(&gone, BlackholeStatus::Past, 30, now()));
        assert!(!matches_blackhole(&unset, BlackholeStatus::Past, 30, now()));
        assert!(matches_blackhole(&unset, BlackholeStatus::None, 30, now()));
        assert!(!matches_blackhole(&gone, BlackholeStatus::None, 30, now()));
        assert!(matches_blackhole(&gone, BlackholeStatus::Active, 30, now()));
        assert!(!matches_blackhole(&finished, BlackholeStatus::Active, 30, now()));
    }

    #[test]
    fn cursus_records_keep_only_matching_status() {
        let mut records = vec![
            cursus_user(1, "gone", 9.0, Some(now() - Duration::days(1))),
            cursus_user(2, "safe", 8.0, Some(now() + Duration::days(100))),
            cursus_user(3, "soon", 7.0, Some(now() + Duration::days(2))),
        ];

        retain_cursus_users(&mut records, &filters(Some(BlackholeStatus::Upcoming), 30), now());

        let ids: Vec<u64> = records.iter().filter_map(|r| r.user.as_ref()).map(|u| u.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn no_blackhole_filter_keeps_every_record() {
        let mut records = vec![cursus_user(1, "gone", 9.0, Some(now() - Duration::days(1)))];
        retain_cursus_users(&mut records, &filters(None, 30), now());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn min_projects_counts_only_validated_attempts() {
        let mut users = vec![
            user(
                1,
                "done",
                26,
                vec![
                    project_user("libft", "finished", Some(true)),
                    project_user("get_next_line", "finished", Some(true)),
                ],
            ),
            user(
                2,
                "trying",
                26,
                vec![
                    project_user("libft", "finished", Some(true)),
                    project_user("get_next_line", "finished", Some(false)),
                    project_user("ft_printf", "in_progress", None),
                ],
            ),
        ];
        let filters = UserFilterArgs {
            min_projects: Some(2),
            ..Default::default()
        };

        retain_users(&mut users, &filters);

        let logins: Vec<&str> = users.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["done"]);
    }
}
