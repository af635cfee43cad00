use super::{Context, fetch_listing};
use crate::cli::{PageArgs, ProjectAction};
use crate::eligibility::resolve_project;
use crate::output::{self, Table, humanize, truncate};
use anyhow::Result;
use t42_api::{Client, Request};

pub async fn run(action: ProjectAction, ctx: &Context) -> Result<()> {
    let client = ctx.user_client().await?;
    match action {
        ProjectAction::List { mine, cursus, page } if mine => {
            list_mine(&client, ctx, cursus, &page).await
        }
        ProjectAction::List { cursus, page, .. } => list(&client, ctx, cursus, &page).await,
        ProjectAction::Show { slug } => show(&client, ctx, &slug).await,
    }
}

async fn list(client: &Client, ctx: &Context, cursus: Option<u64>, page: &PageArgs) -> Result<()> {
    let mut request = Request::projects().list().per_page(page.per_page);
    if let Some(id) = cursus {
        request = request.cursus_id(id);
    }
    if let Some(sort) = &page.sort {
        request = request.sort(sort.as_str());
    }
    if let Some(n) = page.page {
        request = request.page(n);
    }

    let listing = fetch_listing(client, &request, false).await?;
    if ctx.json {
        return output::print_json(&listing);
    }
    if listing.items.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    let mut table = Table::new(&["NAME", "SLUG", "ID", "XP", "EXAM"]);
    for project in &listing.items {
        table.row([
            truncate(&project.name, 40),
            project.slug.clone(),
            project.id.to_string(),
            project
                .difficulty
                .map_or_else(|| "-".to_string(), |xp| xp.to_string()),
            output::yes_no(project.exam).to_string(),
        ]);
    }
    print!("{table}");
    if let Some(meta) = &listing.meta {
        println!("\n{}", output::page_footer(meta, "projects"));
    }
    Ok(())
}

async fn list_mine(
    client: &Client,
    ctx: &Context,
    cursus: Option<u64>,
    page: &PageArgs,
) -> Result<()> {
    let me = client.send(Request::users().me()).await?;
    tracing::debug!(login = %me.login, "Listing own projects");

    let mut request = Request::users().projects(me.id).per_page(page.per_page);
    if let Some(id) = cursus {
        request = request.cursus_id(id);
    }
    if let Some(sort) = &page.sort {
        request = request.sort(sort.as_str());
    }
    if let Some(n) = page.page {
        request = request.page(n);
    }

    let listing = fetch_listing(client, &request, false).await?;
    if ctx.json {
        return output::print_json(&listing);
    }
    if listing.items.is_empty() {
        println!("No projects found for {}.", me.login);
        return Ok(());
    }

    let mut table = Table::new(&["PROJECT", "STATUS", "MARK", "VALIDATED", "MARKED AT"]);
    for attempt in &listing.items {
        let validated = match attempt.validated {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        table.row([
            truncate(&attempt.project.name, 30),
            humanize(&attempt.status),
            attempt
                .final_mark
                .map_or_else(|| "-".to_string(), |mark| mark.to_string()),
            validated.to_string(),
            attempt
                .marked_at
                .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string()),
        ]);
    }
    print!("{table}");
    if let Some(meta) = &listing.meta {
        println!("\n{}", output::page_footer(meta, "projects"));
    }
    Ok(())
}

async fn show(client: &Client, ctx: &Context, slug: &str) -> Result<()> {
    let project = resolve_project(client, slug).await?;
    if ctx.json {
        return output::print_json(&project);
    }

    println!("Project: {} ({})", project.name, project.slug);
    println!("ID:      {}", project.id);
    if let Some(xp) = project.difficulty {
        println!("XP:      {xp}");
    }
    if project.exam {
        println!("Exam:    yes");
    }
    if !project.cursus.is_empty() {
        println!("\nCursus:");
        for cursus in &project.cursus {
            println!("  {} [{}]", cursus.name, cursus.id);
        }
    }
    if !project.project_sessions.is_empty() {
        println!("\nSessions: {}", project.project_sessions.len());
        let mut table = Table::new(&["SESSION", "CAMPUS", "CURSUS", "BEGIN"]);
        for session in &project.project_sessions {
            table.row([
                session.id.to_string(),
                session.campus_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                session.cursus_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                session
                    .begin_at
                    .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string()),
            ]);
        }
        print!("{table}");
    }
    Ok(())
}
