use super::Context;
use crate::cli::EligibleArgs;
use crate::eligibility::{
    CampusSelector, EligibilityQuery, EligibilityReport, EligibilityScanner, fetch_requirements,
};
use crate::output::{self, Table, truncate};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use itertools::Itertools;

pub async fn run(args: EligibleArgs, ctx: &Context) -> Result<()> {
    let query = EligibilityQuery {
        project: args.project,
        campus: args.campus.selector().unwrap_or(CampusSelector::Primary),
        cursus_id: args.cursus_id,
        levels: args.levels.range(),
        limit: args.limit,
    };

    let client = ctx.user_client().await?;
    let scanner = EligibilityScanner::new(&client);
    let target = scanner.resolve(&query).await?;
    if !ctx.json {
        eprintln!(
            "Checking {} at {} (session {}, cursus {})",
            target.project.slug,
            target.campus.label(),
            target.session_id,
            target.cursus_id
        );
    }

    let app = ctx.app_client().await?;
    let requirements = fetch_requirements(&app, target.session_id)
        .await
        .with_context(|| format!("Failed to read the rules of session {}", target.session_id))?;

    let report = scanner.scan(target, requirements, &query).await?;
    if ctx.json {
        return output::print_json(&report);
    }
    print!("{}", render(&report, Utc::now()));
    Ok(())
}

fn render(report: &EligibilityReport, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "ELIGIBLE USERS FOR: {} ({}, cursus {})\n",
        report.project_name, report.campus.name, report.cursus_id
    );
    out.push_str(&format!(
        "Not blackholed | {} inscription rules checked\n",
        report.requirements.rule_count()
    ));
    for (label, slugs) in [
        ("Required quests", &report.requirements.required_quests),
        ("Forbidden quests", &report.requirements.forbidden_quests),
        ("Forbidden projects", &report.requirements.forbidden_projects),
    ] {
        if !slugs.is_empty() {
            out.push_str(&format!("{label}: {}\n", slugs.iter().join(", ")));
        }
    }
    out.push('\n');

    if report.eligible.is_empty() {
        out.push_str("No eligible users found.\n");
        out.push_str(&format!("\nChecked {} users\n", report.stats.examined));
        return out;
    }

    let mut table = Table::new(&["LOGIN", "NAME", "LEVEL", "BH"]);
    for candidate in &report.eligible {
        table.row([
            truncate(candidate.login(), 18),
            truncate(candidate.user.display_name(), 28),
            output::level(candidate.level()),
            output::blackhole(candidate.cursus_user.blackholed_at, now),
        ]);
    }
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\nShowing {} eligible users (checked {} candidates)\n",
        report.eligible.len(),
        report.stats.examined
    ));
    if report.eligible.len() >= report.limit {
        out.push_str(&format!(
            "Use --limit {} to see more results\n",
            report.limit * 2
        ));
    }
    out
}
