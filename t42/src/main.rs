use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use t42::cli::Cli;
use t42::commands::{self, Context};
use t42::logging::init_logging;
use t42_auth::Settings;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    load_env_file(cli.env.as_deref())?;
    let _logging = init_logging(cli.verbose)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "t42 starting");

    let settings = Settings::new().context("Failed to load settings")?;
    settings.validate().map_err(|e| anyhow!("Invalid settings: {e}"))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling pending requests");
            on_interrupt.cancel();
        }
    });

    let ctx = Context::new(settings, cancel, cli.json);
    commands::run(cli.command, &ctx).await
}

/// An explicit `--env` file must exist; the default `secret/.env` is optional.
fn load_env_file(explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load environment file {}", path.display()))?;
        }
        None => match dotenvy::from_path(t42_auth::dotenv_path()) {
            Ok(()) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("Failed to load secret/.env"),
        },
    }
    Ok(())
}
