use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Keeps the file writer flushing; drop it only when the process is done logging.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    pub log_path: Option<PathBuf>,
}

/// Daily log files kept before the oldest is pruned.
const MAX_LOG_FILES: usize = 7;

/// Initialize tracing with a daily log file and a compact stderr layer.
///
/// Every run of a day appends to `<config_dir>/t42/logs/t42.YYYY-MM-DD.log` (UTC date),
/// and only the last week of files is kept. Stderr shows warnings, or debug output
/// when `verbose` is set. `RUST_LOG` replaces the default filter.
pub fn init_logging(verbose: bool) -> Result<LoggingGuard> {
    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_level);

    // Default to debug for our crates and info elsewhere; RUST_LOG overrides
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("t42=debug,t42_api=debug,t42_auth=debug,info"));

    // A missing or read-only config dir only costs the log file
    let (file_layer, guard, log_path) = match open_log_file() {
        Ok((writer, guard, path)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard), Some(path))
        }
        Err(e) => {
            eprintln!("warning: file logging disabled: {e:#}");
            (None, None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(LoggingGuard {
        _file: guard,
        log_path,
    })
}

fn open_log_file() -> Result<(NonBlocking, WorkerGuard, PathBuf)> {
    let logs_dir = t42_auth::config_dir()?.join("logs");
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Could not create {}", logs_dir.display()))?;

    let file_appender = daily_appender(&logs_dir)?;
    let log_path = logs_dir.join(format!("t42.{}.log", Utc::now().format("%Y-%m-%d")));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    Ok((non_blocking, guard, log_path))
}

fn daily_appender(logs_dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("t42")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(logs_dir)
        .with_context(|| format!("Could not open a log file in {}", logs_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn runs_on_the_same_day_share_one_file() {
        let dir = tempfile::tempdir().unwrap();

        for run in ["first", "second"] {
            let mut appender = daily_appender(dir.path()).unwrap();
            writeln!(appender, "{run} run").unwrap();
            appender.flush().unwrap();
        }

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files.len(), 1, "{files:?}");
        assert!(files[0].starts_with("t42.") && files[0].ends_with(".log"));

        let contents = std::fs::read_to_string(dir.path().join(&files[0])).unwrap();
        assert!(contents.contains("first run") && contents.contains("second run"));
    }
}
