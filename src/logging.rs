use crate::models::EngineSettings;
use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging from the engine settings.
///
/// Always writes a daily rotating file `<log_dir>/<log_prefix>.<date>`. The
/// file is plain text unless `json_logs` is set. With `console_log`, a
/// colored layer also writes to stderr so it does not interleave with the
/// console prompt on stdout.
///
/// The level is `debug` when `debug_mode` is set and `info` otherwise;
/// `RUST_LOG` takes precedence over both.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(settings: &EngineSettings, log_prefix: &str) -> Result<WorkerGuard> {
    let log_dir = Utf8Path::new(&settings.log_dir);
    ensure_log_dir(log_dir)?;

    let file_appender = rolling::daily(log_dir, log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let text_file_layer = (!settings.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking.clone())
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let json_file_layer = settings.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_thread_ids(true)
            .with_current_span(false)
    });

    let console_layer = settings.console_log.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(level_filter(settings.debug_mode))
        .with(text_file_layer)
        .with(json_file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        log_dir,
        log_prefix,
        settings.debug_mode,
        settings.console_log,
        settings.json_logs
    );

    Ok(guard)
}

/// Create the log directory if it doesn't exist.
pub fn ensure_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

fn level_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}
