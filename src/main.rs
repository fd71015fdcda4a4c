//! AutoClick - Precise, cancellable automatic mouse clicker
//!
//! Main entry point for the console application.
//!
//! # Overview
//!
//! This binary wires the click engine to a terminal front end. It initializes:
//! - Settings ([`SettingsLoader`]: defaults, `autoclick.yaml`, `AUTOCLICK_*`)
//! - Logging infrastructure (file rotation + optional console output)
//! - Tokio async runtime (session loops and interval timers)
//! - Input backend (native `enigo` injection or dry-run)
//! - [`SessionManager`] (single active session)
//! - [`ConsoleController`] (Enter toggles start/stop)
//!
//! # Execution Flow
//!
//! 1. Parse the click form from the command line
//! 2. Load settings and initialize logging → logs/autoclick.<date>
//! 3. Create the tokio runtime
//! 4. Build the session manager around the selected backend
//! 5. Start clicking and hand control to the console loop
//! 6. On exit, stop the active session and wait for its last click
//! 7. Log metrics and shut the runtime down

use anyhow::{Context, Result, bail};
use autoclick::services::{Backends, DryRunBackend};
use autoclick::ui::{ClickForm, ConsoleController};
use autoclick::{APP_NAME, EngineSettings, SessionManager, SettingsLoader, VERSION};
use camino::Utf8PathBuf;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "autoclick", version, about = "Automatic mouse clicker")]
struct Cli {
    #[command(flatten)]
    form: ClickForm,

    /// Directory containing autoclick.yaml
    #[arg(long, default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Log clicks instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// Print the effective settings as YAML and exit
    #[arg(long)]
    print_settings: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = SettingsLoader::new(&cli.config_dir).load()?;

    if cli.print_settings {
        print!("{}", SettingsLoader::render_yaml(&settings)?);
        return Ok(());
    }

    let _guard = autoclick::logging::setup_logging(&settings, APP_NAME)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let request = cli
        .form
        .to_request()
        .context("Invalid click interval")?;

    let backends = select_backends(cli.dry_run, &settings)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("autoclick-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let manager = SessionManager::new(backends, &settings, runtime.handle().clone());
    let metrics = manager.metrics();

    let controller = ConsoleController::new(manager, request, settings.toggle_key.clone());
    let result = runtime.block_on(controller.run());

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    match result {
        Ok(Some(report)) if !report.is_success() => {
            bail!("{}", report.summary())
        }
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("Console error: {}", e);
            Err(e)
        }
    }
}

fn select_backends(dry_run: bool, settings: &EngineSettings) -> Result<Backends> {
    if dry_run {
        tracing::info!("Dry run: clicks are logged, not injected");
        return Ok(Backends::shared(Arc::new(DryRunBackend::new())));
    }

    native_backends(settings)
}

#[cfg(feature = "native")]
fn native_backends(settings: &EngineSettings) -> Result<Backends> {
    use autoclick::services::NativeBackend;

    tracing::info!(
        "Using native input injection (hold {}ms, double-click gap {}ms)",
        settings.button_hold_ms,
        settings.double_click_gap_ms
    );
    Ok(Backends::shared(Arc::new(NativeBackend::new(
        settings.button_hold(),
    ))))
}

#[cfg(not(feature = "native"))]
fn native_backends(_settings: &EngineSettings) -> Result<Backends> {
    bail!("This build has no native input backend; rebuild with `--features native` or pass --dry-run")
}
