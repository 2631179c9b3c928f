//! TUI command - launches the interactive terminal UI

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use super::{connect, load_config, GlobalArgs, TuiArgs};
use crate::tui::{run_tui, TuiOptions};

pub async fn execute(global: &GlobalArgs, args: TuiArgs, verbose: bool) -> Result<()> {
    let config = load_config(global)?;

    // The terminal belongs to the UI, so logs go to a file
    init_file_logging(&config.log_file(), verbose)?;

    let api = connect(&config, global)?;
    if !api.is_authenticated() {
        anyhow::bail!("Not signed in. Run `planctl login` first.");
    }

    let options = TuiOptions {
        refresh: Duration::from_millis(config.tui.refresh_ms),
        id_preview_chars: config.tui.id_preview_chars,
        start_in_explorer: args.explorer,
    };
    info!("Starting TUI against {}", config.api.base_url);

    let handle = Handle::current();
    tokio::task::spawn_blocking(move || run_tui(api, handle, options))
        .await
        .context("TUI thread panicked")?
}

fn init_file_logging(path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = if verbose {
        EnvFilter::new("planctl=debug")
    } else {
        EnvFilter::new("planctl=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
