use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "datepick.log";

fn env_filter() -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match EnvFilter::try_new("error,datepick=info") {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("error"),
        },
    }
}

/// Sends tracing output to `datepick.log` in `dir`; the terminal belongs to the TUI.
pub fn init_tracing(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
