mod calc;
mod cmd;
mod data;
mod logging;
mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "datepick", about = "popup date picker for the terminal")]
struct Cli {
    /// Path to the data directory containing config and form files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config.yaml and form.json
    Init,
    /// Open a single picker and print the chosen date
    Pick {
        /// Initially selected date (YYYY-MM-DD [HH:MM])
        #[arg(long)]
        date: Option<String>,
        /// Earliest selectable date
        #[arg(long)]
        min: Option<String>,
        /// Latest selectable date
        #[arg(long)]
        max: Option<String>,
    },
    /// Print the day grid of a month
    Grid {
        /// Month key (e.g. 2024-02)
        month: String,
        /// Print all 42 cells as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run(&data_dir)?;
    }
    logging::init_tracing(&data_dir)?;
    info!(data_dir = %data_dir.display(), "datepick starting");

    match cli.command {
        None => cmd::root::run(&data_dir),
        Some(Commands::Init) => cmd::init::run(&data_dir),
        Some(Commands::Pick { date, min, max }) => cmd::pick::run(
            &data_dir,
            date.as_deref(),
            min.as_deref(),
            max.as_deref(),
        ),
        Some(Commands::Grid { month, json }) => cmd::grid::run(&month, json),
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &std::path::Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
