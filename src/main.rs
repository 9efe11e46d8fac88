//! Part Tally command line.
//!
//! Usage:
//!     part-tally count --dir ./boms --header "Part Number" --list
//!     part-tally config set-dir ./boms

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use part_tally::logging::init_logging;
use part_tally::settings::{default_settings_path, Settings, SettingsUpdate};
use part_tally::source::{list_workbooks, WorkbookFile};
use part_tally::tally::{Aggregator, MatchMode, Tally};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "part-tally", version, about = "Count distinct part numbers across spreadsheets")]
struct Cli {
    /// Debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Settings file (default: $PART_TALLY_HOME/settings.json)
    #[arg(long, global = true, env = "PART_TALLY_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count distinct values under the header across all workbooks
    Count {
        /// Workbook directory (default: configured directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Header label (default: first template entry)
        #[arg(long)]
        header: Option<String>,

        /// Match the header exactly instead of as a substring
        #[arg(long)]
        exact: bool,

        /// Maximum number of documents processed at once
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the values as well as the count
        #[arg(short, long)]
        list: bool,
    },

    /// Count the workbooks in the directory
    Files {
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// View or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    /// Set the workbook directory
    SetDir { dir: PathBuf },
    /// Set the header labels; the first is used for counting
    SetTemplate {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    CompleteFirstRun,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings_path = match cli.settings {
        Some(path) => path,
        None => default_settings_path().context("Failed to locate settings file")?,
    };

    match cli.command {
        Command::Count {
            dir,
            header,
            exact,
            workers,
            list,
        } => {
            let settings = load_settings(&settings_path);
            let mut options = settings.tally_options();
            if let Some(label) = header {
                options.label = label;
            }
            if exact {
                options.mode = MatchMode::Exact;
            }
            if let Some(workers) = workers {
                options.workers = workers.max(1);
            }

            let files = workbooks(dir.or(settings.directory).as_deref())?;
            let tally = Aggregator::new(options)
                .run_sources(&files)
                .context("Failed to start workers")?;
            print_tally(&tally, list);
        }
        Command::Files { dir } => {
            let settings = load_settings(&settings_path);
            let files = workbooks(dir.or(settings.directory).as_deref())?;
            println!("{}", files.len());
            for file in &files {
                println!("  {}", file.path().display());
            }
        }
        Command::Config { action } => {
            let update = match action {
                ConfigAction::Show => {
                    let settings = Settings::load(&settings_path)?;
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                    return Ok(());
                }
                ConfigAction::SetDir { dir } => SettingsUpdate {
                    directory: Some(dir),
                    ..SettingsUpdate::default()
                },
                ConfigAction::SetTemplate { labels } => SettingsUpdate {
                    template: Some(labels),
                    ..SettingsUpdate::default()
                },
                ConfigAction::CompleteFirstRun => SettingsUpdate {
                    first_run_complete: Some(true),
                    ..SettingsUpdate::default()
                },
            };
            let mut settings = Settings::load(&settings_path)?;
            settings.merge(update);
            settings.save(&settings_path)?;
            info!(path = %settings_path.display(), "settings updated");
        }
    }
    Ok(())
}

/// Stored settings, or the defaults when the file cannot be read.
fn load_settings(path: &Path) -> Settings {
    Settings::load(path).unwrap_or_else(|error| {
        warn!(%error, "using default settings");
        Settings::default()
    })
}

/// Workbooks in `dir`; no configured directory means no documents.
fn workbooks(dir: Option<&Path>) -> Result<Vec<WorkbookFile>> {
    let Some(dir) = dir else {
        warn!("no directory configured");
        return Ok(Vec::new());
    };
    let files = list_workbooks(dir).with_context(|| format!("Failed to list workbooks in {}", dir.display()))?;
    Ok(files)
}

fn print_tally(tally: &Tally, list: bool) {
    println!("{}", tally.count());
    if list {
        for value in &tally.values {
            println!("  {value}");
        }
    }
    for failure in &tally.failures {
        eprintln!("skipped {failure}");
    }
}
