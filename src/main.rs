//! # survey-seed CLI
//!
//! ## Usage
//!
//! ```bash
//! survey-seed --config ./config/survey.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `survey-seed init` | Create the SQLite database and tables |
//! | `survey-seed seed` | Reconcile the markdown directory with stored surveys |
//! | `survey-seed list` | List surveys (active only unless `--all`) |
//! | `survey-seed get <id>` | Print one survey as JSON |
//! | `survey-seed responses <id>` | Print the responses to one survey version |
//! | `survey-seed responses --all` | Page through responses to every survey, newest first |
//! | `survey-seed respond <file>` | Submit a response from a JSON file |
//! | `survey-seed parse <file>` | Parse one markdown file and print the section |
//!
//! Logs go to stderr and honour `RUST_LOG`; command output goes to stdout.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use survey_seed::{config, get, migrate, parse, respond, seed};

/// survey-seed: markdown surveys, versioned in SQLite.
///
/// All commands except `parse` read a TOML configuration file given by
/// `--config`.
#[derive(Parser)]
#[command(
    name = "survey-seed",
    about = "Keep a survey database in step with a directory of markdown survey files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/survey.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Reconcile the survey directory with the stored surveys.
    ///
    /// New files create surveys, edited files supersede them, deleted
    /// files deactivate them. Unchanged files cause no writes.
    Seed {
        /// Directory to scan instead of `[seed] dir` from the config.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Show what would change without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// List surveys, newest first.
    List {
        /// Include inactive (superseded or deleted) survey versions.
        #[arg(long)]
        all: bool,
    },

    /// Print a survey by id as JSON.
    Get {
        /// Survey UUID.
        id: String,
    },

    /// Print the responses to one survey version, or with `--all` a page
    /// of responses across every survey, newest first.
    Responses {
        /// Survey UUID.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// List responses to all surveys.
        #[arg(long)]
        all: bool,

        /// Page number (1-based), with `--all`.
        #[arg(long, default_value_t = 1, requires = "all", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Responses per page, with `--all`.
        #[arg(long, default_value_t = 10, requires = "all", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },

    /// Submit a response read from a JSON file.
    Respond {
        /// Path to the response JSON.
        file: PathBuf,
    },

    /// Parse one markdown file and print the resulting section as JSON.
    Parse {
        /// Path to a markdown survey file.
        file: PathBuf,
    },
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Parse { file } = &cli.command {
        init_tracing("warn");
        return parse::run_parse(file);
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.logging.filter);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { dir, dry_run } => {
            let report = seed::run_seed(&cfg, dir.as_deref(), dry_run).await?;
            let shown = dir.unwrap_or_else(|| cfg.seed.dir.clone());
            seed::print_report(&shown, &report);
            if report.failed() > 0 {
                bail!("{} survey unit(s) failed", report.failed());
            }
        }
        Commands::List { all } => {
            get::run_list(&cfg, all).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Responses {
            id,
            all,
            page,
            limit,
        } => match id {
            Some(id) if !all => get::run_responses(&cfg, &id).await?,
            _ => get::run_all_responses(&cfg, page as usize, limit as usize).await?,
        },
        Commands::Respond { file } => {
            respond::run_respond(&cfg, &file).await?;
        }
        Commands::Parse { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
