//! hh.ru applier CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use applier::{
    error::Result,
    models::{BlacklistSet, Config, SearchMode},
    pipeline,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::{Parser, Subcommand};

/// applier - bulk hh.ru applications with Notion bookkeeping
#[derive(Parser, Debug)]
#[command(
    name = "applier",
    version,
    about = "Applies to hh.ru vacancies and mirrors them into Notion"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply to every eligible vacancy of a listing
    Apply {
        /// Number of concurrent workers (default: apply.workers)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Walk the listing without applying
        #[arg(short, long)]
        test: bool,

        /// Listing to walk
        #[arg(short, long, value_enum, default_value_t = SearchMode::Similar)]
        search: SearchMode,
    },

    /// Apply to the first vacancy of a listing
    ApplyOne {
        #[arg(short, long, value_enum, default_value_t = SearchMode::Similar)]
        search: SearchMode,
    },

    /// Record existing applications in Notion
    Import {
        #[arg(short, long)]
        workers: Option<usize>,

        /// Log without recording
        #[arg(short, long)]
        test: bool,

        /// Skip applications created before this date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<FixedOffset>>,
    },

    /// Mark rejected applications as Unsuccessful in Notion
    Rejections {
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Withdraw applications marked Wrong and archive their pages
    Remove {
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Copy a negotiation's messages into its Notion page
    Messages {
        /// Negotiation id
        #[arg(long)]
        id: String,
    },

    /// Validate configuration and blacklist files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_since(raw: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset());
    }
    DateTime::parse_from_rfc3339(raw).map_err(|e| format!("invalid date '{raw}': {e}"))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    let default_workers = config.apply.workers;

    match cli.command {
        Command::Apply {
            workers,
            test,
            search,
        } => {
            let report =
                pipeline::run_apply(&config, search, workers.unwrap_or(default_workers), test)
                    .await?;
            if report.halted {
                log::warn!("Daily application limit reached");
            }
        }

        Command::ApplyOne { search } => match pipeline::run_apply_one(&config, search).await? {
            Some(outcome) => log::info!("Outcome: {:?}", outcome),
            None => log::warn!("Nothing to apply to"),
        },

        Command::Import {
            workers,
            test,
            since,
        } => {
            pipeline::run_import(&config, workers.unwrap_or(default_workers), since, test).await?;
        }

        Command::Rejections { workers } => {
            pipeline::run_rejections(&config, workers.unwrap_or(default_workers)).await?;
        }

        Command::Remove { workers } => {
            pipeline::run_remove(&config, workers.unwrap_or(default_workers)).await?;
        }

        Command::Messages { id } => {
            pipeline::run_messages(&config, &id).await?;
        }

        Command::Validate => {
            log::info!("✓ Config OK");

            let blacklist = BlacklistSet::load(&config.apply)?;
            log::info!(
                "✓ Blacklist OK ({} words, {} ids)",
                blacklist.words.len(),
                blacklist.ids.len()
            );

            let letter = config.apply.load_cover_letter()?;
            log::info!("✓ Cover letter OK ({} chars)", letter.chars().count());

            if config.notion.is_enabled() {
                log::info!("✓ Notion enabled");
            } else {
                log::info!("Notion disabled");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
