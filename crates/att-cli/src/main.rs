use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use att_core::ScheduleBook;
use chrono::{FixedOffset, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::scan::ScanRequest;
use att_cli::commands::{export, import, register, report, scan, status, util, zones};
use att_cli::{Cli, Commands, Config, ZonesAction, load_schedule};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(att_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = att_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Load the zone schedule and venue offset named by `config`.
fn open_schedule(config: &Config) -> Result<(ScheduleBook, FixedOffset)> {
    let book = load_schedule(&config.schedule_path).with_context(|| {
        format!(
            "failed to load schedule from {}",
            config.schedule_path.display()
        )
    })?;
    for warning in book.validate() {
        tracing::warn!(%warning, "schedule configuration");
    }
    let tz = config
        .venue_offset()
        .context("invalid utc_offset in configuration")?;
    Ok((book, tz))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Import(args)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let inserted = import::run(io::stdin().lock(), args, &mut db)?;
            eprintln!("Imported {inserted} new scans");
        }
        Some(Commands::Register { badge, name }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            register::run(&mut stdout, &mut db, badge, name)?;
        }
        Some(Commands::Scan {
            badge,
            zone,
            action,
            at,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let (book, tz) = open_schedule(&config)?;
            let now = Utc::now();
            let at = match at {
                Some(at) => util::parse_datetime(at, now)?,
                None => now,
            };
            let request = ScanRequest {
                badge: badge.clone(),
                zone: zone.clone(),
                action: (*action).into(),
                at,
            };
            scan::run(&mut stdout, &mut db, &book, &tz, &request)?;
        }
        Some(Commands::Report { date, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let (book, tz) = open_schedule(&config)?;
            report::run(&mut stdout, &db, &book, &tz, Utc::now(), *date, *json)?;
        }
        Some(Commands::Export) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let (book, tz) = open_schedule(&config)?;
            let rows = export::run(&mut stdout, &db, &book, &tz, Utc::now())?;
            tracing::debug!(rows, "exported attendance rows");
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let (book, _tz) = open_schedule(&config)?;
            status::run(&mut stdout, &db, &config, &book)?;
        }
        Some(Commands::Zones(action)) => {
            let config = Config::load_from(cli.config.as_deref())
                .context("failed to load configuration")?;
            let (book, _tz) = open_schedule(&config)?;
            match action {
                ZonesAction::List => zones::list(&mut stdout, &book)?,
                ZonesAction::Check => {
                    let warnings = zones::check(&mut stdout, &book)?;
                    if warnings > 0 {
                        anyhow::bail!("schedule has {warnings} warning(s)");
                    }
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
