// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `ganji` command line.
//!
//! # Usage
//!
//! ```bash
//! # Build 1900..=2052 into data/jieqi_1900_2052.json, keeping valid years
//! ganji build
//!
//! # Rebuild a short range with four workers
//! ganji build --start-year 2020 --end-year 2030 --force --workers 4
//!
//! # Inspect a stored year
//! ganji terms --table data/jieqi_1900_2052.json --year 2024
//!
//! # Derive the Four Pillars of a birth moment (UTC+9)
//! ganji pillars --table data/jieqi_1900_2052.json --date 1990-05-17 --time 14:05
//! ```
//!
//! # Environment Variables
//!
//! - `JIEQI_START_YEAR`, `JIEQI_END_YEAR`, `JIEQI_STEP_HOURS`, `JIEQI_APPEND`,
//!   `JIEQI_FORCE`, `JIEQI_WORKERS`, `JIEQI_OUTPUT`: builder defaults, applied
//!   over `--config` and under explicit flags
//! - `RUST_LOG`: log filter directives, e.g. `ganji=debug` (default: info).
//!   Logs go to stderr so JSON output on stdout stays clean

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ganji::{
    BirthMoment, BuilderConfig, DayBoundary, EngineConfig, FourPillarsEngine, JieqiTableStore,
    JobTracker, Vsop87Sun, MonthBoundary, YearTermTableBuilder,
};

#[derive(Parser)]
#[command(name = "ganji", version, about = "Solar-term tables and Four Pillars")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build per-year solar-term tables into a JSON store
    Build {
        /// TOML file with builder settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// First year to build
        #[arg(long)]
        start_year: Option<i32>,
        /// Last year to build (inclusive)
        #[arg(long)]
        end_year: Option<i32>,
        /// Coarse sampling step in hours
        #[arg(long)]
        step_hours: Option<f64>,
        /// Start from an empty table instead of appending to the existing one
        #[arg(long)]
        overwrite: bool,
        /// Rebuild years that are already present and valid
        #[arg(long)]
        force: bool,
        /// Worker threads
        #[arg(long)]
        workers: Option<usize>,
        /// Output JSON path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the stored terms of one year as JSON
    Terms {
        /// Path to the JSON table
        #[arg(long)]
        table: PathBuf,
        /// Calendar year
        #[arg(long)]
        year: i32,
    },
    /// Derive the Four Pillars of a local (UTC+9) birth moment
    Pillars {
        /// Path to the JSON table
        #[arg(long)]
        table: PathBuf,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Birth time (HH:MM); omit when unknown
        #[arg(long)]
        time: Option<String>,
        /// Month boundary: exact or midnight
        #[arg(long, default_value = "exact")]
        month_boundary: MonthBoundary,
        /// Day boundary: midnight or rat-hour
        #[arg(long, default_value = "midnight")]
        day_boundary: DayBoundary,
    },
}

/// `RUST_LOG` directives, or `info` when unset or unparsable.
fn log_filter<E>(from_env: Result<EnvFilter, E>) -> EnvFilter {
    from_env.unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(log_filter(EnvFilter::try_from_default_env()))
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            config,
            start_year,
            end_year,
            step_hours,
            overwrite,
            force,
            workers,
            output,
        } => {
            let mut settings = match config {
                Some(path) => BuilderConfig::from_toml_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => BuilderConfig::default(),
            };
            settings.apply_lookup(|var| env::var(var).ok())?;
            if let Some(v) = start_year {
                settings.start_year = v;
            }
            if let Some(v) = end_year {
                settings.end_year = v;
            }
            if let Some(v) = step_hours {
                settings.step_hours = v;
            }
            if let Some(v) = workers {
                settings.workers = v;
            }
            if let Some(v) = output {
                settings.output = v;
            }
            settings.append &= !overwrite;
            settings.force_rebuild |= force;
            settings.validate()?;
            run_build(&settings)
        }
        Commands::Terms { table, year } => {
            let store = JieqiTableStore::open(&table)?;
            let Some(terms) = store.get(year) else {
                match store.rejected().get(&year) {
                    Some(why) => bail!("year {year} in {} is invalid: {why}", table.display()),
                    None => bail!("year {year} is not in {}", table.display()),
                }
            };
            println!("{}", serde_json::to_string_pretty(terms.terms())?);
            Ok(())
        }
        Commands::Pillars {
            table,
            date,
            time,
            month_boundary,
            day_boundary,
        } => {
            let store = JieqiTableStore::open(&table)?;
            let birth = BirthMoment::parse(&date, time.as_deref())?;
            let engine = FourPillarsEngine::new(EngineConfig {
                month_boundary,
                day_boundary,
            });
            let pillars = engine.derive_from_store(&store, &birth)?;
            println!("{}", serde_json::to_string_pretty(&pillars)?);
            Ok(())
        }
    }
}

fn run_build(settings: &BuilderConfig) -> anyhow::Result<()> {
    info!(
        output = %settings.output.display(),
        start = settings.start_year,
        end = settings.end_year,
        append = settings.append,
        step_hours = settings.step_hours,
        "starting table build"
    );

    let mut store = if settings.append {
        JieqiTableStore::open(&settings.output)?
    } else {
        JieqiTableStore::new(&settings.output)
    };
    let builder = YearTermTableBuilder::new(Vsop87Sun::default(), settings.build_options())?;
    let tracker = JobTracker::new();
    let report = builder.run(settings.years(), &mut store, &tracker)?;

    info!(
        built = report.built.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "build finished"
    );
    if !report.is_ok() {
        bail!("{} years failed: {:?}", report.failed.len(), report.bad_years());
    }
    Ok(())
}
