//! `rooms` CLI: month grids, recurrence expansion, availability views, and
//! booking submission against a JSON snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Sunday-first grid for March 2025, as JSON or as text
//! rooms grid --year 2025 --month 3
//! rooms grid --year 2025 --month 3 --text
//!
//! # Expand a recurrence rule (JSON on stdin) from an anchor date
//! echo '{"kind":"monthly","mode":"by_ordinal_weekday","repeat_count":4}' \
//!   | rooms expand --anchor 2025-01-29
//!
//! # Availability for one requester, or for an administrator when omitted
//! rooms view -i snapshot.json --year 2025 --month 1 --requester alice
//!
//! # Submit a booking request against a snapshot
//! rooms book -i request.json --snapshot snapshot.json
//! ```
//!
//! Logs go to stderr; `-v` enables debug output, `RUST_LOG` overrides both.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use booking_engine::wire::decode_snapshot;
use booking_engine::{
    assemble_month, build_month_grid, expand_recurrence, merge_exclusion_feeds, Booking,
    BookingRequest, Composer, EngineConfig, ExclusionFeed, MemoryStore, MonthGrid, MonthRef,
    RecurrenceSpec, RequesterId, Viewer,
};
use chrono::{Datelike, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rooms", version, about = "Room availability and booking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the calendar grid of a month
    Grid {
        #[arg(long)]
        year: Option<i32>,
        /// Month number, 1-12
        #[arg(long)]
        month: Option<u32>,
        /// Render as a text calendar instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Expand a recurrence rule into candidate dates
    Expand {
        /// First date of the series (YYYY-MM-DD)
        #[arg(long)]
        anchor: NaiveDate,
        /// Rule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Show the availability of every slot in a month
    View {
        /// Snapshot JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Month number, 1-12
        #[arg(long)]
        month: Option<u32>,
        /// View as this requester instead of as an administrator
        #[arg(long)]
        requester: Option<String>,
    },
    /// Submit a single or recurring booking request
    Book {
        /// Request JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Snapshot of existing bookings and exclusions to book against
        #[arg(long)]
        snapshot: Option<String>,
    },
}

/// What `book` prints: the store's answer plus a one-line summary.
#[derive(Serialize)]
struct BookingSummary {
    outcome: booking_engine::BatchOutcome,
    message: String,
    inserted: Vec<NaiveDate>,
    conflicts: Vec<NaiveDate>,
    skipped_known: Vec<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Grid { year, month, text } => {
            let grid = build_month_grid(resolve_month(&config, year, month)?);
            if text {
                print!("{}", render_grid(&grid));
            } else {
                write_output(None, &serde_json::to_string_pretty(&grid)?)?;
            }
        }
        Commands::Expand { anchor, input } => {
            let rule = read_input(input.as_deref())?;
            let spec: RecurrenceSpec =
                serde_json::from_str(&rule).context("Failed to parse recurrence rule")?;
            spec.validate(config.max_repeat_count)?;
            let dates = expand_recurrence(anchor, &spec)?;
            write_output(None, &serde_json::to_string_pretty(&dates)?)?;
        }
        Commands::View {
            input,
            output,
            year,
            month,
            requester,
        } => {
            let month = resolve_month(&config, year, month)?;
            let (bookings, feeds) = load_snapshot(input.as_deref())?;
            let viewer = requester
                .map_or(Viewer::Administrator, |id| Viewer::Requester(RequesterId(id)));
            let view = assemble_month(month, &viewer, &feeds, &bookings);
            write_output(output.as_deref(), &serde_json::to_string_pretty(&view)?)?;
        }
        Commands::Book { input, snapshot } => {
            let raw = read_input(input.as_deref())?;
            let request: BookingRequest =
                serde_json::from_str(&raw).context("Failed to parse booking request")?;
            let (bookings, feeds) = match snapshot.as_deref() {
                Some(path) => load_snapshot(Some(path))?,
                None => (Vec::new(), Vec::new()),
            };

            let store = MemoryStore::with_data(bookings.clone(), merge_exclusion_feeds(&feeds));
            let composer = Composer::new(store, config);
            let report = composer
                .submit(&request, &bookings)
                .await
                .context("Booking request failed")?;

            let summary = BookingSummary {
                outcome: report.outcome(),
                message: report.to_string(),
                inserted: report.inserted,
                conflicts: report.conflicts,
                skipped_known: report.skipped_known,
            };
            write_output(None, &serde_json::to_string_pretty(&summary)?)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Month from `--year`/`--month`, defaulting each to today in the configured zone.
fn resolve_month(config: &EngineConfig, year: Option<i32>, month: Option<u32>) -> Result<MonthRef> {
    let today = config.today()?;
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());
    let index = month
        .checked_sub(1)
        .with_context(|| format!("Month must be between 1 and 12, got {month}"))?;
    Ok(MonthRef::new(year, index)?)
}

fn load_snapshot(path: Option<&str>) -> Result<(Vec<Booking>, Vec<ExclusionFeed>)> {
    let json = read_input(path)?;
    decode_snapshot(&json).context("Failed to decode snapshot")
}

fn render_grid(grid: &MonthGrid) -> String {
    let mut out = format!("{:04}-{:02}\nSu Mo Tu We Th Fr Sa\n", grid.year, grid.month_index + 1);
    for week in &grid.weeks {
        let cells: Vec<String> = week
            .iter()
            .map(|cell| cell.map_or_else(|| "  ".to_string(), |d| format!("{d:>2}")))
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => {
            println!("{content}");
        }
    }
    Ok(())
}
