//! `timetable` CLI: inspect, diff and edit timetable grids stored as JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Rendered weeks of the dataset's period
//! timetable weeks -i dataset.json
//!
//! # Grid of schedule 1 with conflict flags and legends
//! timetable grid --schedule 1 -i dataset.json
//!
//! # Teacher double-bookings across every schedule
//! timetable conflicts -i dataset.json
//!
//! # Batch turning the stored slots of schedule 1 into a working list
//! timetable diff --schedule 1 --working working.json -i dataset.json
//!
//! # Drag slot 2024-03-04#1 onto 2024-03-05#2 and write the saved dataset
//! timetable edit --schedule 1 --drop 2024-03-04#1=2024-03-05#2 --save -i dataset.json -o out.json
//!
//! # Narrower grids and verbose logging
//! timetable -vv --config grid.toml grid --schedule 1 -i dataset.json
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read};
use timetable_engine::legend::{activity_legend, subject_legend, SubjectLegendEntry};
use timetable_engine::model::{Activity, PositionKey};
use timetable_engine::persist::open_grid;
use timetable_engine::repository::Catalog;
use timetable_engine::wire::{self, Dataset};
use timetable_engine::{
    render_grid, save, DragOutcome, GridSettings, MemoryRepository, RenderedGrid, ScheduleId,
    SlotIndex, SlotSet, TimeSlot, TimetableRepository,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "timetable",
    version,
    about = "Inspect and reconcile academic timetable grids"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Grid settings file (TOML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered teaching weeks of the period
    Weeks {
        /// Dataset file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Render one schedule's grid as JSON
    Grid {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        /// Schedule to render
        #[arg(long)]
        schedule: u64,
    },
    /// List teachers booked twice into the same date and slot
    Conflicts {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Reconcile a schedule's stored slots against a working slot list
    Diff {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        schedule: u64,
        /// JSON array of the schedule's working slots
        #[arg(long)]
        working: String,
    },
    /// Apply drag gestures to a schedule and print or save the result
    Edit {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        schedule: u64,
        /// Drag gesture SRC=DST, cells written YYYY-MM-DD#N (repeatable)
        #[arg(long = "drop", value_name = "SRC=DST")]
        drops: Vec<String>,
        /// Remove the slot at a cell, applied after the drops (repeatable)
        #[arg(long = "clear", value_name = "CELL")]
        clears: Vec<String>,
        /// Persist the edits and write the updated dataset instead of the batch
        #[arg(long)]
        save: bool,
    },
}

#[derive(Serialize)]
struct GridReport<'a> {
    grid: &'a RenderedGrid,
    subject_legend: Vec<SubjectLegendEntry>,
    activity_legend: Vec<Activity>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    debug!(?settings, "grid settings");

    match cli.command {
        Commands::Weeks { input, output } => {
            let dataset = read_dataset(input.as_deref())?;
            let mut text = String::new();
            for week in dataset.period.weeks() {
                text.push_str(&format!(
                    "Week {:>2}  {} .. {}\n",
                    week.number, week.start, week.end
                ));
            }
            write_output(output.as_deref(), &text)?;
        }
        Commands::Grid {
            input,
            output,
            schedule,
        } => {
            let dataset = read_dataset(input.as_deref())?;
            let repo = MemoryRepository::with_data([dataset.period.clone()], dataset.slots.clone());
            let store = open_grid(&repo, ScheduleId(schedule), dataset.period.id, settings)
                .context("Failed to open schedule grid")?;
            let index = SlotIndex::new(repo.all_slots()?);
            let grid = render_grid(&store, &index);
            let catalog = catalog_of(&dataset);

            let report = GridReport {
                grid: &grid,
                subject_legend: subject_legend(store.working(), &catalog),
                activity_legend: activity_legend(store.working(), &catalog),
            };
            info!(
                schedule,
                width = grid.width,
                conflicted = grid.conflicted_count(),
                "rendered grid"
            );
            write_output(output.as_deref(), &to_pretty_json(&report)?)?;
        }
        Commands::Conflicts { input, output } => {
            let dataset = read_dataset(input.as_deref())?;
            let conflicts = SlotIndex::new(dataset.slots).conflicts();
            info!(count = conflicts.len(), "teacher conflicts found");
            write_output(output.as_deref(), &to_pretty_json(&conflicts)?)?;
        }
        Commands::Diff {
            input,
            output,
            schedule,
            working,
        } => {
            let dataset = read_dataset(input.as_deref())?;
            let working_json = read_input(Some(&working))?;
            let working_slots =
                wire::parse_slots(&working_json).context("Failed to parse working slots")?;

            let schedule = ScheduleId(schedule);
            let committed = schedule_slots(dataset.slots, schedule);
            let working = schedule_slots(working_slots, schedule);
            let batch = timetable_engine::reconcile(&committed, &working);
            write_output(output.as_deref(), &to_pretty_json(&batch)?)?;
        }
        Commands::Edit {
            input,
            output,
            schedule,
            drops,
            clears,
            save: persist,
        } => {
            let dataset = read_dataset(input.as_deref())?;
            let schedule = ScheduleId(schedule);
            let mut repo =
                MemoryRepository::with_data([dataset.period.clone()], dataset.slots.clone());
            let mut store = open_grid(&repo, schedule, dataset.period.id, settings)
                .context("Failed to open schedule grid")?;
            store.begin_edit();

            for gesture in &drops {
                let ((src_date, src_slot), (dst_date, dst_slot)) = parse_drop(gesture)?;
                let source = PositionKey::new(src_date, src_slot, schedule);
                let outcome = store.mutate_at(source, dst_date, dst_slot);
                report_drop(gesture, outcome);
            }
            for cell in &clears {
                let (date, slot_number) = parse_cell(cell)?;
                let outcome = store.clear(date, slot_number);
                eprintln!("clear {}: {:?}", cell, outcome);
            }

            if persist {
                let report = save(&mut store, &mut repo).context("Failed to save edits")?;
                eprintln!(
                    "saved: {} deleted, {} created, {} updated",
                    report.deleted, report.created, report.updated
                );
                let updated = Dataset {
                    slots: repo.all_slots()?,
                    ..dataset
                };
                write_output(output.as_deref(), &to_pretty_json(&updated)?)?;
            } else {
                write_output(output.as_deref(), &to_pretty_json(&store.pending_batch())?)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_settings(path: Option<&str>) -> Result<GridSettings> {
    match path {
        Some(path) => GridSettings::from_file(path)
            .with_context(|| format!("Failed to load grid settings: {}", path)),
        None => Ok(GridSettings::default()),
    }
}

fn read_dataset(path: Option<&str>) -> Result<Dataset> {
    let json = read_input(path)?;
    wire::parse_dataset(&json).context("Failed to parse dataset JSON")
}

fn catalog_of(dataset: &Dataset) -> Catalog {
    Catalog::new(
        dataset.subjects.clone(),
        dataset.teachers.clone(),
        dataset.activities.clone(),
    )
}

fn schedule_slots(slots: Vec<TimeSlot>, schedule: ScheduleId) -> SlotSet {
    slots
        .into_iter()
        .filter(|slot| slot.schedule_id == schedule)
        .collect()
}

fn report_drop(gesture: &str, outcome: DragOutcome) {
    match outcome {
        DragOutcome::Swapped => eprintln!("drop {}: swapped", gesture),
        DragOutcome::Moved => eprintln!("drop {}: moved", gesture),
        DragOutcome::Rejected(reason) => eprintln!("drop {}: rejected ({:?})", gesture, reason),
    }
}

/// Parse `YYYY-MM-DD#N=YYYY-MM-DD#N`.
fn parse_drop(raw: &str) -> Result<((NaiveDate, u8), (NaiveDate, u8))> {
    let Some((source, target)) = raw.split_once('=') else {
        bail!("Invalid drop '{}': expected SRC=DST", raw);
    };
    Ok((parse_cell(source)?, parse_cell(target)?))
}

/// Parse a cell written `YYYY-MM-DD#N`.
fn parse_cell(raw: &str) -> Result<(NaiveDate, u8)> {
    let Some((date, slot_number)) = raw.trim().split_once('#') else {
        bail!("Invalid cell '{}': expected YYYY-MM-DD#N", raw);
    };
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date in cell '{}'", raw))?;
    let slot_number = slot_number
        .parse::<u8>()
        .with_context(|| format!("Invalid slot number in cell '{}'", raw))?;
    Ok((date, slot_number))
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
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
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
