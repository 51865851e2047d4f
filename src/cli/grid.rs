use std::sync::Arc;

use ansi_term::Colour;
use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use crate::{
    session::Session,
    store::{JsonDocumentStore, WeekStore},
    tracker::{
        aggregate::{aggregate_day, aggregate_week, total_hours},
        autosave::{DebouncedSaver, WeekEdit, DEFAULT_QUIET_PERIOD},
        category::Category,
        week::{hour_slot_key, week_key, HourEntry, DAY_NAMES, HOURS_PER_DAY},
    },
    utils::clock::DefaultClock,
};

use super::parse_when;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    fn name(&self) -> &'static str {
        DAY_NAMES[*self as usize]
    }
}

/// One `SLOT=CATEGORY` argument. An empty or `none` value clears the slot.
#[derive(Debug, Clone)]
pub struct SlotEdit {
    slot: String,
    category: Option<Category>,
}

fn parse_slot_edit(value: &str) -> Result<SlotEdit, String> {
    let (slot, category) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=CATEGORY, got {value:?}"))?;
    let slot = validate_slot(slot)?;
    let category = if category.is_empty() || category.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(<Category as ValueEnum>::from_str(category, true)?)
    };
    Ok(SlotEdit { slot, category })
}

fn validate_slot(value: &str) -> Result<String, String> {
    let parsed = value
        .split_once('-')
        .and_then(|(start, end)| Some((start.parse::<u32>().ok()?, end.parse::<u32>().ok()?)));
    match parsed {
        Some((start, end)) if start < HOURS_PER_DAY && end == start + 1 => {
            Ok(hour_slot_key(start))
        }
        _ => Err(format!("{value:?} is not an hour slot like 9-10")),
    }
}

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(
        long,
        help = "Week to edit, e.g. \"today\", \"last monday\", \"15/03/2025\". Defaults to the current week"
    )]
    week: Option<String>,
    #[arg(long, help = "Day of the week to edit")]
    day: Day,
    #[arg(long, help = "Free-text note attached to each filled slot")]
    note: Option<String>,
    #[arg(
        value_parser = parse_slot_edit,
        required = true,
        help = "Slot edits like 9-10=work. An empty value (9-10=) clears the slot"
    )]
    edits: Vec<SlotEdit>,
}

#[derive(Debug, Parser)]
pub struct GridCommand {
    #[arg(
        long,
        help = "Week to show, e.g. \"today\", \"last monday\", \"15/03/2025\". Defaults to the current week"
    )]
    week: Option<String>,
}

/// Applies slot edits to a week's day. Every mutation streams through the
/// debounced saver, so a burst of edits lands in the store as one write.
pub async fn process_log_command(
    command: LogCommand,
    session: &Session,
    store: JsonDocumentStore,
) -> Result<()> {
    let user = session.require_user()?;
    let date = parse_when(command.week.as_deref())?;
    let week_key = week_key(date);
    let day_name = command.day.name();

    let store = Arc::new(store);
    let mut log = store.load_week(&user, &week_key).await?;

    let shutdown = CancellationToken::new();
    let (sender, saver) = DebouncedSaver::new(
        store.clone(),
        shutdown,
        Box::new(DefaultClock),
        DEFAULT_QUIET_PERIOD,
    );
    let saver = tokio::spawn(saver.run());

    let edited = command.edits.len();
    for edit in command.edits {
        match edit.category {
            Some(category) => log.set_entry(
                day_name,
                &edit.slot,
                HourEntry::new(category, command.note.clone().unwrap_or_default()),
            ),
            None => log.clear_entry(day_name, &edit.slot),
        }
        sender
            .send(WeekEdit {
                user: user.clone(),
                week_key: week_key.clone(),
                log: log.clone(),
            })
            .await?;
    }

    // Closing the channel flushes the latest snapshot before the task ends
    drop(sender);
    saver
        .await
        .map_err(|e| anyhow!("saver task failed: {e}"))??;

    println!("Updated {edited} slot(s) of {day_name}, week of {week_key}.");
    if let Some(day) = log.day(day_name) {
        let totals = aggregate_day(day);
        let summary: Vec<String> = Category::ALL
            .iter()
            .filter_map(|category| {
                totals
                    .get(category)
                    .map(|hours| format!("{category} {hours}h"))
            })
            .collect();
        if !summary.is_empty() {
            println!("{day_name} now holds: {}", summary.join(", "));
        }
    }
    Ok(())
}

const CELL_WIDTH: usize = 10;

/// Renders a week as a 24x7 grid of colored category labels.
pub async fn process_grid_command(
    command: GridCommand,
    session: &Session,
    store: &JsonDocumentStore,
) -> Result<()> {
    let user = session.require_user()?;
    let date = parse_when(command.week.as_deref())?;
    let week_key = week_key(date);
    let log = store.load_week(&user, &week_key).await?;

    println!("Week of {week_key} ({user})");

    print!("{:>6}", "");
    for day in DAY_NAMES {
        print!(" {:<CELL_WIDTH$}", &day[..3]);
    }
    println!();

    for hour in 0..HOURS_PER_DAY {
        let slot = hour_slot_key(hour);
        print!("{slot:>6}");
        for day in DAY_NAMES {
            let entry = log.day(day).and_then(|entries| entries.get(&slot));
            print!(" {}", render_cell(entry));
        }
        println!();
    }

    let totals = aggregate_week(&log);
    if totals.is_empty() {
        println!("Nothing logged this week.");
    } else {
        let breakdown: Vec<String> = Category::ALL
            .iter()
            .filter_map(|category| {
                totals.get(category).map(|hours| {
                    let (r, g, b) = category.rgb();
                    format!("{} {hours}h", Colour::RGB(r, g, b).paint(category.to_string()))
                })
            })
            .collect();
        println!("Logged {}h: {}", total_hours(&totals), breakdown.join(", "));
    }
    Ok(())
}

fn render_cell(entry: Option<&HourEntry>) -> String {
    match entry.and_then(HourEntry::category) {
        Some(category) => {
            let (r, g, b) = category.rgb();
            Colour::RGB(r, g, b)
                .paint(format!("{:<CELL_WIDTH$}", category.to_string()))
                .to_string()
        }
        None => format!("{:<CELL_WIDTH$}", "·"),
    }
}
