use ansi_term::Colour;
use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};
use clap::Parser;
use futures::{stream, StreamExt, TryStreamExt};

use crate::{
    session::Session,
    store::{JsonDocumentStore, WeekStore},
    tracker::{
        aggregate::{aggregate_month, aggregate_week, total_hours, CategoryHours},
        category::Category,
        insights::{weekly_insights, Severity},
        week::{week_key, week_start, WeekLog},
    },
};

use super::{parse_month, parse_when};

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long,
        conflicts_with = "month",
        help = "Week to report on, e.g. \"today\", \"last monday\". Defaults to the current week"
    )]
    week: Option<String>,
    #[arg(long, help = "Month to report on instead, as YYYY-MM")]
    month: Option<String>,
}

/// Weekly reports show the category breakdown plus insights; monthly reports
/// fold every week touching the month into one breakdown.
pub async fn process_report_command(
    command: ReportCommand,
    session: &Session,
    store: &JsonDocumentStore,
) -> Result<()> {
    let user = session.require_user()?;

    if let Some(month) = command.month {
        let month = parse_month(Some(&month))?;
        let keys = month_week_keys(&month)?;

        // Week documents are independent, fetch a few at a time
        let weeks: Vec<WeekLog> = stream::iter(keys.iter())
            .map(|key| store.load_week(&user, key))
            .buffered(4)
            .try_collect()
            .await?;

        let totals = aggregate_month(weeks.iter());
        println!("Time report for {month}, {} weeks ({user})", keys.len());
        print_breakdown(&totals);
        return Ok(());
    }

    let date = parse_when(command.week.as_deref())?;
    let key = week_key(date);
    let log = store.load_week(&user, &key).await?;
    let totals = aggregate_week(&log);

    println!("Time report for the week of {key} ({user})");
    print_breakdown(&totals);

    println!();
    for insight in weekly_insights(&totals) {
        let color = match insight.severity {
            Severity::Good => Colour::Green,
            Severity::Warning => Colour::Red,
            Severity::Info => Colour::Cyan,
        };
        println!("{}: {}", color.paint(insight.title), insight.message);
    }
    Ok(())
}

/// Mondays of every week that overlaps the month.
fn month_week_keys(month: &str) -> Result<Vec<String>> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|e| anyhow!("can't interpret month {month:?}: {e}"))?;
    let last = match first.month() {
        12 => NaiveDate::from_ymd_opt(first.year() + 1, 1, 1),
        other => NaiveDate::from_ymd_opt(first.year(), other + 1, 1),
    }
    .expect("first of a month always exists")
        - Duration::days(1);

    let mut keys = Vec::new();
    let mut monday = week_start(first);
    while monday <= last {
        keys.push(crate::utils::time::iso_date(monday));
        monday += Duration::days(7);
    }
    Ok(keys)
}

fn print_breakdown(totals: &CategoryHours) {
    let total = total_hours(totals);
    for category in Category::ALL {
        let hours = totals.get(&category).copied().unwrap_or(0);
        let percent = if total > 0 {
            hours as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let (r, g, b) = category.rgb();
        println!(
            "{} {hours:>3}h  {percent:>5.1}% of tracked time",
            Colour::RGB(r, g, b).paint(format!("{category:<9}"))
        );
    }
    println!("Tracked {total}h in total.");
}

#[cfg(test)]
mod tests {
    use super::month_week_keys;

    #[test]
    fn month_weeks_cover_every_overlapping_monday() {
        // March 2024: the 1st is a Friday, its week starts Monday Feb 26
        let keys = month_week_keys("2024-03").unwrap();
        assert_eq!(keys.first().map(String::as_str), Some("2024-02-26"));
        assert_eq!(keys.last().map(String::as_str), Some("2024-03-25"));
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn december_rolls_into_the_next_year() {
        let keys = month_week_keys("2024-12").unwrap();
        assert_eq!(keys.last().map(String::as_str), Some("2024-12-30"));
        assert!(month_week_keys("2024-13").is_err());
    }
}
