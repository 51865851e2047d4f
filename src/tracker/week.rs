use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::time::iso_date;

use super::category::Category;

/// Fixed day labels used as keys inside a [WeekLog].
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const HOURS_PER_DAY: u32 = 24;

/// Key of one of the 24 fixed hour buckets of a day, e.g. "9-10".
pub fn hour_slot_key(hour: u32) -> String {
    format!("{}-{}", hour, hour + 1)
}

/// A single logged hour. Older documents store the bare category label, newer
/// ones a record with a free-text description. Both shapes round-trip through
/// serde unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HourEntry {
    Logged {
        category: String,
        #[serde(default)]
        description: String,
    },
    Legacy(String),
}

impl HourEntry {
    pub fn new(category: Category, description: impl Into<String>) -> Self {
        HourEntry::Logged {
            category: category.to_string(),
            description: description.into(),
        }
    }

    /// The stored label, whichever shape carries it.
    pub fn category_label(&self) -> &str {
        match self {
            HourEntry::Logged { category, .. } => category,
            HourEntry::Legacy(category) => category,
        }
    }

    /// Canonical category of this entry, if it counts as logged at all.
    pub fn category(&self) -> Option<Category> {
        Category::resolve(self.category_label())
    }

    pub fn description(&self) -> &str {
        match self {
            HourEntry::Logged { description, .. } => description,
            HourEntry::Legacy(_) => "",
        }
    }
}

/// Hour-slot key to entry for a single day.
pub type DayLog = HashMap<String, HourEntry>;

/// One week of hourly logs, keyed by day name. Created empty when nothing is
/// stored for a week key, mutated cell by cell, and always replaced wholesale
/// on reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekLog(HashMap<String, DayLog>);

impl WeekLog {
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|day| day.is_empty())
    }

    pub fn day(&self, name: &str) -> Option<&DayLog> {
        self.0.get(name)
    }

    pub fn days(&self) -> impl Iterator<Item = (&String, &DayLog)> {
        self.0.iter()
    }

    pub fn set_entry(&mut self, day: &str, slot: &str, entry: HourEntry) {
        self.0
            .entry(day.to_string())
            .or_default()
            .insert(slot.to_string(), entry);
    }

    /// Clearing the last slot of a day drops the day map entirely, so an
    /// edited-then-cleared week serializes the same as an untouched one.
    pub fn clear_entry(&mut self, day: &str, slot: &str) {
        if let Some(entries) = self.0.get_mut(day) {
            entries.remove(slot);
            if entries.is_empty() {
                self.0.remove(day);
            }
        }
    }
}

/// Monday starting the week that contains `date`, normalized backward.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Storage partition key for a week: the ISO date of its Monday.
pub fn week_key(date: NaiveDate) -> String {
    iso_date(week_start(date))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{hour_slot_key, week_key, week_start, HourEntry, WeekLog};
    use crate::tracker::category::Category;

    #[test]
    fn week_key_normalizes_backward_to_monday() {
        // 2024-03-06 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(week_key(wednesday), "2024-03-04");

        // A Sunday belongs to the week of the previous Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(week_key(sunday), "2024-03-04");

        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn hour_slot_keys_match_stored_shape() {
        assert_eq!(hour_slot_key(0), "0-1");
        assert_eq!(hour_slot_key(9), "9-10");
        assert_eq!(hour_slot_key(23), "23-24");
    }

    #[test]
    fn hour_entry_round_trips_both_shapes() {
        let legacy: HourEntry = serde_json::from_str("\"Sleep\"").unwrap();
        assert_eq!(legacy, HourEntry::Legacy("Sleep".into()));
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"Sleep\"");

        let logged: HourEntry =
            serde_json::from_str(r#"{"category":"Work","description":"standup"}"#).unwrap();
        assert_eq!(logged.category(), Some(Category::Work));
        assert_eq!(logged.description(), "standup");
        let json = serde_json::to_string(&logged).unwrap();
        assert!(json.contains("\"category\":\"Work\""));
    }

    #[test]
    fn clearing_last_slot_drops_the_day() {
        let mut week = WeekLog::default();
        week.set_entry("Monday", "9-10", HourEntry::new(Category::Work, ""));
        assert!(!week.is_empty());

        week.clear_entry("Monday", "9-10");
        assert!(week.is_empty());
        assert!(week.day("Monday").is_none());
    }
}
