use std::collections::HashMap;

use super::{
    category::Category,
    week::{DayLog, WeekLog},
};

/// Hour counts per canonical category. Labels from the previous schema
/// version are already folded in, so consumers never re-add legacy keys.
pub type CategoryHours = HashMap<Category, u32>;

/// Counts one unit per hour slot whose entry resolves to a category. Unset
/// slots and labels outside the category set contribute nothing.
pub fn aggregate_day(day: &DayLog) -> CategoryHours {
    let mut totals = CategoryHours::new();
    accumulate_day(&mut totals, day);
    totals
}

/// Same fold as [aggregate_day], applied across every day of the week.
pub fn aggregate_week(week: &WeekLog) -> CategoryHours {
    let mut totals = CategoryHours::new();
    for (_, day) in week.days() {
        accumulate_day(&mut totals, day);
    }
    totals
}

/// Month totals are week totals summed. The fold is commutative over counts,
/// so the order of the weeks does not affect the result.
pub fn aggregate_month<'a>(weeks: impl IntoIterator<Item = &'a WeekLog>) -> CategoryHours {
    let mut totals = CategoryHours::new();
    for week in weeks {
        for (_, day) in week.days() {
            accumulate_day(&mut totals, day);
        }
    }
    totals
}

pub fn total_hours(totals: &CategoryHours) -> u32 {
    totals.values().sum()
}

fn accumulate_day(totals: &mut CategoryHours, day: &DayLog) {
    for entry in day.values() {
        if let Some(category) = entry.category() {
            *totals.entry(category).or_insert(0) += 1;
        }
    }
}
