use chrono::NaiveDate;

/// This is the standard way of converting a date to a string in daybook.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
