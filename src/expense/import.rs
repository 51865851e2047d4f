use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::utils::time::iso_date;

use super::record::{ExpenseRecord, NewExpense, RecordKind};

/// A statement row keyed by the file's own header names. Exports from
/// different banks agree on almost nothing, so every lookup goes through a
/// candidate list.
pub type ParsedRow = HashMap<String, String>;

/// A broken file and a broken row inside an otherwise fine file surface
/// differently; neither is retried.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("can't read statement file: {0}")]
    File(#[source] csv::Error),
    #[error("malformed statement row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

const DESCRIPTION_HEADERS: [&str; 4] =
    ["Transaction Details", "Description", "Transaction", "Name"];
const AMOUNT_HEADERS: [&str; 3] = ["Amount", "Cost", "Value"];
const CATEGORY_HEADERS: [&str; 2] = ["Tags", "Category"];
const DATE_HEADER: &str = "Date";

const FALLBACK_DESCRIPTION: &str = "Imported Record";
const FALLBACK_CATEGORY: &str = "Other";

/// Reads a statement export into header-keyed rows. A row the reader cannot
/// parse aborts the rest of the file; rows already returned are unaffected.
pub fn read_statement(path: &Path) -> Result<Vec<ParsedRow>, ImportError> {
    let mut reader = csv::Reader::from_path(path).map_err(ImportError::File)?;
    let headers = reader.headers().map_err(ImportError::File)?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ImportError::Row {
            // headers occupy the first line
            row: index + 2,
            source,
        })?;
        let row: ParsedRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        if row.values().all(|value| value.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Normalizes statement rows into record candidates, deduplicated against the
/// already-persisted expenses and within the batch itself. Pure: persistence
/// of the candidates is the caller's step.
///
/// `today` fills in for rows without a date value.
pub fn import_rows(
    rows: &[ParsedRow],
    existing: &[ExpenseRecord],
    today: NaiveDate,
) -> Vec<NewExpense> {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|record| fingerprint(&record.date, record.amount, &record.description))
        .collect();

    let mut candidates = Vec::new();
    for row in rows {
        let description = first_non_empty(row, &DESCRIPTION_HEADERS)
            .unwrap_or(FALLBACK_DESCRIPTION)
            .to_string();

        let raw_amount = first_non_empty(row, &AMOUNT_HEADERS).unwrap_or("0");
        // An explicit plus is the one reliable income marker statement
        // exports share; everything else defaults to an expense.
        let mut kind = if raw_amount.contains('+') {
            RecordKind::Income
        } else {
            RecordKind::Expense
        };
        let amount = clean_amount(raw_amount);

        let mut category = first_non_empty(row, &CATEGORY_HEADERS)
            .map(strip_tag_marker)
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

        let lowered = category.to_lowercase();
        if lowered.contains("money received")
            || lowered.contains("salary")
            || lowered.contains("income")
        {
            kind = RecordKind::Income;
            if lowered.contains("money received") {
                category = "Income".to_string();
            }
        }

        let date = normalize_date(
            row.get(DATE_HEADER)
                .map(String::as_str)
                .filter(|value| !value.is_empty()),
            today,
        );

        if amount <= 0.0 {
            continue;
        }

        let fingerprint = fingerprint(&date, amount, &description);
        if seen.contains(&fingerprint) {
            debug!("Skipping already known row {fingerprint:?}");
            continue;
        }
        seen.insert(fingerprint);

        candidates.push(NewExpense {
            description,
            amount,
            category,
            kind,
            date,
            is_imported: true,
        });
    }

    candidates
}

/// Deduplication identity of a record: date, amount and description joined.
pub fn fingerprint(date: &str, amount: f64, description: &str) -> String {
    format!("{date}_{amount}_{description}")
}

fn first_non_empty<'a>(row: &'a ParsedRow, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|header| row.get(*header))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

fn strip_tag_marker(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).trim().to_string()
}

/// Sign notation varies wildly ("+2,000.00", "(45.20)", "CHF 12.30"), so the
/// amount is reduced to digits, dots and minus signs, parsed leniently, and
/// stored as an absolute value. Direction lives in the record kind alone.
fn clean_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_decimal_prefix(&cleaned).map(f64::abs).unwrap_or(0.0)
}

/// Longest leading decimal prefix: "12.34.56" reads as 12.34, trailing
/// garbage is ignored, no digits at all is no number.
fn parse_decimal_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Slash-dated values with exactly three parts are day/month/year; anything
/// that fails to form a real calendar date passes through untouched.
fn normalize_date(raw: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = raw else {
        return iso_date(today);
    };
    if !raw.contains('/') {
        return raw.to_string();
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return raw.to_string();
    }
    let (Ok(day), Ok(month), Ok(year)) = (
        parts[0].trim().parse::<u32>(),
        parts[1].trim().parse::<u32>(),
        parts[2].trim().parse::<i32>(),
    ) else {
        return raw.to_string();
    };
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => iso_date(date),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::expense::record::{ExpenseRecord, RecordKind};

    use super::{fingerprint, import_rows, read_statement, ImportError, ParsedRow};

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    fn row(pairs: &[(&str, &str)]) -> ParsedRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn stored(description: &str, amount: f64, date: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: "existing".into(),
            description: description.into(),
            amount,
            category: "Other".into(),
            kind: RecordKind::Expense,
            date: date.into(),
            is_imported: false,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn salary_row_normalizes_amount_kind_and_date() {
        let rows = vec![row(&[
            ("Amount", "+2000"),
            ("Tags", "#Salary"),
            ("Date", "01/03/2024"),
            ("Description", "Paycheck"),
        ])];
        let candidates = import_rows(&rows, &[], TODAY);

        assert_eq!(candidates.len(), 1);
        let record = &candidates[0];
        assert_eq!(record.amount, 2000.0);
        assert_eq!(record.kind, RecordKind::Income);
        // "salary" forces the kind but never renames the category
        assert_eq!(record.category, "Salary");
        assert_eq!(record.date, "2024-03-01");
        assert_eq!(record.description, "Paycheck");
        assert!(record.is_imported);
    }

    #[test]
    fn money_received_forces_kind_and_canonical_category() {
        let rows = vec![row(&[
            ("Amount", "150"),
            ("Tags", "#MONEY Received"),
            ("Date", "2024-03-02"),
            ("Description", "Transfer"),
        ])];
        let candidates = import_rows(&rows, &[], TODAY);

        assert_eq!(candidates[0].kind, RecordKind::Income);
        assert_eq!(candidates[0].category, "Income");
    }

    #[test]
    fn duplicate_rows_within_one_batch_collapse_to_one_record() {
        let duplicated = row(&[
            ("Amount", "45.20"),
            ("Date", "2024-03-03"),
            ("Description", "Groceries"),
        ]);
        let rows = vec![duplicated.clone(), duplicated];
        assert_eq!(import_rows(&rows, &[], TODAY).len(), 1);
    }

    #[test]
    fn rows_matching_persisted_expenses_are_dropped() {
        let rows = vec![row(&[
            ("Amount", "45.2"),
            ("Date", "2024-03-03"),
            ("Description", "Groceries"),
        ])];
        let existing = vec![stored("Groceries", 45.2, "2024-03-03")];
        assert!(import_rows(&rows, &existing, TODAY).is_empty());
    }

    #[test]
    fn unparseable_amounts_are_dropped_silently() {
        let rows = vec![
            row(&[("Amount", "abc"), ("Description", "junk")]),
            row(&[("Amount", "0.00"), ("Description", "zero")]),
            row(&[("Description", "no amount at all")]),
        ];
        assert!(import_rows(&rows, &[], TODAY).is_empty());
    }

    #[test]
    fn description_falls_back_through_headers_then_default() {
        let rows = vec![
            row(&[
                ("Amount", "5"),
                ("Transaction Details", "details win"),
                ("Description", "not used"),
            ]),
            row(&[("Amount", "6"), ("Name", "name only")]),
            row(&[("Amount", "7")]),
        ];
        let candidates = import_rows(&rows, &[], TODAY);
        assert_eq!(candidates[0].description, "details win");
        assert_eq!(candidates[1].description, "name only");
        assert_eq!(candidates[2].description, "Imported Record");
    }

    #[test]
    fn negative_and_decorated_amounts_store_non_negative() {
        let rows = vec![
            row(&[("Amount", "-45.20"), ("Description", "card payment")]),
            row(&[("Cost", "CHF 1,250.75"), ("Description", "rent")]),
        ];
        let candidates = import_rows(&rows, &[], TODAY);
        assert_eq!(candidates[0].amount, 45.2);
        assert_eq!(candidates[0].kind, RecordKind::Expense);
        // Thousands separator stripped, not mistaken for a decimal point
        assert_eq!(candidates[1].amount, 1250.75);
    }

    #[test]
    fn missing_date_defaults_to_today_and_odd_dates_pass_through() {
        let rows = vec![
            row(&[("Amount", "5"), ("Description", "undated")]),
            row(&[("Amount", "6"), ("Description", "iso"), ("Date", "2024-03-09")]),
            row(&[
                ("Amount", "7"),
                ("Description", "impossible"),
                ("Date", "13/13/2024"),
            ]),
            row(&[
                ("Amount", "8"),
                ("Description", "two parts"),
                ("Date", "03/2024"),
            ]),
        ];
        let candidates = import_rows(&rows, &[], TODAY);
        assert_eq!(candidates[0].date, "2024-06-15");
        assert_eq!(candidates[1].date, "2024-03-09");
        assert_eq!(candidates[2].date, "13/13/2024");
        assert_eq!(candidates[3].date, "03/2024");
    }

    #[test]
    fn category_marker_is_stripped_and_empty_tags_default() {
        let rows = vec![
            row(&[("Amount", "5"), ("Tags", "  #Eating Out  ")]),
            row(&[("Amount", "6"), ("Category", "Transport")]),
            row(&[("Amount", "7"), ("Tags", "   ")]),
        ];
        let candidates = import_rows(&rows, &[], TODAY);
        assert_eq!(candidates[0].category, "Eating Out");
        assert_eq!(candidates[1].category, "Transport");
        assert_eq!(candidates[2].category, "Other");
    }

    #[test]
    fn income_keyword_anywhere_in_the_tag_flips_the_kind() {
        let rows = vec![row(&[
            ("Amount", "90"),
            ("Tags", "Side Income"),
            ("Description", "tutoring"),
        ])];
        let candidates = import_rows(&rows, &[], TODAY);
        assert_eq!(candidates[0].kind, RecordKind::Income);
        assert_eq!(candidates[0].category, "Side Income");
    }

    #[test]
    fn fingerprints_format_amounts_the_way_documents_store_them() {
        assert_eq!(
            fingerprint("2024-03-01", 2000.0, "Paycheck"),
            "2024-03-01_2000_Paycheck"
        );
        assert_eq!(fingerprint("2024-03-01", 45.2, "x"), "2024-03-01_45.2_x");
    }

    #[test]
    fn read_statement_reads_headers_and_skips_blank_lines() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "Date,Amount,Description")?;
        writeln!(file, "2024-03-01,12.50,Coffee")?;
        writeln!(file, ",,")?;
        writeln!(file, "2024-03-02,+100,Refund")?;

        let rows = read_statement(file.path())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Amount").map(String::as_str), Some("12.50"));
        assert_eq!(rows[1].get("Description").map(String::as_str), Some("Refund"));
        Ok(())
    }

    #[test]
    fn read_statement_separates_file_errors_from_row_errors() -> Result<()> {
        let missing = read_statement(std::path::Path::new("/nonexistent/statement.csv"));
        assert!(matches!(missing, Err(ImportError::File(_))));

        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "Date,Amount")?;
        writeln!(file, "2024-03-01,5")?;
        writeln!(file, "2024-03-02,5,unexpected,extra")?;

        let result = read_statement(file.path());
        assert!(matches!(result, Err(ImportError::Row { row: 3, .. })));
        Ok(())
    }
}
