use std::fmt::Display;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Direction of an expense record. Amounts are stored non-negative; this is
/// the only carrier of sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Expense,
    Income,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Expense => write!(f, "expense"),
            RecordKind::Income => write!(f, "income"),
        }
    }
}

/// A stored expense document. Field names follow the persisted document
/// shape, which predates this implementation.
///
/// `date` is normally an ISO `YYYY-MM-DD` string, but an import value that
/// could not be interpreted as a date passes through unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub date: String,
    #[serde(default)]
    pub is_imported: bool,
    pub created_at: DateTime<Utc>,
}

/// A record candidate before the store assigns an id and creation stamp.
/// Produced by manual entry and by the statement importer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub kind: RecordKind,
    pub date: String,
    pub is_imported: bool,
}

/// Well-known categories keep their fixed palette entry.
const CATEGORY_COLORS: [(&str, &str); 5] = [
    ("Travel", "#5D35B1"),
    ("Food", "#38A169"),
    ("Work", "#B794F4"),
    ("Personal", "#ECC94B"),
    ("Other", "#A0AEC0"),
];

/// Display color for an expense category: palette entry when known, else a
/// stable hash of the name folded into a hex RGB color. Display-only, never
/// an input to aggregation.
pub fn category_color(name: &str) -> String {
    if let Some((_, color)) = CATEGORY_COLORS.iter().find(|(known, _)| *known == name) {
        return (*color).to_string();
    }

    // Signed 32-bit accumulation over UTF-16 units, matching how the stored
    // documents were colored historically.
    let mut hash: i32 = 0;
    for code in name.encode_utf16() {
        hash = (code as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    let hex = format!("{:X}", hash & 0x00FF_FFFF);
    format!("#{hex:0>6}")
}

/// Same color, split into channels for ANSI rendering.
pub fn category_rgb(name: &str) -> (u8, u8, u8) {
    let color = category_color(name);
    let parse = |range| u8::from_str_radix(&color[range], 16).unwrap_or(0);
    (parse(1..3), parse(3..5), parse(5..7))
}
