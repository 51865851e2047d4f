use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::record::{category_color, ExpenseRecord, RecordKind};

/// Spend movement relative to the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendTrend {
    NoHistory,
    Same,
    /// Percent more than last month
    More(u32),
    /// Percent less than last month
    Less(u32),
}

impl SpendTrend {
    pub fn describe(&self) -> String {
        match self {
            SpendTrend::NoHistory => "No previous data".to_string(),
            SpendTrend::Same => "Same as last month".to_string(),
            SpendTrend::More(pct) => format!("{pct}% more than last month"),
            SpendTrend::Less(pct) => format!("{pct}% less than last month"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUsage {
    pub budget: f64,
    pub remaining: f64,
    pub used_percentage: u32,
}

/// One category's slice of the month's spending, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub name: String,
    pub amount: f64,
    pub percentage: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub month: String,
    pub total_spend: f64,
    pub total_income: f64,
    pub trend: SpendTrend,
    pub budget: BudgetUsage,
    pub categories: Vec<CategoryShare>,
}

/// Month partition key, `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn previous_month(month: &str) -> Option<String> {
    let (year, month) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(if month == 1 {
        format!("{:04}-12", year - 1)
    } else {
        format!("{:04}-{:02}", year, month - 1)
    })
}

/// A record belongs to a month when its date string carries that `YYYY-MM`
/// prefix. Dates that passed through import unvalidated never match any
/// month filter.
pub fn in_month<'a>(
    expenses: &'a [ExpenseRecord],
    month: &'a str,
) -> impl Iterator<Item = &'a ExpenseRecord> {
    expenses
        .iter()
        .filter(move |record| record.date.get(0..7) == Some(month))
}

/// Derives the whole monthly dashboard: totals, trend against the previous
/// month, budget usage and the per-category breakdown.
pub fn summarize_month(
    expenses: &[ExpenseRecord],
    month: &str,
    monthly_budget: f64,
) -> MonthSummary {
    let spend_of = |month: &str| -> f64 {
        in_month(expenses, month)
            .filter(|record| record.kind != RecordKind::Income)
            .map(|record| record.amount)
            .sum()
    };

    let total_spend = spend_of(month);
    let total_income: f64 = in_month(expenses, month)
        .filter(|record| record.kind == RecordKind::Income)
        .map(|record| record.amount)
        .sum();

    let previous_spend = previous_month(month)
        .map(|previous| spend_of(&previous))
        .unwrap_or(0.0);

    let trend = if previous_spend > 0.0 {
        let pct = ((total_spend - previous_spend) / previous_spend * 100.0).round();
        if pct > 0.0 {
            SpendTrend::More(pct as u32)
        } else if pct < 0.0 {
            SpendTrend::Less(pct.abs() as u32)
        } else {
            SpendTrend::Same
        }
    } else if total_spend > 0.0 {
        SpendTrend::More(100)
    } else {
        SpendTrend::NoHistory
    };

    let budget = BudgetUsage {
        budget: monthly_budget,
        remaining: (monthly_budget - total_spend).max(0.0),
        used_percentage: if monthly_budget > 0.0 {
            ((total_spend / monthly_budget * 100.0).round() as u32).min(100)
        } else {
            0
        },
    };

    let mut by_category = HashMap::<&str, f64>::new();
    for record in in_month(expenses, month).filter(|r| r.kind != RecordKind::Income) {
        let name = if record.category.is_empty() {
            "Other"
        } else {
            record.category.as_str()
        };
        *by_category.entry(name).or_insert(0.0) += record.amount;
    }

    let mut categories: Vec<CategoryShare> = by_category
        .into_iter()
        .map(|(name, amount)| CategoryShare {
            percentage: if total_spend > 0.0 {
                (amount / total_spend * 100.0).round() as u32
            } else {
                0
            },
            color: category_color(name),
            name: name.to_string(),
            amount,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    MonthSummary {
        month: month.to_string(),
        total_spend,
        total_income,
        trend,
        budget,
        categories,
    }
}
