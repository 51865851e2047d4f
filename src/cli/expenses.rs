use std::path::PathBuf;

use ansi_term::Colour;
use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Subcommand;
use futures::future::try_join_all;
use tracing::info;

use crate::{
    expense::{
        import::{import_rows, read_statement},
        record::{category_rgb, ExpenseRecord, NewExpense, RecordKind},
        summary::{in_month, summarize_month},
    },
    session::Session,
    store::{ExpenseStore, JsonDocumentStore},
    utils::time::iso_date,
};

use super::{parse_month, parse_when};

#[derive(Debug, Subcommand)]
pub enum ExpensesCommand {
    #[command(about = "Record a single expense or income")]
    Add {
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "Food")]
        category: String,
        #[arg(long, value_enum, default_value_t = RecordKind::Expense)]
        kind: RecordKind,
        #[arg(long, help = "Date of the record, e.g. \"today\", \"15/03/2025\"")]
        date: Option<String>,
    },
    #[command(about = "List records, newest first")]
    List {
        #[arg(long, help = "Month to list, as YYYY-MM. Defaults to the current month")]
        month: Option<String>,
        #[arg(long, help = "List every stored record instead of one month")]
        all: bool,
    },
    #[command(about = "Delete a record by id")]
    Delete { id: String },
    #[command(about = "Import a CSV statement export, skipping records already stored")]
    Import { file: PathBuf },
    #[command(about = "Monthly totals, trend, budget usage and category breakdown")]
    Summary {
        #[arg(long, help = "Month to summarize, as YYYY-MM. Defaults to the current month")]
        month: Option<String>,
    },
    #[command(about = "Set the monthly budget")]
    Budget { amount: f64 },
}

pub async fn process_expenses_command(
    command: ExpensesCommand,
    session: &Session,
    store: &JsonDocumentStore,
) -> Result<()> {
    let user = session.require_user()?;

    match command {
        ExpensesCommand::Add {
            description,
            amount,
            category,
            kind,
            date,
        } => {
            if amount <= 0.0 {
                return Err(anyhow!("amount must be positive, direction comes from --kind"));
            }
            let date = iso_date(parse_when(date.as_deref())?);
            let record = store
                .add_expense(
                    &user,
                    NewExpense {
                        description,
                        amount,
                        category,
                        kind,
                        date,
                        is_imported: false,
                    },
                )
                .await?;
            println!(
                "Recorded {} {:.2} on {} ({})",
                record.kind, record.amount, record.date, record.id
            );
            Ok(())
        }
        ExpensesCommand::List { month, all } => {
            let expenses = store.list_expenses(&user).await?;
            if all {
                print_records(expenses.iter());
            } else {
                let month = parse_month(month.as_deref())?;
                println!("Records for {month}:");
                print_records(in_month(&expenses, &month));
            }
            Ok(())
        }
        ExpensesCommand::Delete { id } => {
            store.delete_expense(&user, &id).await?;
            println!("Deleted {id}.");
            Ok(())
        }
        ExpensesCommand::Import { file } => {
            let rows = read_statement(&file)?;
            let existing = store.list_expenses(&user).await?;
            let candidates = import_rows(&rows, &existing, Local::now().date_naive());

            if candidates.is_empty() {
                println!("Nothing new to import ({} rows scanned).", rows.len());
                return Ok(());
            }

            let accepted = candidates.len();
            info!("Importing {accepted} of {} statement rows", rows.len());

            // All writes go out together; one failure fails the batch and
            // skips the reload, so stale state is never presented as fresh.
            try_join_all(
                candidates
                    .into_iter()
                    .map(|candidate| store.add_expense(&user, candidate)),
            )
            .await?;
            let refreshed = store.list_expenses(&user).await?;

            println!(
                "Imported {accepted} record(s) from {} rows; {} now stored.",
                rows.len(),
                refreshed.len()
            );
            Ok(())
        }
        ExpensesCommand::Summary { month } => {
            let month = parse_month(month.as_deref())?;
            let expenses = store.list_expenses(&user).await?;
            let budget = store.monthly_budget(&user).await?;
            let summary = summarize_month(&expenses, &month, budget);

            println!("Expenses for {month} ({user})");
            println!(
                "Spent {:.2} ({}), received {:.2}",
                summary.total_spend,
                summary.trend.describe(),
                summary.total_income
            );
            println!(
                "Budget {:.2}: {:.2} remaining, {}% used",
                summary.budget.budget, summary.budget.remaining, summary.budget.used_percentage
            );
            for share in &summary.categories {
                let (r, g, b) = category_rgb(&share.name);
                println!(
                    "  {} {:>10.2}  {:>3}%",
                    Colour::RGB(r, g, b).paint(format!("{:<14}", share.name)),
                    share.amount,
                    share.percentage
                );
            }
            Ok(())
        }
        ExpensesCommand::Budget { amount } => {
            if amount <= 0.0 {
                return Err(anyhow!("budget must be positive"));
            }
            store.set_monthly_budget(&user, amount).await?;
            println!("Monthly budget set to {amount:.2}.");
            Ok(())
        }
    }
}

fn print_records<'a>(records: impl Iterator<Item = &'a ExpenseRecord>) {
    let mut any = false;
    for record in records {
        any = true;
        let (r, g, b) = category_rgb(&record.category);
        let sign = match record.kind {
            RecordKind::Income => "+",
            RecordKind::Expense => "-",
        };
        println!(
            "{}  {sign}{:>9.2}  {}  {}  {}",
            record.date,
            record.amount,
            Colour::RGB(r, g, b).paint(format!("{:<14}", record.category)),
            record.description,
            record.id
        );
    }
    if !any {
        println!("No records.");
    }
}
