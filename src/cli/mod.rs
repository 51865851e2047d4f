pub mod expenses;
pub mod grid;
pub mod report;

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    expense::summary::month_key,
    session::{Session, UserId},
    store::JsonDocumentStore,
    utils::{dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Daybook", version, long_about = None)]
#[command(about = "Personal time and expense tracking through a terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log in as a user. The profile is created on first login")]
    Login { name: String },
    #[command(about = "Clear the active session")]
    Logout,
    #[command(about = "Show the active user")]
    Whoami,
    #[command(
        about = "Fill hour slots of a day, e.g. `daybook log --day monday 9-10=work 10-11=work`"
    )]
    Log {
        #[command(flatten)]
        command: grid::LogCommand,
    },
    #[command(about = "Display the hour grid of a week")]
    Grid {
        #[command(flatten)]
        command: grid::GridCommand,
    },
    #[command(about = "Weekly or monthly time breakdown with insights")]
    Report {
        #[command(flatten)]
        command: report::ReportCommand,
    },
    #[command(subcommand, about = "Manage expense records")]
    Expenses(expenses::ExpensesCommand),
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    let session = Session::new(&app_dir);
    let store = JsonDocumentStore::new(&app_dir)?;

    match args.commands {
        Commands::Login { name } => {
            let user = UserId::new(&name)?;
            let profile = store.record_login(&user).await?;
            session.login(&user)?;
            if profile.created_at == profile.last_login {
                println!("Welcome, {user}! Profile created.");
            } else {
                println!("Welcome back, {user}.");
            }
            Ok(())
        }
        Commands::Logout => {
            session.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => {
            match session.current_user()? {
                Some(user) => println!("{user}"),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Commands::Log { command } => grid::process_log_command(command, &session, store).await,
        Commands::Grid { command } => grid::process_grid_command(command, &session, &store).await,
        Commands::Report { command } => {
            report::process_report_command(command, &session, &store).await
        }
        Commands::Expenses(command) => {
            expenses::process_expenses_command(command, &session, &store).await
        }
    }
}

/// Dates come in human form ("today", "last monday", "15/03/2025") and
/// default to now. Day/month/year order, as elsewhere in the stored data.
pub(crate) fn parse_when(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        None => Ok(Local::now().date_naive()),
        Some(value) => parse_date_string(value, Local::now(), Dialect::Uk)
            .map(|parsed| parsed.date_naive())
            .map_err(|e| anyhow!("can't interpret date {value:?}: {e}")),
    }
}

/// `--month` arguments are `YYYY-MM`, defaulting to the current month.
pub(crate) fn parse_month(value: Option<&str>) -> Result<String> {
    match value {
        None => Ok(month_key(Local::now().date_naive())),
        Some(value) => {
            NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
                .map_err(|e| anyhow!("can't interpret month {value:?}, expected YYYY-MM: {e}"))?;
            Ok(value.to_string())
        }
    }
}
