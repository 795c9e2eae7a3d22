use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use roster::config::Config;
use roster::db::schema;
use roster::error::{RosterError, RosterResult};
use roster::model::{Id, MemberGroup};
use roster::ops::activity_ops;
use roster::queries::{member_queries, report_queries};

/// Operator tool for the roster database.
#[derive(Debug, Parser)]
#[command(name = "roster", version)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file path; overrides the configured one.
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database schema.
    Init,
    /// Generate missing instances for recurring activities.
    Repair,
    /// Print a report as JSON.
    Report {
        #[command(subcommand)]
        report: Report,
    },
}

#[derive(Debug, Subcommand)]
enum Report {
    /// Present/absent counts per member.
    Attendance {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        /// Restrict to one group, by name.
        #[arg(long)]
        group: Option<String>,
    },
    /// Present/absent counts per activity.
    Activities {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        group: Option<String>,
    },
    /// Active members with their group.
    Members {
        #[arg(long)]
        group: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = cli.file.clone().unwrap_or(config.database_path);
    match run(&db_path, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &Path, command: Command) -> RosterResult<()> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(db_path)?;
    schema::initialize(&conn)?;

    match command {
        Command::Init => {
            println!("Initialized {}", db_path.display());
            Ok(())
        }
        Command::Repair => print_json(&activity_ops::fix_recurring_activities(&conn)?),
        Command::Report { report } => match report {
            Report::Attendance { from, to, group } => {
                let group_id = resolve_group(&conn, group.as_deref())?;
                print_json(&report_queries::attendance_report(&conn, from, to, group_id)?)
            }
            Report::Activities { from, to, group } => {
                let group_id = resolve_group(&conn, group.as_deref())?;
                print_json(&report_queries::activities_report(&conn, from, to, group_id)?)
            }
            Report::Members { group } => {
                let group_id = resolve_group(&conn, group.as_deref())?;
                print_json(&report_queries::members_report(&conn, group_id)?)
            }
        },
    }
}

fn resolve_group(conn: &Connection, name: Option<&str>) -> RosterResult<Option<Id<MemberGroup>>> {
    match name {
        None => Ok(None),
        Some(n) => member_queries::find_group_by_name(conn, n)?
            .map(|g| Some(g.id))
            .ok_or_else(|| RosterError::not_found("MemberGroup", n)),
    }
}

fn print_json<T: Serialize>(value: &T) -> RosterResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
