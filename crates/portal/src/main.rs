mod config;
mod database;
mod seed;
mod utils;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use portal_migration::{IrreversiblePolicy, Ledger, MigrationError, MigrationStatus, Runner, Target};
use tracing::{error, info};

use crate::config::{Args, Command, Config, MigrateAction};
use crate::database::{database_connection, migration_connection, setup_database};
use crate::seed::Dataset;

/// `verify --strict` 发现不一致时的退出码
const INCONSISTENT_EXIT_CODE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = utils::init_logger(&config.log_level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(config, args.command).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(migration_err) = e.downcast_ref::<MigrationError>() {
                let completed = migration_err.completed();
                if !completed.is_empty() {
                    error!("失败前已完成: {}", completed.join(", "));
                }
            }
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, command: Command) -> Result<ExitCode> {
    let ledger = portal_migration::ledger().context("迁移台账无效")?;

    match command {
        Command::Migrate { action } => migrate(&config, &ledger, action).await,
        Command::Seed { file } => {
            let dataset = Dataset::load(file.as_deref())?;
            let connection = database_connection(&config.database_url).await?;
            let report = seed::seed(&connection, &ledger, &dataset).await?;
            println!(
                "seeded {} site(s), {} instrument(s), {} product(s)",
                report.sites, report.instruments, report.products
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Setup { file } => {
            let dataset = Dataset::load(file.as_deref())?;
            let connection = setup_database(&config.database_url, &ledger).await?;
            let report = seed::seed(&connection, &ledger, &dataset).await?;
            info!("数据库初始化完成");
            println!(
                "database is up to date, seeded {} site(s), {} instrument(s), {} product(s)",
                report.sites, report.instruments, report.products
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn migrate(config: &Config, ledger: &Ledger, action: MigrateAction) -> Result<ExitCode> {
    let connection = migration_connection(&config.database_url).await?;

    match action {
        MigrateAction::Up { to } => {
            let target = to.map(Target::Name).unwrap_or_default();
            let report = Runner::new(ledger).apply(&connection, target).await?;
            if report.applied.is_empty() {
                println!("nothing to apply");
            }
            for name in &report.applied {
                println!("applied  {name}");
            }
        }
        MigrateAction::Down {
            count,
            refuse_irreversible,
        } => {
            let policy = if refuse_irreversible {
                IrreversiblePolicy::Refuse
            } else {
                IrreversiblePolicy::Skip
            };
            let report = Runner::new(ledger)
                .irreversible_policy(policy)
                .revert(&connection, count)
                .await?;
            if report.reverted.is_empty() {
                println!("nothing to revert");
            }
            for name in &report.reverted {
                if report.irreversible.contains(name) {
                    println!("reverted {name} (irreversible, schema left unchanged)");
                } else {
                    println!("reverted {name}");
                }
            }
        }
        MigrateAction::Status { json } => {
            let statuses = Runner::new(ledger).status(&connection).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&statuses)?);
            } else {
                print_status(&statuses);
            }
        }
        MigrateAction::Verify { json, strict } => {
            let report = Runner::new(ledger).verify(&connection).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_consistent() {
                println!("migration store is consistent with the ledger");
            } else {
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
            }
            if strict && !report.is_consistent() {
                return Ok(ExitCode::from(INCONSISTENT_EXIT_CODE));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_status(statuses: &[MigrationStatus]) {
    let width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for status in statuses {
        let state = match (status.applied_at, status.in_ledger) {
            (Some(applied_at), true) => applied_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            (Some(_), false) => "applied, not in ledger".to_owned(),
            (None, _) => "pending".to_owned(),
        };
        let marker = if status.in_ledger && !status.reversible {
            "  (irreversible)"
        } else {
            ""
        };
        println!("{:<width$}  {}{}", status.name, state, marker, width = width);
    }
}
