mod collectors;
mod commands;
mod config;
mod db;
mod error;
mod menu;
mod models;
mod reports;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Report;
use crate::config::{Command, Config, DbSettings};

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vacancy_ingest=info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_file.as_deref())?;

    let settings = || DbSettings::from_file(&config.settings);

    let report = match config.resolved_command() {
        Command::Menu => return menu::run(&config, &settings()?).await,
        Command::Rebuild => {
            let summary = commands::rebuild(&config, &settings()?).await?;
            println!(
                "Saved {} employers and {} vacancies",
                summary.employers, summary.vacancies
            );
            return Ok(());
        }
        Command::Preview { employer, top } => {
            print!("{}", commands::preview(&config, &employer, top).await?);
            return Ok(());
        }
        Command::Companies => Report::Companies,
        Command::Vacancies => Report::Vacancies,
        Command::AvgSalary => Report::AvgSalary,
        Command::AboveAverage => Report::AboveAverage,
        Command::Search { keywords } => Report::Search(menu::parse_keywords(&keywords)),
    };

    match commands::report(&config, &settings()?, &report).await {
        Ok(text) => print!("{text}"),
        Err(e) if e.needs_setup() => {
            eprintln!("{}", commands::describe_report_error(&e));
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
