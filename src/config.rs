use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use sqlx::postgres::PgConnectOptions;

use crate::error::AppError;

/// Employers loaded by `rebuild` when no ids are given on the command line.
pub const DEFAULT_EMPLOYER_IDS: [&str; 11] = [
    "32575",    // Metran
    "68587",    // Alabuga SEZ
    "700330",   // Tekhnodar
    "9870126",  // Chelyabinsk non-standard equipment plant
    "2969784",  // Digital Partners Global
    "560984",   // Chebarkul poultry
    "6163006",  // Computer Technology and Design Academy
    "67788",    // Chelyabinsk forge-and-press plant
    "11918231", // SITR
    "1035394",  // Krasnoe & Beloe
    "2180",     // Ozon
];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "vacancy-ingest",
    about = "Load hh.ru employers and vacancies into PostgreSQL and report on them"
)]
pub struct Config {
    /// Key-value file with PostgreSQL connection settings
    #[arg(long, env = "SETTINGS_FILE", default_value = "database.env", global = true)]
    pub settings: PathBuf,

    /// Name of the database that holds employers and vacancies
    #[arg(long, env = "DATABASE_NAME", default_value = "hh_ru", global = true)]
    pub database: String,

    /// Base URL of the vacancy API
    #[arg(long, env = "HH_API_BASE", default_value = "https://api.hh.ru", global = true)]
    pub api_base: String,

    /// Region filter applied to vacancy search (104 = Chelyabinsk)
    #[arg(long, env = "HH_AREA", default_value = "104", global = true)]
    pub area: String,

    /// Vacancies requested per page
    #[arg(long, env = "HH_PER_PAGE", default_value = "100", global = true)]
    pub per_page: u32,

    /// Maximum pages fetched per employer
    #[arg(long, env = "HH_MAX_PAGES", default_value = "20", global = true)]
    pub max_pages: u32,

    /// Employer ids to load, comma separated
    #[arg(long, env = "EMPLOYER_IDS", value_delimiter = ',', global = true)]
    pub employer_ids: Vec<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive menu (default when no subcommand given)
    Menu,
    /// Drop and recreate the database, then load every employer
    Rebuild,
    /// Companies with their vacancy counts
    Companies,
    /// Every stored vacancy
    Vacancies,
    /// Average salary over all vacancies
    AvgSalary,
    /// Vacancies paid above the average
    AboveAverage,
    /// Vacancies whose title contains any of the keywords
    Search {
        /// Keywords, comma separated
        keywords: String,
    },
    /// Fetch one employer's vacancies live and list them by salary
    Preview {
        #[arg(long)]
        employer: String,

        /// Show only the best paid N vacancies
        #[arg(long)]
        top: Option<usize>,
    },
}

impl Config {
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }

    pub fn resolved_employer_ids(&self) -> Vec<String> {
        if self.employer_ids.is_empty() {
            DEFAULT_EMPLOYER_IDS.iter().map(|id| id.to_string()).collect()
        } else {
            self.employer_ids.clone()
        }
    }
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
}

impl DbSettings {
    /// Read settings from a key-value file (`host=...`, `user=...`).
    ///
    /// Keys are case-insensitive and may carry a `PG` prefix. A missing file
    /// or a missing `host`/`user` key is an error.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            AppError::Config(format!("cannot read settings file {}: {e}", path.display()))
        })?;

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                AppError::Config(format!("malformed settings file {}: {e}", path.display()))
            })?;
            values.insert(normalize_key(&key), value);
        }

        Self::from_map(&values, path)
    }

    fn from_map(values: &HashMap<String, String>, path: &Path) -> Result<Self, AppError> {
        let required = |key: &str| {
            values
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string())
                .ok_or_else(|| {
                    AppError::Config(format!("'{key}' is not set in {}", path.display()))
                })
        };

        let port = match values.get("port") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("invalid port '{raw}'")))?,
            None => 5432,
        };

        Ok(DbSettings {
            host: required("host")?,
            port,
            user: required("user")?,
            password: values.get("password").cloned(),
        })
    }

    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_ascii_lowercase();
    match key.strip_prefix("pg") {
        Some(rest) if matches!(rest, "host" | "port" | "user" | "password") => rest.to_string(),
        _ => key,
    }
}
