use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};

use crate::collectors::CollectedEmployer;
use crate::config::DbSettings;
use crate::error::AppError;
use crate::models::employer::NewEmployer;
use crate::models::vacancy_row::NewVacancy;

/// Database used to drop and create the target database.
const MAINTENANCE_DB: &str = "postgres";

const CREATE_EMPLOYERS: &str = "CREATE TABLE employers (
    employer_id SERIAL PRIMARY KEY,
    employer_name VARCHAR(255) NOT NULL,
    site_url TEXT,
    vacancies_url TEXT,
    description TEXT,
    area_name VARCHAR(255)
)";

const CREATE_VACANCIES: &str = "CREATE TABLE vacancies (
    vacancy_id SERIAL PRIMARY KEY,
    employer_id INT NOT NULL REFERENCES employers (employer_id),
    vacancy_name VARCHAR(255) NOT NULL,
    url TEXT,
    salary_from VARCHAR(30),
    salary_to VARCHAR(30),
    salary_avg DOUBLE PRECISION NOT NULL DEFAULT 0,
    currency VARCHAR(5),
    description TEXT,
    published_at DATE
)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveSummary {
    pub employers: usize,
    pub vacancies: usize,
    pub skipped: usize,
}

pub async fn connect(settings: &DbSettings, database: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(settings.connect_options(database))
        .await?;
    Ok(pool)
}

/// Connect to a database that `recreate_database` built earlier.
pub async fn open_existing(settings: &DbSettings, database: &str) -> Result<PgPool, AppError> {
    if !database_exists(settings, database).await? {
        return Err(AppError::DatabaseMissing(database.to_string()));
    }
    connect(settings, database).await
}

pub async fn database_exists(settings: &DbSettings, database: &str) -> Result<bool, AppError> {
    let mut conn = PgConnection::connect_with(&settings.connect_options(MAINTENANCE_DB)).await?;
    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(database)
        .fetch_optional(&mut conn)
        .await?;
    conn.close().await?;
    Ok(exists.is_some())
}

/// Drop `database` with everything in it and create it again with empty tables.
pub async fn recreate_database(settings: &DbSettings, database: &str) -> Result<(), AppError> {
    let ident = quote_ident(database)?;
    let mut conn = PgConnection::connect_with(&settings.connect_options(MAINTENANCE_DB)).await?;

    let terminated: Vec<(bool,)> = sqlx::query_as(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(database)
    .fetch_all(&mut conn)
    .await?;
    if !terminated.is_empty() {
        tracing::warn!("Terminated {} connections to '{database}'", terminated.len());
    }

    // DROP/CREATE DATABASE cannot run inside a transaction block.
    sqlx::raw_sql(&format!("DROP DATABASE IF EXISTS {ident}"))
        .execute(&mut conn)
        .await?;
    sqlx::raw_sql(&format!("CREATE DATABASE {ident}"))
        .execute(&mut conn)
        .await?;
    conn.close().await?;
    tracing::info!("Database '{database}' recreated");

    let mut conn = PgConnection::connect_with(&settings.connect_options(database)).await?;
    sqlx::raw_sql(CREATE_EMPLOYERS).execute(&mut conn).await?;
    sqlx::raw_sql(CREATE_VACANCIES).execute(&mut conn).await?;
    conn.close().await?;
    tracing::info!("Tables 'employers' and 'vacancies' created in '{database}'");

    Ok(())
}

/// Insert all employers and vacancies in one transaction.
/// Any failure rolls back the whole batch.
pub async fn save_dataset(pool: &PgPool, data: &[CollectedEmployer]) -> Result<SaveSummary, AppError> {
    let mut tx = pool.begin().await?;

    match insert_all(&mut *tx, data).await {
        Ok(summary) => {
            tx.commit().await?;
            tracing::info!(
                "Saved {} employers and {} vacancies ({} skipped)",
                summary.employers,
                summary.vacancies,
                summary.skipped
            );
            Ok(summary)
        }
        Err(e) => {
            tracing::error!("Saving dataset failed, rolling back: {e}");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

async fn insert_all(conn: &mut PgConnection, data: &[CollectedEmployer]) -> Result<SaveSummary, AppError> {
    let mut summary = SaveSummary::default();

    for collected in data {
        let employer = NewEmployer::from_api(&collected.employer);
        let employer_id = employer.insert(&mut *conn).await?;
        summary.employers += 1;

        for item in &collected.vacancies {
            let Some(vacancy) = NewVacancy::from_api(item) else {
                tracing::warn!(
                    "Skipping untitled vacancy of employer {}",
                    collected.employer_id
                );
                summary.skipped += 1;
                continue;
            };
            vacancy.insert(&mut *conn, employer_id).await?;
            summary.vacancies += 1;
        }
    }

    Ok(summary)
}

/// Quote a database name for DDL; names are restricted to plain identifiers.
fn quote_ident(name: &str) -> Result<String, AppError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(AppError::Config(format!("invalid database name '{name}'")));
    }
    Ok(format!("\"{name}\""))
}
