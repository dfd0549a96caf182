use sqlx::PgPool;

use crate::collectors::headhunter::HeadHunter;
use crate::collectors::runner::{self, CollectOptions};
use crate::config::{Config, DbSettings};
use crate::db::{self, SaveSummary};
use crate::error::AppError;
use crate::models::vacancy::{Vacancy, render_listing};
use crate::reports;

pub const SETUP_HINT: &str = "Create the database first (menu item 1).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Companies,
    Vacancies,
    AvgSalary,
    AboveAverage,
    Search(Vec<String>),
}

fn source(config: &Config) -> Result<HeadHunter, AppError> {
    HeadHunter::new(&config.api_base, &config.area, config.per_page)
}

/// Fetch every configured employer, then replace the database contents.
pub async fn rebuild(config: &Config, settings: &DbSettings) -> Result<SaveSummary, AppError> {
    let employer_ids = config.resolved_employer_ids();
    tracing::info!("Collecting {} employers", employer_ids.len());

    let hh = source(config)?;
    let options = CollectOptions {
        max_pages: config.max_pages,
    };
    let data = runner::collect(&hh, &employer_ids, options).await;

    db::recreate_database(settings, &config.database).await?;
    let pool = db::connect(settings, &config.database).await?;
    let result = db::save_dataset(&pool, &data).await;
    pool.close().await;
    result
}

pub async fn report(config: &Config, settings: &DbSettings, report: &Report) -> Result<String, AppError> {
    let pool = db::open_existing(settings, &config.database).await?;
    let result = render_report(&pool, report).await;
    pool.close().await;
    result
}

async fn render_report(pool: &PgPool, report: &Report) -> Result<String, AppError> {
    let text = match report {
        Report::Companies => {
            let rows = reports::companies_with_vacancy_count(pool).await?;
            format!("Companies and their vacancy counts:\n{}", reports::render_numbered(&rows))
        }
        Report::Vacancies => {
            let rows = reports::all_vacancies(pool).await?;
            format!("All vacancies (company, title, salary, link):\n{}", reports::render_numbered(&rows))
        }
        Report::AvgSalary => match reports::average_salary(pool).await? {
            Some(avg) => format!("Average salary: {avg:.2}\n"),
            None => "Average salary: no data\n".to_string(),
        },
        Report::AboveAverage => {
            let rows = reports::vacancies_above_average(pool).await?;
            format!("Vacancies paid above average:\n{}", reports::render_numbered(&rows))
        }
        Report::Search(keywords) => {
            let rows = reports::vacancies_with_keywords(pool, keywords).await?;
            format!(
                "Vacancies matching {}:\n{}",
                keywords.join(", "),
                reports::render_numbered(&rows)
            )
        }
    };
    Ok(text)
}

/// One employer's live vacancies, best paid first.
pub async fn preview(config: &Config, employer_id: &str, top: Option<usize>) -> Result<String, AppError> {
    let hh = source(config)?;
    let options = CollectOptions {
        max_pages: config.max_pages,
    };
    let items = runner::collect_vacancies(&hh, employer_id, options).await;

    let mut vacancies = valid_vacancies(&items);
    vacancies.sort_by(|a, b| b.cmp(a));
    if let Some(top) = top {
        vacancies.truncate(top);
    }

    Ok(render_listing(&vacancies))
}

fn valid_vacancies(items: &[serde_json::Value]) -> Vec<Vacancy> {
    items
        .iter()
        .filter_map(|item| match Vacancy::from_api_item(item) {
            Ok(vacancy) => Some(vacancy),
            Err(e) => {
                tracing::warn!("Skipping vacancy: {e}");
                None
            }
        })
        .collect()
}

/// Text shown for a failed report.
pub fn describe_report_error(e: &AppError) -> String {
    if e.needs_setup() {
        SETUP_HINT.to_string()
    } else {
        format!("Report failed: {e}")
    }
}
