use std::fmt;

use sqlx::PgPool;

use crate::error::AppError;

const LISTING_COLUMNS: &str = "SELECT e.employer_name, v.vacancy_name, \
    COALESCE(v.salary_from, '0') || ' - ' || COALESCE(v.salary_to, '0') || ' ' || COALESCE(v.currency, '') AS salary, \
    v.url \
    FROM vacancies v JOIN employers e USING (employer_id)";

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CompanyVacancyCount {
    pub employer_name: String,
    pub vacancy_count: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct VacancyListing {
    pub employer_name: String,
    pub vacancy_name: String,
    pub salary: String,
    pub url: Option<String>,
}

impl fmt::Display for CompanyVacancyCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' — {} vacancies", self.employer_name, self.vacancy_count)
    }
}

impl fmt::Display for VacancyListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': {}, salary: {}, link: {}",
            self.employer_name,
            self.vacancy_name,
            self.salary,
            self.url.as_deref().unwrap_or("-")
        )
    }
}

/// Numbered lines, one per row, followed by a separator.
pub fn render_numbered<T: fmt::Display>(rows: &[T]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!("{}. {row}\n", i + 1));
    }
    out.push_str(&"-".repeat(50));
    out.push('\n');
    out
}

pub async fn companies_with_vacancy_count(pool: &PgPool) -> Result<Vec<CompanyVacancyCount>, AppError> {
    let rows = sqlx::query_as::<_, CompanyVacancyCount>(
        "SELECT e.employer_name, COUNT(v.vacancy_id) AS vacancy_count
         FROM employers e LEFT JOIN vacancies v USING (employer_id)
         GROUP BY e.employer_id, e.employer_name
         ORDER BY e.employer_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn all_vacancies(pool: &PgPool) -> Result<Vec<VacancyListing>, AppError> {
    let rows = sqlx::query_as::<_, VacancyListing>(&format!("{LISTING_COLUMNS} ORDER BY v.vacancy_id"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Mean of the per-vacancy averages, rounded to cents. `None` when there are no vacancies.
pub async fn average_salary(pool: &PgPool) -> Result<Option<f64>, AppError> {
    let (avg,): (Option<f64>,) =
        sqlx::query_as("SELECT ROUND(AVG(salary_avg)::numeric, 2)::float8 FROM vacancies")
            .fetch_one(pool)
            .await?;
    Ok(avg)
}

/// Vacancies whose average salary exceeds the mean of all per-vacancy averages.
pub async fn vacancies_above_average(pool: &PgPool) -> Result<Vec<VacancyListing>, AppError> {
    let rows = sqlx::query_as::<_, VacancyListing>(&format!(
        "{LISTING_COLUMNS} WHERE v.salary_avg > (SELECT AVG(salary_avg) FROM vacancies) ORDER BY v.vacancy_id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Vacancies whose title contains any keyword, ignoring case.
pub async fn vacancies_with_keywords(
    pool: &PgPool,
    keywords: &[String],
) -> Result<Vec<VacancyListing>, AppError> {
    let patterns = like_patterns(keywords);
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, VacancyListing>(&format!(
        "{LISTING_COLUMNS} WHERE v.vacancy_name ILIKE ANY($1) ORDER BY v.vacancy_id"
    ))
    .bind(patterns)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `%keyword%` patterns with LIKE wildcards in the keyword escaped.
fn like_patterns(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            let escaped = k
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
        .collect()
}
