use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::salary::{SalaryBounds, format_amount};

/// Width of the `vacancy_name` column.
const NAME_MAX_CHARS: usize = 255;

/// Vacancy row built from one `/vacancies` search item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVacancy {
    pub name: String,
    pub url: Option<String>,
    pub salary_from: f64,
    pub salary_to: f64,
    pub salary_avg: f64,
    pub currency: String,
    pub description: Option<String>,
    pub published_at: Option<NaiveDate>,
}

impl NewVacancy {
    /// `None` when the item has no usable title. Longer titles are cut to the column width.
    pub fn from_api(item: &Value) -> Option<Self> {
        let name: String = item
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .chars()
            .take(NAME_MAX_CHARS)
            .collect();

        let url = ["alternate_url", "url"]
            .iter()
            .filter_map(|key| item.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|u| !u.is_empty())
            .map(String::from);

        let bounds = SalaryBounds::from_api(item.get("salary"));

        let description = item
            .get("snippet")
            .and_then(|s| s.get("requirement"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Some(NewVacancy {
            name,
            url,
            salary_from: bounds.lower(),
            salary_to: bounds.upper(),
            salary_avg: bounds.average(),
            currency: bounds.currency,
            description,
            published_at: published_date(item.get("published_at")),
        })
    }

    pub async fn insert(&self, conn: &mut PgConnection, employer_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO vacancies (employer_id, vacancy_name, url, salary_from, salary_to, salary_avg, currency, description, published_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(employer_id)
        .bind(&self.name)
        .bind(&self.url)
        .bind(format_amount(self.salary_from))
        .bind(format_amount(self.salary_to))
        .bind(self.salary_avg)
        .bind(&self.currency)
        .bind(&self.description)
        .bind(self.published_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// `published_at` is usually an ISO timestamp; some payloads wrap it as `{"date": ...}`.
fn published_date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = match value? {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("date")?.as_str()?,
        _ => return None,
    };
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
