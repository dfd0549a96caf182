use serde_json::Value;
use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::vacancy::EMPLOYER_NOT_SPECIFIED;

/// Employer row built from a `/employers/{id}` response.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployer {
    pub name: String,
    pub site_url: Option<String>,
    pub vacancies_url: Option<String>,
    pub description: Option<String>,
    pub area_name: Option<String>,
}

impl NewEmployer {
    pub fn from_api(employer: &Value) -> Self {
        let text = |v: Option<&Value>| {
            v.and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        NewEmployer {
            name: text(employer.get("name")).unwrap_or_else(|| EMPLOYER_NOT_SPECIFIED.to_string()),
            site_url: text(employer.get("site_url")),
            vacancies_url: text(employer.get("vacancies_url")),
            description: text(employer.get("description")),
            area_name: text(employer.get("area").and_then(|a| a.get("name"))),
        }
    }

    /// Insert and return the generated `employer_id`.
    pub async fn insert(&self, conn: &mut PgConnection) -> Result<i32, AppError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO employers (employer_name, site_url, vacancies_url, description, area_name) VALUES ($1, $2, $3, $4, $5) RETURNING employer_id",
        )
        .bind(&self.name)
        .bind(&self.site_url)
        .bind(&self.vacancies_url)
        .bind(&self.description)
        .bind(&self.area_name)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }
}
