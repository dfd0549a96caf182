use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::AppError;
use crate::models::salary::{SalaryBounds, describe_salary, normalize_salary_text, salary_value};

pub const DESCRIPTION_NOT_SPECIFIED: &str = "Описание не указано";
pub const EMPLOYER_NOT_SPECIFIED: &str = "Работодатель не указан";

/// Characters of the description shown in a listing.
const LISTING_DESCRIPTION_CHARS: usize = 300;

/// One vacancy as presented to a reader.
///
/// Values are immutable: ordering and equality use only the number derived
/// from the salary text, so two different postings with the same pay are equal.
#[derive(Debug, Clone, Serialize)]
pub struct Vacancy {
    title: String,
    url: String,
    salary: String,
    description: String,
    employer: String,
    published_at: String,
    #[serde(skip)]
    salary_value: f64,
}

impl Vacancy {
    pub fn new(
        title: &str,
        url: &str,
        salary: &str,
        description: &str,
        employer: &str,
        published_at: &str,
    ) -> Result<Self, AppError> {
        let url = url.trim();
        if url.is_empty() {
            tracing::error!("Vacancy URL is required");
            return Err(AppError::Validation("URL is required".to_string()));
        }
        if !is_absolute_url(url) {
            tracing::error!("Vacancy URL is invalid: {url}");
            return Err(AppError::Validation(format!("URL is invalid: {url}")));
        }

        let salary = normalize_salary_text(salary);
        Ok(Vacancy {
            title: title.trim().to_string(),
            url: url.to_string(),
            salary_value: salary_value(&salary),
            salary,
            description: non_blank_or(description, DESCRIPTION_NOT_SPECIFIED),
            employer: non_blank_or(employer, EMPLOYER_NOT_SPECIFIED),
            published_at: published_at.trim().to_string(),
        })
    }

    /// Build from one item of the `/vacancies` search response.
    pub fn from_api_item(item: &Value) -> Result<Self, AppError> {
        fn text(v: Option<&Value>) -> &str {
            v.and_then(Value::as_str).unwrap_or("")
        }

        let salary = item.get("salary").filter(|s| s.is_object()).map(|s| {
            let bounds = SalaryBounds::from_api(Some(s));
            describe_salary(bounds.from, bounds.to, &bounds.currency)
        });

        let url = item
            .get("alternate_url")
            .and_then(|v| v.as_str())
            .filter(|u| !u.trim().is_empty())
            .or_else(|| item.get("url").and_then(|v| v.as_str()))
            .unwrap_or("");

        Vacancy::new(
            text(item.get("name")),
            url,
            salary.as_deref().unwrap_or(""),
            text(item.get("snippet").and_then(|s| s.get("requirement"))),
            text(item.get("employer").and_then(|e| e.get("name"))),
            text(item.get("published_at")),
        )
    }

    /// A copy of this vacancy with a different salary description.
    #[allow(dead_code)]
    pub fn with_salary(&self, salary: &str) -> Self {
        let salary = normalize_salary_text(salary);
        Vacancy {
            salary_value: salary_value(&salary),
            salary,
            ..self.clone()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn salary(&self) -> &str {
        &self.salary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn employer(&self) -> &str {
        &self.employer
    }

    pub fn published_at(&self) -> &str {
        &self.published_at
    }
}

impl PartialEq for Vacancy {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Vacancy {}

impl PartialOrd for Vacancy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vacancy {
    fn cmp(&self, other: &Self) -> Ordering {
        self.salary_value.total_cmp(&other.salary_value)
    }
}

impl fmt::Display for Vacancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) — {}", self.title, self.salary, self.url)
    }
}

/// Multi-line listing of vacancies in input order.
pub fn render_listing(vacancies: &[Vacancy]) -> String {
    let mut out = String::new();
    for (i, vacancy) in vacancies.iter().enumerate() {
        let description: String = vacancy
            .description()
            .chars()
            .take(LISTING_DESCRIPTION_CHARS)
            .collect();
        out.push_str(&format!("{}. {}\n", i + 1, vacancy.title()));
        out.push_str(&format!("Salary: {}\n", vacancy.salary()));
        out.push_str(&format!("Description: {description}...\n"));
        out.push_str(&format!("Employer: {}\n", vacancy.employer()));
        if !vacancy.published_at().is_empty() {
            out.push_str(&format!("Published: {}\n", vacancy.published_at()));
        }
        out.push_str(&format!("Link: {}\n", vacancy.url()));
        out.push_str(&"-".repeat(50));
        out.push('\n');
    }
    out
}

fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| url.has_host())
}

fn non_blank_or(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}
