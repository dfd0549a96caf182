// Collector module.
// Defines the source trait and the runner that pages through it.

pub mod headhunter;
pub mod runner;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// An external API serving employers and their vacancies.
#[async_trait]
pub trait EmployerSource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Employer metadata as a JSON object.
    async fn fetch_employer(&self, employer_id: &str) -> Result<Value, AppError>;

    /// One page of the employer's vacancies; an empty page means no more data.
    async fn fetch_vacancy_page(&self, employer_id: &str, page: u32)
        -> Result<Vec<Value>, AppError>;
}

/// Raw employer data gathered from a source, ready for persistence.
#[derive(Debug, Clone)]
pub struct CollectedEmployer {
    pub employer_id: String,
    pub employer: Value,
    pub vacancies: Vec<Value>,
}
