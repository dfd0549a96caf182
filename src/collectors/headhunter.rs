use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::collectors::EmployerSource;
use crate::error::AppError;

/// The public API rejects requests without a User-Agent.
const USER_AGENT: &str = "vacancy-ingest/0.1 (employer-vacancy loader)";

/// Client for the hh.ru public API.
pub struct HeadHunter {
    client: reqwest::Client,
    base_url: String,
    area: String,
    per_page: u32,
}

impl HeadHunter {
    pub fn new(base_url: &str, area: &str, per_page: u32) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build HTTP client: {e}")))?;

        Ok(HeadHunter {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            area: area.to_string(),
            per_page,
        })
    }

    async fn get_json(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Value, AppError> {
        let resp = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{what} request failed: {e}")))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(AppError::NotFound(what.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(AppError::RateLimited),
            status if !status.is_success() => {
                return Err(AppError::Upstream(format!("{what} returned {status}")));
            }
            _ => {}
        }

        resp.json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse {what} response: {e}")))
    }
}

#[async_trait]
impl EmployerSource for HeadHunter {
    fn name(&self) -> &str {
        "hh.ru"
    }

    async fn fetch_employer(&self, employer_id: &str) -> Result<Value, AppError> {
        let url = format!("{}/employers/{employer_id}", self.base_url);
        let what = format!("employer {employer_id}");
        let data = self.get_json(self.client.get(&url), &what).await?;

        if !data.is_object() {
            return Err(AppError::Upstream(format!("{what}: expected a JSON object")));
        }
        Ok(data)
    }

    async fn fetch_vacancy_page(
        &self,
        employer_id: &str,
        page: u32,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/vacancies", self.base_url);
        let request = self.client.get(&url).query(&[
            ("employer_id", employer_id.to_string()),
            ("per_page", self.per_page.to_string()),
            ("area", self.area.clone()),
            ("page", page.to_string()),
        ]);
        let what = format!("vacancies of employer {employer_id}, page {page}");
        let data = self.get_json(request, &what).await?;

        parse_items(&data, &what)
    }
}

fn parse_items(data: &Value, what: &str) -> Result<Vec<Value>, AppError> {
    data.get("items")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or_else(|| AppError::Upstream(format!("Missing 'items' in {what} response")))
}
