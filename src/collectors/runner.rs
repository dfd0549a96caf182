use crate::collectors::{CollectedEmployer, EmployerSource};
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Pages fetched per employer before giving up on the rest.
    pub max_pages: u32,
}

impl Default for CollectOptions {
    fn default() -> Self {
        CollectOptions { max_pages: 20 }
    }
}

/// Fetch every employer and its vacancies, one request at a time.
/// Employers that fail are logged and skipped; the rest are returned in input order.
pub async fn collect(
    source: &dyn EmployerSource,
    employer_ids: &[String],
    options: CollectOptions,
) -> Vec<CollectedEmployer> {
    let mut collected = Vec::with_capacity(employer_ids.len());

    for employer_id in employer_ids {
        let employer = match source.fetch_employer(employer_id).await {
            Ok(employer) => employer,
            Err(AppError::NotFound(_)) => {
                tracing::warn!("Employer {employer_id} not found on {}, skipping", source.name());
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to fetch employer {employer_id}: {e}");
                continue;
            }
        };

        let vacancies = collect_vacancies(source, employer_id, options).await;
        tracing::info!(
            "Employer {employer_id}: {} vacancies collected",
            vacancies.len()
        );

        collected.push(CollectedEmployer {
            employer_id: employer_id.clone(),
            employer,
            vacancies,
        });
    }

    collected
}

/// Page through one employer's vacancies. Errors end paging but keep what was fetched.
pub async fn collect_vacancies(
    source: &dyn EmployerSource,
    employer_id: &str,
    options: CollectOptions,
) -> Vec<serde_json::Value> {
    let mut vacancies = Vec::new();

    for page in 0..options.max_pages {
        match source.fetch_vacancy_page(employer_id, page).await {
            Ok(items) if items.is_empty() => break,
            Ok(items) => vacancies.extend(items),
            Err(AppError::RateLimited) => {
                tracing::warn!(
                    "Rate limited on page {page} for employer {employer_id}, keeping {} vacancies",
                    vacancies.len()
                );
                return vacancies;
            }
            Err(e) => {
                tracing::error!("Stopped paging employer {employer_id} at page {page}: {e}");
                return vacancies;
            }
        }
    }

    vacancies
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;

    enum Page {
        Items(usize),
        RateLimited,
        Broken,
    }

    /// Scripted source: pages missing from the script are empty.
    #[derive(Default)]
    struct FakeSource {
        employers: HashMap<String, Result<Value, fn() -> AppError>>,
        pages: HashMap<String, Vec<Page>>,
        requests: Mutex<Vec<(String, u32)>>,
    }

    impl FakeSource {
        fn employer(mut self, id: &str, pages: Vec<Page>) -> Self {
            self.employers
                .insert(id.to_string(), Ok(json!({"id": id, "name": format!("Employer {id}")})));
            self.pages.insert(id.to_string(), pages);
            self
        }

        fn failing_employer(mut self, id: &str, err: fn() -> AppError) -> Self {
            self.employers.insert(id.to_string(), Err(err));
            self
        }

        fn requested_pages(&self, id: &str) -> Vec<u32> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(e, _)| e == id)
                .map(|(_, p)| *p)
                .collect()
        }
    }

    #[async_trait]
    impl EmployerSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch_employer(&self, employer_id: &str) -> Result<Value, AppError> {
            match self.employers.get(employer_id) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(err)) => Err(err()),
                None => Err(AppError::NotFound(employer_id.to_string())),
            }
        }

        async fn fetch_vacancy_page(
            &self,
            employer_id: &str,
            page: u32,
        ) -> Result<Vec<Value>, AppError> {
            self.requests
                .lock()
                .unwrap()
                .push((employer_id.to_string(), page));

            let script = self.pages.get(employer_id);
            match script.and_then(|pages| pages.get(page as usize)) {
                Some(Page::Items(n)) => Ok((0..*n)
                    .map(|i| json!({"name": format!("{employer_id}-{page}-{i}")}))
                    .collect()),
                Some(Page::RateLimited) => Err(AppError::RateLimited),
                Some(Page::Broken) => Err(AppError::Upstream("Missing 'items'".into())),
                None => Ok(Vec::new()),
            }
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn stops_after_first_empty_page() {
        let source = FakeSource::default().employer("1", vec![Page::Items(100), Page::Items(40)]);

        let result = collect(&source, &ids(&["1"]), CollectOptions::default()).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].vacancies.len(), 140);
        assert_eq!(source.requested_pages("1"), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stops_at_page_cap() {
        let pages = (0..30).map(|_| Page::Items(100)).collect();
        let source = FakeSource::default().employer("1", pages);

        let result = collect(&source, &ids(&["1"]), CollectOptions::default()).await;

        assert_eq!(result[0].vacancies.len(), 2000);
        assert_eq!(source.requested_pages("1"), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn rate_limit_keeps_earlier_pages() {
        let source = FakeSource::default().employer(
            "1",
            vec![
                Page::Items(100),
                Page::Items(100),
                Page::Items(100),
                Page::RateLimited,
                Page::Items(100),
            ],
        );

        let result = collect(&source, &ids(&["1"]), CollectOptions::default()).await;

        assert_eq!(result[0].vacancies.len(), 300);
        assert_eq!(result[0].vacancies[0]["name"], "1-0-0");
        assert_eq!(result[0].vacancies[299]["name"], "1-2-99");
        assert_eq!(source.requested_pages("1"), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn malformed_page_stops_paging() {
        let source = FakeSource::default().employer("1", vec![Page::Items(5), Page::Broken, Page::Items(5)]);

        let result = collect(&source, &ids(&["1"]), CollectOptions::default()).await;

        assert_eq!(result[0].vacancies.len(), 5);
        assert_eq!(source.requested_pages("1"), vec![0, 1]);
    }

    #[tokio::test]
    async fn failing_employers_are_skipped() {
        let source = FakeSource::default()
            .employer("1", vec![Page::Items(2)])
            .failing_employer("2", || AppError::Upstream("503".into()))
            .employer("3", vec![Page::Items(1)]);

        let result = collect(&source, &ids(&["1", "404", "2", "3"]), CollectOptions::default()).await;

        let collected: Vec<_> = result.iter().map(|c| c.employer_id.as_str()).collect();
        assert_eq!(collected, ["1", "3"]);
        assert!(source.requested_pages("2").is_empty());
        assert_eq!(result[0].employer["name"], "Employer 1");
    }

    #[tokio::test]
    async fn employer_without_vacancies_is_kept() {
        let source = FakeSource::default().employer("1", vec![]);

        let result = collect(&source, &ids(&["1"]), CollectOptions { max_pages: 5 }).await;

        assert_eq!(result.len(), 1);
        assert!(result[0].vacancies.is_empty());
    }
}
