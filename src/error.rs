#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("429 Too Many Requests")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database '{0}' does not exist")]
    DatabaseMissing(String),
}

impl AppError {
    /// True when the error means the reporting database was never built.
    pub fn needs_setup(&self) -> bool {
        match self {
            AppError::DatabaseMissing(_) => true,
            AppError::Database(sqlx::Error::Database(db_err)) => {
                // invalid_catalog_name, undefined_table
                matches!(db_err.code().as_deref(), Some("3D000") | Some("42P01"))
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(format!("HTTP request failed: {e}"))
    }
}
