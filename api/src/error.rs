use thiserror::Error;

/// Errors surfaced by the catalog, history and tester layers.
///
/// Dispatch failures (timeouts, refused connections, ...) are not errors:
/// they come back as `ExecutionResult::Failure`.
#[derive(Debug, Error)]
pub enum ApiHubError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
}

impl ApiHubError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiHubError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiHubError::NotFound(what.into())
    }
}

pub type Result<T, E = ApiHubError> = std::result::Result<T, E>;
