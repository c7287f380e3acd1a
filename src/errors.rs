use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Unexpected API response {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Environment name '{name}' matches {count} environments")]
    AmbiguousEnvironment { name: String, count: usize },

    #[error("Invalid record from API: {0}")]
    InvalidRecord(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extraction(String),

    #[error("Local build failed: {0}")]
    Build(String),

    #[error("Database load failed: {0}")]
    DatabaseLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    /// Statuses worth another attempt on an idempotent request.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Api { status, .. } => *status >= 500,
            AppError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
