//! Error types for the dashboard Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the dashboard Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (malformed request input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong shared-secret credential
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Google Sheets read/write failure
    #[error("Sheets error: {0}")]
    Sheets(String),

    /// Third-party feed or API failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Auth(_) => 401,
            _ => 500,
        }
    }
}
