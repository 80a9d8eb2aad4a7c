//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// Default sheet range holding the practice log.
pub const DEFAULT_SHEET_RANGE: &str = "Log!A:F";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Spreadsheet ID from the sheet URL
    pub sheet_id: String,
    /// A1 range of the log tab
    pub sheet_range: String,
    /// Service account email
    pub service_email: Option<String>,
    /// Service account private key (PEM, `\n` possibly escaped)
    pub private_key: Option<String>,
    /// ARN of a secret holding the service account key JSON
    pub credentials_secret_arn: Option<String>,
    /// Shared secret required for writes
    pub practice_log_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            sheet_id: required("GOOGLE_SHEET_ID")?,
            sheet_range: env::var("SHEET_RANGE").unwrap_or_else(|_| DEFAULT_SHEET_RANGE.to_string()),
            service_email: env::var("GOOGLE_SERVICE_EMAIL").ok(),
            private_key: env::var("GOOGLE_PRIVATE_KEY").ok(),
            credentials_secret_arn: env::var("GOOGLE_CREDENTIALS_SECRET_ARN").ok(),
            practice_log_secret: required("PRACTICE_LOG_SECRET")?,
        })
    }
}

/// Spotify credentials for the now-playing endpoint.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl SpotifyConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            refresh_token: required("SPOTIFY_REFRESH_TOKEN")?,
        })
    }
}

/// Feed sources for the reading and watching endpoints.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub goodreads_user_id: String,
    pub letterboxd_user: String,
}

impl FeedConfig {
    pub fn from_env() -> Self {
        Self {
            goodreads_user_id: env::var("GOODREADS_USER_ID").unwrap_or_else(|_| "13258755".to_string()),
            letterboxd_user: env::var("LETTERBOXD_USER").unwrap_or_else(|_| "kallp".to_string()),
        }
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}
