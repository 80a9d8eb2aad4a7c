//! Shared library for the dashboard Lambda functions.
//!
//! This crate provides the practice-log model and statistics, the Google Sheets
//! and Spotify clients, feed parsing, and HTTP helpers used by every endpoint.

pub mod auth;
pub mod config;
pub mod error;
pub mod feeds;
pub mod http;
pub mod models;
pub mod secrets;
pub mod sheets;
pub mod spotify;
pub mod stats;

pub use auth::verify_bearer;
pub use config::{Config, FeedConfig, SpotifyConfig};
pub use error::{Error, Result};
pub use http::{empty_response, error_response, json_response, ApiResponse, CorsPolicy};
pub use models::{Entry, EntryType, NewEntryRequest, NewEntryResponse, Row};
pub use sheets::{GoogleSheetsClient, SheetStore};
pub use spotify::{NowPlaying, SpotifyClient};
pub use stats::{compute as compute_stats, LocalClock, StatsSnapshot};
