//! Practice log data model.
//!
//! The Google Sheet stores one row per entry with the fixed column order
//! `timestamp | category | minutes | notes | type | venue`. Short rows imply
//! missing trailing fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest session a single write may log.
pub const MAX_ENTRY_MINUTES: u32 = 24 * 60;

/// Raw sheet row as returned by the Sheets API.
pub type Row = Vec<String>;

/// Kind of a logged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Practice,
    Gig,
}

impl EntryType {
    /// Anything other than `gig` is a practice session.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("gig") {
            EntryType::Gig
        } else {
            EntryType::Practice
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Practice => "practice",
            EntryType::Gig => "gig",
        }
    }
}

/// One logged practice session or gig.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub minutes: u32,
    pub notes: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub venue: String,
}

impl Entry {
    /// Parse a sheet row. Returns `None` when the timestamp is missing or invalid.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        let timestamp = parse_timestamp(cell(0))?;
        Some(Self {
            timestamp,
            category: cell(1).trim().to_lowercase(),
            minutes: parse_minutes(cell(2)),
            notes: cell(3).to_string(),
            entry_type: EntryType::parse(cell(4)),
            venue: cell(5).to_string(),
        })
    }

    /// Serialize back into the sheet column order.
    pub fn to_row(&self) -> Row {
        vec![
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.category.clone(),
            self.minutes.to_string(),
            self.notes.clone(),
            self.entry_type.as_str().to_string(),
            self.venue.clone(),
        ]
    }

    pub fn is_gig(&self) -> bool {
        self.entry_type == EntryType::Gig
    }

    pub fn is_practice(&self) -> bool {
        self.entry_type == EntryType::Practice
    }
}

/// Parse every usable row, dropping an optional header and malformed rows.
pub fn parse_rows(rows: &[Row]) -> Vec<Entry> {
    let body = match rows.first() {
        Some(first) if is_header(first) => &rows[1..],
        _ => rows,
    };
    body.iter().filter_map(|row| Entry::from_row(row)).collect()
}

fn is_header(row: &[String]) -> bool {
    row.first()
        .map(|cell| cell.trim().eq_ignore_ascii_case("timestamp"))
        .unwrap_or(false)
}

/// Accepts RFC 3339 instants, plus naive date-times and bare dates taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Leading-integer parse; anything unparseable or negative counts as zero.
pub fn parse_minutes(value: &str) -> u32 {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Minutes as sent by the widget: either a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MinutesInput {
    Number(f64),
    Text(String),
}

impl MinutesInput {
    fn value(&self) -> u32 {
        match self {
            MinutesInput::Number(n) if *n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
            MinutesInput::Number(_) => 0,
            MinutesInput::Text(s) => parse_minutes(s),
        }
    }
}

/// Log-write request body.
#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub category: Option<String>,
    pub minutes: Option<MinutesInput>,
    pub notes: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub venue: Option<String>,
}

impl NewEntryRequest {
    /// Validate the request and stamp it with `now`.
    pub fn into_entry(self, now: DateTime<Utc>) -> Result<Entry> {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Validation("category and minutes required".to_string()))?
            .to_lowercase();

        let minutes = self
            .minutes
            .as_ref()
            .map(MinutesInput::value)
            .filter(|m| *m > 0)
            .ok_or_else(|| Error::Validation("category and minutes required".to_string()))?;
        if minutes > MAX_ENTRY_MINUTES {
            return Err(Error::Validation(format!(
                "minutes must be at most {}",
                MAX_ENTRY_MINUTES
            )));
        }

        Ok(Entry {
            timestamp: now,
            category,
            minutes,
            notes: self.notes.unwrap_or_default(),
            entry_type: self
                .entry_type
                .as_deref()
                .map(EntryType::parse)
                .unwrap_or_default(),
            venue: self.venue.unwrap_or_default(),
        })
    }
}

/// Log-write response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryResponse {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub minutes: u32,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl From<&Entry> for NewEntryResponse {
    fn from(entry: &Entry) -> Self {
        Self {
            timestamp: entry.timestamp,
            category: entry.category.clone(),
            minutes: entry.minutes,
            entry_type: entry.entry_type,
        }
    }
}
