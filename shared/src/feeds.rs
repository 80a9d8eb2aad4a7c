//! RSS extraction for the Goodreads and Letterboxd widgets.
//!
//! Only the first `<item>` of a feed matters, so this pulls individual tags out
//! with regular expressions instead of building a document tree.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

static ITEM_RE: OnceLock<Regex> = OnceLock::new();
static CDATA_RE: OnceLock<Regex> = OnceLock::new();

/// Compiled `<name>...</name>` patterns, keyed by tag name.
static TAG_RES: OnceLock<RwLock<HashMap<String, Regex>>> = OnceLock::new();

fn tag_regex(name: &str) -> Option<Regex> {
    let cache = TAG_RES.get_or_init(|| RwLock::new(HashMap::new()));
    if let Ok(map) = cache.read() {
        if let Some(re) = map.get(name) {
            return Some(re.clone());
        }
    }

    let pattern = format!(r"(?s)<{0}>(.*?)</{0}>", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    if let Ok(mut map) = cache.write() {
        map.insert(name.to_string(), re.clone());
    }
    Some(re)
}

/// Body of the first `<item>` element, if any.
pub fn first_item(feed: &str) -> Option<&str> {
    let re = ITEM_RE.get_or_init(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("valid item regex"));
    re.captures(feed).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Trimmed text of the first `<name>` element, unwrapping CDATA.
pub fn tag_text(item: &str, name: &str) -> Option<String> {
    let re = tag_regex(name)?;
    let raw = re.captures(item)?.get(1)?.as_str().trim();

    let cdata = CDATA_RE.get_or_init(|| Regex::new(r"(?s)^<!\[CDATA\[(.*?)\]\]>$").expect("valid cdata regex"));
    let text = match cdata.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => raw,
    };
    Some(text.to_string())
}

/// Whole-star rating, e.g. 4 → "★★★★". Zero means unrated.
pub fn stars(rating: u32) -> Option<String> {
    (rating > 0).then(|| "\u{2605}".repeat(rating as usize))
}

/// Half-star rating, e.g. 3.5 → "★★★½".
pub fn half_stars(rating: f64) -> String {
    let full = rating.floor().max(0.0) as usize;
    let mut out = "\u{2605}".repeat(full);
    if rating % 1.0 >= 0.5 {
        out.push('\u{00BD}');
    }
    out
}

/// Shelf the book was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Reading,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub rating: Option<String>,
    pub read_at: Option<String>,
    pub status: ReadingStatus,
}

impl Book {
    pub fn from_item(item: &str, status: ReadingStatus) -> Self {
        let rating = tag_text(item, "user_rating")
            .and_then(|r| r.parse::<u32>().ok())
            .unwrap_or(0);

        Self {
            book: tag_text(item, "title"),
            author: tag_text(item, "author_name"),
            url: tag_text(item, "link"),
            rating: stars(rating),
            read_at: tag_text(item, "user_read_at").filter(|s| !s.is_empty()),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub film: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub url: Option<String>,
    pub watched_date: Option<String>,
    pub is_rewatch: bool,
}

impl Film {
    pub fn from_item(item: &str) -> Self {
        Self {
            film: tag_text(item, "letterboxd:filmTitle"),
            year: tag_text(item, "letterboxd:filmYear"),
            rating: tag_text(item, "letterboxd:memberRating")
                .and_then(|r| r.parse::<f64>().ok())
                .map(half_stars),
            url: tag_text(item, "link"),
            watched_date: tag_text(item, "letterboxd:watchedDate"),
            is_rewatch: tag_text(item, "letterboxd:rewatch").as_deref() == Some("Yes"),
        }
    }
}
