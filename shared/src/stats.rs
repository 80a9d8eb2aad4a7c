//! Practice statistics.
//!
//! Turns the flat practice log into the snapshot rendered by the dashboard
//! widget. Every calendar boundary is computed in the caller's wall-clock
//! frame: a UTC instant is shifted into local time, truncated there, and the
//! resulting boundary shifted back to UTC for comparison against stored
//! timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::Entry;
use crate::{Error, Result};

/// Number of weeks shown in the contribution grid.
pub const GRID_WEEKS: usize = 52;

/// Number of gigs listed in `recent_gigs`.
pub const RECENT_GIGS: usize = 10;

/// Weeks covered by the rolling average, ending at the start of this week.
const AVERAGE_WEEKS: i64 = 4;

/// Intensity reported for grid cells after today.
pub const FUTURE_INTENSITY: i8 = -1;

const DAY_LABELS: [&str; 7] = ["M", "T", "W", "T", "F", "S", "S"];

/// Caller wall clock, using the `getTimezoneOffset()` convention: minutes
/// *west* of UTC, so UTC+12 is `-720`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset_minutes: i64,
}

impl LocalClock {
    pub const UTC: LocalClock = LocalClock { offset_minutes: 0 };

    pub fn new(offset_minutes: i32) -> Result<Self> {
        if offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(Error::Validation(format!(
                "timezone offset out of range: {}",
                offset_minutes
            )));
        }
        Ok(Self {
            offset_minutes: offset_minutes as i64,
        })
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() - Duration::minutes(self.offset_minutes)
    }

    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local + Duration::minutes(self.offset_minutes)).and_utc()
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date()
    }

    /// Local midnight of `date`, as a UTC instant.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        self.to_utc(date.and_time(NaiveTime::MIN))
    }
}

/// Map a day's total minutes onto the 0-4 heatmap scale.
pub fn intensity(minutes: u32) -> i8 {
    match minutes {
        0 => 0,
        1..=14 => 1,
        15..=29 => 2,
        30..=59 => 3,
        _ => 4,
    }
}

/// Monday on or before `date`.
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Window boundaries relative to "now" in the caller's frame.
#[derive(Debug, Clone, Copy)]
struct Windows {
    today: NaiveDate,
    monday: NaiveDate,
    day_start: DateTime<Utc>,
    week_start: DateTime<Utc>,
    month_start: DateTime<Utc>,
    year_start: DateTime<Utc>,
    prior_start: DateTime<Utc>,
}

impl Windows {
    fn new(clock: LocalClock, now: DateTime<Utc>) -> Self {
        let today = clock.local_date(now);
        let monday = monday_of(today);
        let first_of_month = today - Duration::days(today.day0() as i64);
        let first_of_year = today - Duration::days(today.ordinal0() as i64);
        let week_start = clock.start_of(monday);

        Self {
            today,
            monday,
            day_start: clock.start_of(today),
            week_start,
            month_start: clock.start_of(first_of_month),
            year_start: clock.start_of(first_of_year),
            prior_start: week_start - Duration::weeks(AVERAGE_WEEKS),
        }
    }
}

/// Minute totals for one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTotals {
    pub start: Option<DateTime<Utc>>,
    /// Practice and gig minutes.
    pub total_minutes: u32,
    /// Practice-only minutes.
    pub practice_minutes: u32,
}

impl WindowTotals {
    fn starting(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    fn add(&mut self, entry: &Entry) {
        self.total_minutes = self.total_minutes.saturating_add(entry.minutes);
        if entry.is_practice() {
            self.practice_minutes = self.practice_minutes.saturating_add(entry.minutes);
        }
    }
}

/// Lowercase category name to summed practice minutes.
pub type CategoryTotals = BTreeMap<String, u32>;

fn add_category(totals: &mut CategoryTotals, entry: &Entry) {
    if entry.is_practice() {
        let total = totals.entry(entry.category.clone()).or_default();
        *total = total.saturating_add(entry.minutes);
    }
}

/// Category with the most minutes; ties go to the alphabetically first name.
pub fn top_category(totals: &CategoryTotals) -> Option<String> {
    let mut best: Option<(&String, u32)> = None;
    for (name, &minutes) in totals {
        if best.map_or(true, |(_, top)| minutes > top) {
            best = Some((name, minutes));
        }
    }
    best.map(|(name, _)| name.clone())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    #[serde(flatten)]
    pub totals: WindowTotals,
    /// Today's entries, most recent first.
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    #[serde(flatten)]
    pub totals: WindowTotals,
    pub by_category: CategoryTotals,
    /// Latest non-empty note per practice category.
    pub notes_by_category: BTreeMap<String, String>,
    pub top_category: Option<String>,
    /// Monday through Sunday.
    pub days: Vec<DayCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    #[serde(flatten)]
    pub totals: WindowTotals,
    pub by_category: CategoryTotals,
}

/// Most recent local day with any entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDay {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// One day of the current week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub label: &'static str,
    pub minutes: u32,
    pub intensity: i8,
    pub has_gig: bool,
    pub is_future: bool,
    pub is_today: bool,
}

/// One day of the contribution grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub date: NaiveDate,
    pub minutes: u32,
    /// 0-4, or [`FUTURE_INTENSITY`] after today.
    pub intensity: i8,
    pub has_gig: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRef {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub minutes: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GigRef {
    pub timestamp: DateTime<Utc>,
    pub venue: String,
    pub minutes: u32,
    pub notes: String,
}

impl From<&Entry> for PracticeRef {
    fn from(e: &Entry) -> Self {
        Self {
            timestamp: e.timestamp,
            category: e.category.clone(),
            minutes: e.minutes,
            notes: e.notes.clone(),
        }
    }
}

impl From<&Entry> for GigRef {
    fn from(e: &Entry) -> Self {
        Self {
            timestamp: e.timestamp,
            venue: e.venue.clone(),
            minutes: e.minutes,
            notes: e.notes.clone(),
        }
    }
}

/// Derived statistics for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub today: TodaySummary,
    pub week: WeekSummary,
    pub month: MonthSummary,
    pub year: WindowTotals,
    /// Mean weekly hours over the four complete weeks before this one.
    pub weekly_average_hours: f64,
    pub streak: u32,
    pub grid: Vec<GridCell>,
    pub all_time_by_category: CategoryTotals,
    pub last_practice: Option<PracticeRef>,
    pub last_active_day: Option<ActiveDay>,
    pub last_gig: Option<GigRef>,
    pub recent_gigs: Vec<GigRef>,
    pub total_gigs: usize,
    pub total_entries: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct DayTotal {
    minutes: u32,
    has_gig: bool,
}

/// Build the snapshot for `entries` as seen at `now` from `clock`'s frame.
///
/// Entries stamped after `now` are ignored everywhere.
pub fn compute(entries: &[Entry], clock: LocalClock, now: DateTime<Utc>) -> StatsSnapshot {
    let windows = Windows::new(clock, now);

    let mut sorted: Vec<&Entry> = entries.iter().filter(|e| e.timestamp <= now).collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut today = TodaySummary {
        totals: WindowTotals::starting(windows.day_start),
        entries: Vec::new(),
    };
    let mut week = WeekSummary {
        totals: WindowTotals::starting(windows.week_start),
        ..WeekSummary::default()
    };
    let mut month = MonthSummary {
        totals: WindowTotals::starting(windows.month_start),
        ..MonthSummary::default()
    };
    let mut year = WindowTotals::starting(windows.year_start);
    let mut all_time_by_category = CategoryTotals::new();
    let mut prior_minutes: u64 = 0;
    let mut daily: HashMap<NaiveDate, DayTotal> = HashMap::new();

    for &entry in &sorted {
        let ts = entry.timestamp;

        let day = daily.entry(clock.local_date(ts)).or_default();
        day.minutes = day.minutes.saturating_add(entry.minutes);
        day.has_gig |= entry.is_gig();

        add_category(&mut all_time_by_category, entry);
        if ts >= windows.year_start {
            year.add(entry);
        }
        if ts >= windows.month_start {
            month.totals.add(entry);
            add_category(&mut month.by_category, entry);
        }
        if ts >= windows.week_start {
            week.totals.add(entry);
            add_category(&mut week.by_category, entry);
            // Sorted newest first, so the first note seen is the latest.
            if entry.is_practice() && !entry.notes.is_empty() {
                week.notes_by_category
                    .entry(entry.category.clone())
                    .or_insert_with(|| entry.notes.clone());
            }
        } else if ts >= windows.prior_start {
            prior_minutes += entry.minutes as u64;
        }
        if ts >= windows.day_start {
            today.totals.add(entry);
            today.entries.push(entry.clone());
        }
    }

    week.top_category = top_category(&week.by_category);
    week.days = week_days(&windows, &daily);

    let active_days: BTreeSet<NaiveDate> = daily.keys().copied().collect();
    let last_active_day = active_days.last().map(|&date| ActiveDay {
        date,
        minutes: daily.get(&date).map(|d| d.minutes).unwrap_or_default(),
    });
    let gigs: Vec<&Entry> = sorted.iter().copied().filter(|e| e.is_gig()).collect();

    StatsSnapshot {
        today,
        week,
        month,
        year,
        weekly_average_hours: weekly_average_hours(prior_minutes),
        streak: streak(&active_days, windows.today),
        grid: grid(&windows, &daily),
        all_time_by_category,
        last_practice: sorted.iter().find(|e| e.is_practice()).map(|e| PracticeRef::from(*e)),
        last_active_day,
        last_gig: gigs.first().map(|e| GigRef::from(*e)),
        recent_gigs: gigs.iter().take(RECENT_GIGS).map(|e| GigRef::from(*e)).collect(),
        total_gigs: gigs.len(),
        total_entries: sorted.len(),
    }
}

fn weekly_average_hours(prior_minutes: u64) -> f64 {
    let hours = prior_minutes as f64 / AVERAGE_WEEKS as f64 / 60.0;
    (hours * 10.0).round() / 10.0
}

/// Consecutive local days with at least one entry, anchored at today or
/// yesterday. Zero when the most recent active day is older than that.
pub fn streak(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut days = active_days.iter().rev().copied();
    let Some(latest) = days.next() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut count = 1;
    let mut previous = latest;
    for day in days {
        if previous - day != Duration::days(1) {
            break;
        }
        count += 1;
        previous = day;
    }
    count
}

fn week_days(windows: &Windows, daily: &HashMap<NaiveDate, DayTotal>) -> Vec<DayCell> {
    DAY_LABELS
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let date = windows.monday + Duration::days(i as i64);
            let total = daily.get(&date).copied().unwrap_or_default();
            DayCell {
                date,
                label,
                minutes: total.minutes,
                intensity: intensity(total.minutes),
                has_gig: total.has_gig,
                is_future: date > windows.today,
                is_today: date == windows.today,
            }
        })
        .collect()
}

fn grid(windows: &Windows, daily: &HashMap<NaiveDate, DayTotal>) -> Vec<GridCell> {
    let first_of_year = windows.today - Duration::days(windows.today.ordinal0() as i64);
    let start = monday_of(first_of_year);

    (0..GRID_WEEKS * 7)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            if date > windows.today {
                return GridCell {
                    date,
                    minutes: 0,
                    intensity: FUTURE_INTENSITY,
                    has_gig: false,
                };
            }
            let total = daily.get(&date).copied().unwrap_or_default();
            GridCell {
                date,
                minutes: total.minutes,
                intensity: intensity(total.minutes),
                has_gig: total.has_gig,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryType;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn practice(ts: DateTime<Utc>, category: &str, minutes: u32) -> Entry {
        Entry {
            timestamp: ts,
            category: category.to_string(),
            minutes,
            notes: String::new(),
            entry_type: EntryType::Practice,
            venue: String::new(),
        }
    }

    fn gig(ts: DateTime<Utc>, venue: &str, minutes: u32) -> Entry {
        Entry {
            timestamp: ts,
            category: String::new(),
            minutes,
            notes: String::new(),
            entry_type: EntryType::Gig,
            venue: venue.to_string(),
        }
    }

    #[test]
    fn test_intensity_bands() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(1), 1);
        assert_eq!(intensity(14), 1);
        assert_eq!(intensity(15), 2);
        assert_eq!(intensity(29), 2);
        assert_eq!(intensity(30), 3);
        assert_eq!(intensity(59), 3);
        assert_eq!(intensity(60), 4);
        assert_eq!(intensity(600), 4);
    }

    #[test]
    fn test_clock_rejects_out_of_range_offsets() {
        assert!(LocalClock::new(-720).is_ok());
        assert!(LocalClock::new(1439).is_ok());
        assert!(LocalClock::new(1440).is_err());
        assert!(LocalClock::new(-1440).is_err());
        assert!(LocalClock::new(i32::MIN).is_err());
        assert!(LocalClock::new(i32::MAX).is_err());
    }

    #[test]
    fn test_clock_shift_round_trip() {
        // UTC+12: 2024-03-04 20:00Z is already 2024-03-05 08:00 locally.
        let clock = LocalClock::new(-720).unwrap();
        let now = at(2024, 3, 4, 20, 0);
        assert_eq!(clock.local_date(now), date(2024, 3, 5));
        assert_eq!(clock.start_of(date(2024, 3, 5)), at(2024, 3, 4, 12, 0));
        assert_eq!(clock.to_utc(clock.to_local(now)), now);
    }

    #[test]
    fn test_single_entry_example() {
        let entries = vec![practice(at(2024, 3, 4, 9, 0), "scales", 20)];
        let snap = compute(&entries, LocalClock::UTC, at(2024, 3, 4, 12, 0));
        assert_eq!(snap.today.totals.total_minutes, 20);
        assert_eq!(snap.week.totals.total_minutes, 20);
        assert_eq!(snap.streak, 1);
        assert_eq!(snap.today.entries.len(), 1);
        assert_eq!(snap.week.top_category.as_deref(), Some("scales"));
    }

    #[test]
    fn test_window_boundaries() {
        // 2024-03-06 is a Wednesday.
        let snap = compute(&[], LocalClock::UTC, at(2024, 3, 6, 15, 30));
        assert_eq!(snap.today.totals.start, Some(at(2024, 3, 6, 0, 0)));
        assert_eq!(snap.week.totals.start, Some(at(2024, 3, 4, 0, 0)));
        assert_eq!(snap.month.totals.start, Some(at(2024, 3, 1, 0, 0)));
        assert_eq!(snap.year.start, Some(at(2024, 1, 1, 0, 0)));
    }

    #[test]
    fn test_sunday_week_starts_previous_monday() {
        let snap = compute(&[], LocalClock::UTC, at(2024, 3, 10, 10, 0));
        assert_eq!(snap.week.totals.start, Some(at(2024, 3, 4, 0, 0)));
        assert!(snap.week.days[6].is_today);
    }

    #[test]
    fn test_boundaries_shift_with_offset() {
        // UTC-5 (offset 300): local midnight is 05:00Z.
        let clock = LocalClock::new(300).unwrap();
        let snap = compute(&[], clock, at(2024, 3, 6, 3, 0));
        // Still Tuesday 2024-03-05 locally.
        assert_eq!(snap.today.totals.start, Some(at(2024, 3, 5, 5, 0)));
        assert_eq!(snap.week.totals.start, Some(at(2024, 3, 4, 5, 0)));
        assert!(snap.week.days[1].is_today);
    }

    #[test]
    fn test_monotonic_windows() {
        let now = at(2024, 3, 6, 18, 0);
        let entries = vec![
            practice(at(2024, 1, 15, 9, 0), "scales", 40),
            practice(at(2024, 3, 1, 9, 0), "etudes", 25),
            practice(at(2024, 3, 4, 9, 0), "scales", 10),
            gig(at(2024, 3, 6, 1, 0), "Blue Room", 90),
            practice(at(2024, 3, 6, 9, 0), "repertoire", 35),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        assert_eq!(snap.today.totals.total_minutes, 125);
        assert_eq!(snap.week.totals.total_minutes, 135);
        assert_eq!(snap.month.totals.total_minutes, 160);
        assert_eq!(snap.year.total_minutes, 200);
        assert!(snap.today.totals.total_minutes <= snap.week.totals.total_minutes);
        assert!(snap.week.totals.total_minutes <= snap.month.totals.total_minutes);
        assert!(snap.month.totals.total_minutes <= snap.year.total_minutes);
        assert_eq!(snap.week.totals.practice_minutes, 45);
        assert_eq!(snap.year.practice_minutes, 110);
    }

    #[test]
    fn test_category_breakdowns_exclude_gigs() {
        let now = at(2024, 3, 6, 18, 0);
        let entries = vec![
            practice(at(2024, 2, 10, 9, 0), "scales", 30),
            practice(at(2024, 3, 2, 9, 0), "scales", 15),
            practice(at(2024, 3, 5, 9, 0), "etudes", 20),
            gig(at(2024, 3, 5, 21, 0), "Hall", 60),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        assert_eq!(snap.all_time_by_category["scales"], 45);
        assert_eq!(snap.all_time_by_category["etudes"], 20);
        assert_eq!(snap.all_time_by_category.len(), 2);
        assert_eq!(snap.month.by_category["scales"], 15);
        assert_eq!(snap.week.by_category.len(), 1);
        assert_eq!(snap.week.by_category["etudes"], 20);
    }

    #[test]
    fn test_top_category_tie_is_alphabetical() {
        let mut totals = CategoryTotals::new();
        totals.insert("scales".into(), 30);
        totals.insert("etudes".into(), 30);
        totals.insert("arpeggios".into(), 10);
        assert_eq!(top_category(&totals).as_deref(), Some("etudes"));
        assert_eq!(top_category(&CategoryTotals::new()), None);
    }

    #[test]
    fn test_streak_extends_and_breaks() {
        let today = date(2024, 3, 6);
        let mut days: BTreeSet<NaiveDate> = [date(2024, 3, 6), date(2024, 3, 5)].into();
        assert_eq!(streak(&days, today), 2);

        days.insert(date(2024, 3, 4));
        assert_eq!(streak(&days, today), 3);

        // Gap on 3/3 caps the run.
        days.insert(date(2024, 3, 2));
        assert_eq!(streak(&days, today), 3);
    }

    #[test]
    fn test_streak_anchored_at_yesterday() {
        let days: BTreeSet<NaiveDate> = [date(2024, 3, 5), date(2024, 3, 4)].into();
        assert_eq!(streak(&days, date(2024, 3, 6)), 2);
        assert_eq!(streak(&days, date(2024, 3, 7)), 0);
        assert_eq!(streak(&BTreeSet::new(), date(2024, 3, 7)), 0);
    }

    #[test]
    fn test_streak_uses_local_days() {
        // 23:30Z on the 5th is already the 6th in UTC+1.
        let clock = LocalClock::new(-60).unwrap();
        let entries = vec![
            practice(at(2024, 3, 5, 23, 30), "scales", 10),
            practice(at(2024, 3, 5, 8, 0), "scales", 10),
        ];
        let snap = compute(&entries, clock, at(2024, 3, 6, 9, 0));
        assert_eq!(snap.streak, 2);
        assert_eq!(snap.today.totals.total_minutes, 10);
    }

    #[test]
    fn test_week_days_shape() {
        let now = at(2024, 3, 6, 12, 0);
        let entries = vec![
            practice(at(2024, 3, 4, 9, 0), "scales", 45),
            gig(at(2024, 3, 5, 20, 0), "Hall", 10),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        let days = &snap.week.days;
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(2024, 3, 4));
        assert_eq!(days[0].label, "M");
        assert_eq!(days[6].label, "S");
        assert_eq!(days[0].intensity, 3);
        assert!(days[1].has_gig);
        assert_eq!(days[1].intensity, 1);
        assert_eq!(days.iter().filter(|d| d.is_today).count(), 1);
        assert!(days[2].is_today);
        assert!(!days[2].is_future);
        assert!(days[3].is_future);
    }

    #[test]
    fn test_grid_shape_and_future_cells() {
        let now = at(2024, 3, 6, 12, 0);
        let entries = vec![
            practice(at(2024, 3, 6, 9, 0), "scales", 70),
            gig(at(2024, 1, 20, 21, 0), "Hall", 30),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        let grid = &snap.grid;
        assert_eq!(grid.len(), 364);
        // 2024-01-01 is a Monday.
        assert_eq!(grid[0].date, date(2024, 1, 1));

        let today = grid.iter().find(|c| c.date == date(2024, 3, 6)).unwrap();
        assert_eq!(today.intensity, 4);
        let gig_day = grid.iter().find(|c| c.date == date(2024, 1, 20)).unwrap();
        assert!(gig_day.has_gig);

        for cell in grid.iter().filter(|c| c.date > date(2024, 3, 6)) {
            assert_eq!(cell.intensity, FUTURE_INTENSITY);
            assert!(!cell.has_gig);
        }
    }

    #[test]
    fn test_grid_starts_on_monday_before_new_year() {
        // 2025-01-01 is a Wednesday.
        let snap = compute(&[], LocalClock::UTC, at(2025, 6, 1, 12, 0));
        assert_eq!(snap.grid[0].date, date(2024, 12, 30));
        assert_eq!(snap.grid[0].intensity, 0);
    }

    #[test]
    fn test_future_entries_ignored() {
        let now = at(2024, 3, 6, 12, 0);
        let entries = vec![
            practice(at(2024, 3, 6, 9, 0), "scales", 10),
            practice(at(2024, 3, 6, 18, 0), "scales", 50),
            gig(at(2024, 3, 9, 20, 0), "Hall", 120),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        assert_eq!(snap.today.totals.total_minutes, 10);
        assert_eq!(snap.total_entries, 1);
        assert_eq!(snap.total_gigs, 0);
        let saturday = &snap.week.days[5];
        assert!(saturday.is_future);
        assert!(!saturday.has_gig);
        assert_eq!(saturday.minutes, 0);
    }

    #[test]
    fn test_weekly_average_excludes_current_week() {
        let now = at(2024, 3, 6, 12, 0);
        let entries = vec![
            // Week of 2024-02-26, inside the window.
            practice(at(2024, 2, 27, 9, 0), "scales", 120),
            // Week of 2024-02-05, first week of the window.
            practice(at(2024, 2, 5, 0, 0), "scales", 60),
            gig(at(2024, 2, 10, 20, 0), "Hall", 90),
            // Before the window.
            practice(at(2024, 2, 4, 23, 59), "scales", 600),
            // Current week.
            practice(at(2024, 3, 4, 9, 0), "scales", 600),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        // 270 minutes / 4 weeks = 67.5 min = 1.125 h
        assert_eq!(snap.weekly_average_hours, 1.1);
    }

    #[test]
    fn test_last_pointers_and_recent_gigs() {
        let now = at(2024, 3, 30, 12, 0);
        let mut entries: Vec<Entry> = (1..=12)
            .map(|d| gig(at(2024, 3, d, 21, 0), &format!("venue {}", d), 60))
            .collect();
        entries.push(practice(at(2024, 3, 20, 9, 0), "scales", 15));
        entries.push(practice(at(2024, 3, 25, 9, 0), "etudes", 25));

        let snap = compute(&entries, LocalClock::UTC, now);
        let last = snap.last_practice.unwrap();
        assert_eq!(last.category, "etudes");
        assert_eq!(last.timestamp, at(2024, 3, 25, 9, 0));
        assert_eq!(snap.last_gig.unwrap().venue, "venue 12");
        assert_eq!(snap.recent_gigs.len(), 10);
        assert_eq!(snap.recent_gigs[0].venue, "venue 12");
        assert_eq!(snap.recent_gigs[9].venue, "venue 3");
        assert_eq!(snap.total_gigs, 12);
        assert_eq!(snap.total_entries, 14);
    }

    #[test]
    fn test_today_entries_most_recent_first() {
        let now = at(2024, 3, 6, 20, 0);
        let entries = vec![
            practice(at(2024, 3, 6, 8, 0), "scales", 10),
            practice(at(2024, 3, 6, 19, 0), "etudes", 10),
            practice(at(2024, 3, 6, 12, 0), "repertoire", 10),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        let order: Vec<&str> = snap.today.entries.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(order, vec!["etudes", "repertoire", "scales"]);
    }

    #[test]
    fn test_huge_minutes_saturate() {
        let now = at(2024, 3, 6, 12, 0);
        let entries = vec![
            practice(at(2024, 3, 6, 8, 0), "scales", 3_000_000_000),
            practice(at(2024, 3, 6, 9, 0), "scales", 3_000_000_000),
            gig(at(2024, 3, 6, 10, 0), "Hall", 3_000_000_000),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        assert_eq!(snap.today.totals.total_minutes, u32::MAX);
        assert_eq!(snap.week.totals.total_minutes, u32::MAX);
        assert_eq!(snap.year.total_minutes, u32::MAX);
        assert_eq!(snap.all_time_by_category["scales"], u32::MAX);
        assert_eq!(snap.week.days[2].minutes, u32::MAX);
        assert!(snap.today.totals.total_minutes <= snap.week.totals.total_minutes);
        assert!(snap.week.totals.total_minutes <= snap.month.totals.total_minutes);
    }

    #[test]
    fn test_last_active_day_total() {
        let now = at(2024, 3, 8, 12, 0);
        let entries = vec![
            practice(at(2024, 3, 6, 8, 0), "scales", 20),
            gig(at(2024, 3, 6, 21, 0), "Hall", 60),
            practice(at(2024, 3, 5, 9, 0), "etudes", 45),
        ];
        let snap = compute(&entries, LocalClock::UTC, now);
        let last = snap.last_active_day.unwrap();
        assert_eq!(last.date, date(2024, 3, 6));
        assert_eq!(last.minutes, 80);
        assert_eq!(compute(&[], LocalClock::UTC, now).last_active_day, None);
    }

    #[test]
    fn test_week_notes_keep_latest_per_category() {
        let now = at(2024, 3, 6, 12, 0);
        let mut early = practice(at(2024, 3, 4, 9, 0), "scales", 10);
        early.notes = "slow".into();
        let mut late = practice(at(2024, 3, 5, 9, 0), "scales", 10);
        late.notes = "metronome 90".into();
        let blank = practice(at(2024, 3, 6, 9, 0), "scales", 10);
        let mut before_week = practice(at(2024, 3, 1, 9, 0), "etudes", 10);
        before_week.notes = "old".into();
        let mut gig_note = gig(at(2024, 3, 5, 21, 0), "Hall", 60);
        gig_note.notes = "two sets".into();

        let snap = compute(&[early, late, blank, before_week, gig_note], LocalClock::UTC, now);
        assert_eq!(snap.week.notes_by_category.len(), 1);
        assert_eq!(snap.week.notes_by_category["scales"], "metronome 90");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let entries = vec![practice(at(2024, 3, 4, 9, 0), "scales", 20)];
        let snap = compute(&entries, LocalClock::UTC, at(2024, 3, 4, 12, 0));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["today"]["totalMinutes"], 20);
        assert_eq!(json["today"]["entries"][0]["type"], "practice");
        assert_eq!(json["week"]["days"][0]["date"], "2024-03-04");
        assert_eq!(json["week"]["days"][0]["isToday"], true);
        assert_eq!(json["week"]["byCategory"]["scales"], 20);
        assert_eq!(json["grid"].as_array().unwrap().len(), 364);
        assert_eq!(json["lastGig"], serde_json::Value::Null);
    }
}
