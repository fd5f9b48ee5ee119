//! Visit records, aggregate shapes, and the storage abstraction.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VisitError;

pub const DEFAULT_SERIES_DAYS: u32 = 30;
pub const MAX_SERIES_DAYS: u32 = 365;

/// A page view waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVisit {
    pub visitor_id: String,
    pub path: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub page_views: i64,
    pub unique_visitors: i64,
}

/// Counts for the four fixed windows, keyed the way the admin API emits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    pub today: WindowStats,
    pub d7: WindowStats,
    pub d30: WindowStats,
    pub all: WindowStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub day: NaiveDate,
    pub page_views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Today,
    Last7Days,
    Last30Days,
    AllTime,
}

impl Window {
    pub const ALL: [Window; 4] = [
        Window::Today,
        Window::Last7Days,
        Window::Last30Days,
        Window::AllTime,
    ];

    /// Inclusive lower bound of the window relative to `now`, in UTC.
    /// `None` means unbounded.
    pub fn start(self, now: DateTime<Utc>) -> Option<NaiveDateTime> {
        let now = now.naive_utc();
        match self {
            Window::Today => Some(now.date().and_time(NaiveTime::MIN)),
            Window::Last7Days => Some(now - Duration::days(7)),
            Window::Last30Days => Some(now - Duration::days(30)),
            Window::AllTime => None,
        }
    }
}

impl VisitStats {
    pub fn set(&mut self, window: Window, stats: WindowStats) {
        match window {
            Window::Today => self.today = stats,
            Window::Last7Days => self.d7 = stats,
            Window::Last30Days => self.d30 = stats,
            Window::AllTime => self.all = stats,
        }
    }
}

/// The `days` calendar dates ending at (and including) `today`, oldest first.
pub fn series_days(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let days = i64::from(days.max(1));
    (0..days)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

/// Interpret a `?days=` query value as requested, without clamping.
///
/// Reads an optional sign and leading digits after trimming, ignoring any
/// trailing text. Missing, unparseable or zero values fall back to
/// [`DEFAULT_SERIES_DAYS`]. Values beyond `i64` saturate.
pub fn parse_series_days(raw: Option<&str>) -> i64 {
    let default = i64::from(DEFAULT_SERIES_DAYS);
    let Some(raw) = raw.map(str::trim) else {
        return default;
    };
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() || digits.bytes().all(|b| b == b'0') {
        return default;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Number of series points actually produced for a requested day count.
pub fn clamp_series_days(requested: i64) -> u32 {
    // The clamp keeps the value inside u32 range.
    requested.clamp(1, i64::from(MAX_SERIES_DAYS)) as u32
}

/// Snapshot of the one-shot schema initializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    pub ready: bool,
    pub init_error: Option<String>,
}

/// Storage for visit records and their aggregates.
#[async_trait::async_trait]
pub trait VisitBackend: Send + Sync + 'static {
    /// Create the visits table and its indexes if absent.
    ///
    /// Succeeds at most once per process; after a failure every call returns
    /// the cached [`VisitError::SchemaUnavailable`] without retrying.
    async fn ensure_schema(&self) -> Result<(), VisitError>;

    fn schema_status(&self) -> SchemaStatus;

    /// Append a batch of visits in one transaction.
    async fn insert_visits(&self, visits: &[PendingVisit]) -> Result<(), VisitError>;

    /// Counts for every [`Window`], evaluated against a single `now`.
    async fn window_stats(&self, now: DateTime<Utc>) -> Result<VisitStats, VisitError>;

    /// One point per calendar day for the `days` days ending on `now`'s date,
    /// zero-filled.
    async fn daily_series(&self, now: DateTime<Utc>, days: u32)
        -> Result<Vec<SeriesPoint>, VisitError>;
}
