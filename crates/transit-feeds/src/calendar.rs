//! Holiday calendar oracle.
//!
//! Answers "is this date a holiday?" from a per-year public calendar, falling
//! back to a plain weekend rule when the calendar cannot be fetched or does not
//! list the date.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use commute_core::serde_helpers::lenient_string;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::FeedError;

/// One day of the published calendar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    /// Zero-padded `YYYYMMDD`.
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl CalendarEntry {
    pub fn new(date: NaiveDate, is_holiday: bool) -> Self {
        Self {
            date: date_key(date),
            is_holiday,
            description: None,
        }
    }
}

/// Source of per-year calendar tables.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_year(&self, year: i32) -> Result<Vec<CalendarEntry>, FeedError>;
}

/// Anything that can decide whether a date is a holiday.
///
/// Implementations never fail; they degrade to a best guess instead.
#[async_trait]
pub trait HolidayOracle: Send + Sync {
    async fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Cache key for a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[derive(Debug, Default)]
struct CalendarCache {
    fetched_years: HashSet<i32>,
    days: HashMap<String, bool>,
}

/// Holiday oracle backed by a calendar source with a process-lifetime cache.
///
/// A year is fetched at most once successfully. Failed fetches are not
/// recorded, so a later call retries. The cache lock is held across the fetch
/// so concurrent callers for the same year share one request.
pub struct CalendarOracle {
    source: Arc<dyn CalendarSource>,
    cache: Mutex<CalendarCache>,
}

impl CalendarOracle {
    pub fn new(source: Arc<dyn CalendarSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(CalendarCache::default()),
        }
    }

    /// Whether a year's table has been loaded.
    pub async fn has_year(&self, year: i32) -> bool {
        self.cache.lock().await.fetched_years.contains(&year)
    }
}

#[async_trait]
impl HolidayOracle for CalendarOracle {
    async fn is_holiday(&self, date: NaiveDate) -> bool {
        let key = date_key(date);
        let year = date.year();
        let mut cache = self.cache.lock().await;

        if !cache.fetched_years.contains(&year) {
            match self.source.fetch_year(year).await {
                Ok(entries) => {
                    info!("Loaded {} calendar entries for {}", entries.len(), year);
                    for entry in entries {
                        cache.days.insert(entry.date, entry.is_holiday);
                    }
                    cache.fetched_years.insert(year);
                }
                Err(e) => {
                    warn!("Holiday calendar for {} unavailable, using weekend rule: {}", year, e);
                }
            }
        }

        match cache.days.get(&key) {
            Some(holiday) => *holiday,
            None => {
                debug!("No calendar entry for {}, using weekend rule", key);
                is_weekend(date)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail_first: bool,
        entries: Vec<CalendarEntry>,
    }

    #[async_trait]
    impl CalendarSource for CountingSource {
        async fn fetch_year(&self, _year: i32) -> Result<Vec<CalendarEntry>, FeedError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(FeedError::Status {
                    feed: "calendar",
                    status: 500,
                });
            }
            Ok(self.entries.clone())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_key_zero_padded() {
        assert_eq!(date_key(date(2025, 1, 5)), "20250105");
    }

    #[test]
    fn test_calendar_entry_parses_feed_shape() {
        let entries: Vec<CalendarEntry> = serde_json::from_str(
            r#"[{"date":"20250101","week":"三","isHoliday":true,"description":"開國紀念日"},
                {"date":20250102,"isHoliday":false}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].description.as_deref(), Some("開國紀念日"));
        assert_eq!(entries[1].date, "20250102");
        assert!(!entries[1].is_holiday);
    }

    #[tokio::test]
    async fn test_calendar_entry_overrides_weekend() {
        // 2025-02-08 is a Saturday make-up workday; 2025-01-28 is a Tuesday holiday.
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail_first: false,
            entries: vec![
                CalendarEntry::new(date(2025, 2, 8), false),
                CalendarEntry::new(date(2025, 1, 28), true),
            ],
        });
        let oracle = CalendarOracle::new(source.clone());

        assert!(!oracle.is_holiday(date(2025, 2, 8)).await);
        assert!(oracle.is_holiday(date(2025, 1, 28)).await);
        // Unlisted dates use the weekend rule.
        assert!(oracle.is_holiday(date(2025, 3, 2)).await);
        assert!(!oracle.is_holiday(date(2025, 3, 3)).await);

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(oracle.has_year(2025).await);
    }

    #[tokio::test]
    async fn test_failed_year_is_retried() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail_first: true,
            entries: vec![CalendarEntry::new(date(2025, 1, 28), true)],
        });
        let oracle = CalendarOracle::new(source.clone());

        // First call fails and falls back to the weekend rule (Tuesday).
        assert!(!oracle.is_holiday(date(2025, 1, 28)).await);
        assert!(!oracle.has_year(2025).await);

        // Second call fetches again and sees the holiday.
        assert!(oracle.is_holiday(date(2025, 1, 28)).await);
        assert!(oracle.is_holiday(date(2025, 1, 28)).await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_years_fetched_independently() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail_first: false,
            entries: Vec::new(),
        });
        let oracle = CalendarOracle::new(source.clone());

        oracle.is_holiday(date(2025, 12, 31)).await;
        oracle.is_holiday(date(2026, 1, 1)).await;
        oracle.is_holiday(date(2026, 1, 2)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
