//! Fixed holiday oracle.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use transit_feeds::HolidayOracle;

/// A holiday oracle over an explicit set of dates.
///
/// Nothing else is a holiday, weekends included, unless `with_weekends` is set.
#[derive(Debug, Default, Clone)]
pub struct FixedOracle {
    holidays: HashSet<NaiveDate>,
    weekends: bool,
}

impl FixedOracle {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            weekends: false,
        }
    }

    /// Also treat Saturdays and Sundays as holidays.
    pub fn with_weekends(mut self) -> Self {
        self.weekends = true;
        self
    }
}

#[async_trait]
impl HolidayOracle for FixedOracle {
    async fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date) || (self.weekends && transit_feeds::calendar::is_weekend(date))
    }
}
