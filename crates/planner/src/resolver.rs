//! Commute mode resolution.
//!
//! The decision is split in two: [`resolve_with_verdicts`] is a pure function
//! over the time of day and three pre-computed holiday verdicts, and
//! [`resolve_mode`] gathers those verdicts from a [`HolidayOracle`].

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use commute_core::{CommuteMode, Settings};
use transit_feeds::HolidayOracle;

/// Hours before this are late night, regardless of holidays.
pub const LATE_NIGHT_END_HOUR: u32 = 5;

/// Hour splitting "morning after" from "evening before" a holiday.
pub const DAY_PIVOT_HOUR: u32 = 12;

/// Minutes either side of the configured work time that count as commuting to work.
pub const WORK_WINDOW_MINUTES: u32 = 180;

/// Holiday verdicts around the day being resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayVerdicts {
    pub yesterday: bool,
    pub today: bool,
    pub tomorrow: bool,
}

/// Resolve the mode from the time of day and pre-computed verdicts.
///
/// First match wins:
/// 1. before 05:00 is late night;
/// 2. a workday before a holiday, from noon on, is the trip to the old home;
/// 3. the first workday after a holiday, before noon, is work;
/// 4. a workday within three hours of the work time is work;
/// 5. any other holiday time is holiday;
/// 6. everything else is home.
pub fn resolve_with_verdicts(time: NaiveTime, verdicts: DayVerdicts, settings: &Settings) -> CommuteMode {
    let hour = time.hour();

    if hour < LATE_NIGHT_END_HOUR {
        return CommuteMode::LateNight;
    }

    if !verdicts.today && verdicts.tomorrow && hour >= DAY_PIVOT_HOUR {
        return CommuteMode::OldHome;
    }

    if verdicts.yesterday && !verdicts.today && hour < DAY_PIVOT_HOUR {
        return CommuteMode::Work;
    }

    if !verdicts.today {
        if let Some(work) = settings.work_minutes() {
            let current = hour * 60 + time.minute();
            if current.abs_diff(work) <= WORK_WINDOW_MINUTES {
                return CommuteMode::Work;
            }
        }
    }

    if verdicts.today {
        return CommuteMode::Holiday;
    }

    CommuteMode::Home
}

/// Resolve the mode for a local date-time, consulting the oracle.
///
/// Late-night resolution never touches the oracle.
pub async fn resolve_mode(now: NaiveDateTime, settings: &Settings, oracle: &dyn HolidayOracle) -> CommuteMode {
    if now.hour() < LATE_NIGHT_END_HOUR {
        return CommuteMode::LateNight;
    }

    let today = now.date();
    let yesterday = match today.pred_opt() {
        Some(day) => oracle.is_holiday(day).await,
        None => false,
    };
    let tomorrow = match today.succ_opt() {
        Some(day) => oracle.is_holiday(day).await,
        None => false,
    };
    let verdicts = DayVerdicts {
        yesterday,
        today: oracle.is_holiday(today).await,
        tomorrow,
    };

    let mode = resolve_with_verdicts(now.time(), verdicts, settings);
    tracing::debug!("Resolved {} at {} ({:?})", mode, now, verdicts);
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mock_model::FixedOracle;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    const WORKDAY: DayVerdicts = DayVerdicts {
        yesterday: false,
        today: false,
        tomorrow: false,
    };

    #[test]
    fn test_late_night_overrides_holidays() {
        let settings = Settings::default();
        let holiday = DayVerdicts {
            yesterday: true,
            today: true,
            tomorrow: true,
        };
        assert_eq!(resolve_with_verdicts(at(0, 0), holiday, &settings), CommuteMode::LateNight);
        assert_eq!(resolve_with_verdicts(at(4, 59), WORKDAY, &settings), CommuteMode::LateNight);
        assert_ne!(resolve_with_verdicts(at(5, 0), WORKDAY, &settings), CommuteMode::LateNight);
    }

    #[test]
    fn test_work_window_is_inclusive() {
        let settings = Settings::default(); // work time 09:00
        assert_eq!(resolve_with_verdicts(at(6, 0), WORKDAY, &settings), CommuteMode::Work);
        assert_eq!(resolve_with_verdicts(at(12, 0), WORKDAY, &settings), CommuteMode::Work);
        assert_eq!(resolve_with_verdicts(at(12, 1), WORKDAY, &settings), CommuteMode::Home);
        assert_eq!(resolve_with_verdicts(at(5, 59), WORKDAY, &settings), CommuteMode::Home);
    }

    #[test]
    fn test_work_window_boundaries_around_noon() {
        let mut settings = Settings::default();
        settings.work_time = "09:00".to_string();
        // 150 and 190 minutes past the work time
        assert_eq!(resolve_with_verdicts(at(11, 30), WORKDAY, &settings), CommuteMode::Work);
        assert_eq!(resolve_with_verdicts(at(12, 10), WORKDAY, &settings), CommuteMode::Home);
    }

    #[test]
    fn test_blank_or_invalid_work_time_skips_window() {
        let mut settings = Settings::default();
        settings.work_time = String::new();
        assert_eq!(resolve_with_verdicts(at(9, 0), WORKDAY, &settings), CommuteMode::Home);

        settings.work_time = "nine".to_string();
        assert_eq!(resolve_with_verdicts(at(9, 0), WORKDAY, &settings), CommuteMode::Home);
    }

    #[test]
    fn test_eve_of_holiday_after_noon_is_old_home() {
        let settings = Settings::default();
        let eve = DayVerdicts {
            tomorrow: true,
            ..WORKDAY
        };
        assert_eq!(resolve_with_verdicts(at(12, 0), eve, &settings), CommuteMode::OldHome);
        assert_eq!(resolve_with_verdicts(at(18, 30), eve, &settings), CommuteMode::OldHome);
        assert_eq!(resolve_with_verdicts(at(11, 59), eve, &settings), CommuteMode::Work);
    }

    #[test]
    fn test_morning_after_holiday_is_work() {
        let mut settings = Settings::default();
        settings.work_time = "20:00".to_string();
        let after = DayVerdicts {
            yesterday: true,
            ..WORKDAY
        };
        assert_eq!(resolve_with_verdicts(at(7, 0), after, &settings), CommuteMode::Work);
        assert_eq!(resolve_with_verdicts(at(12, 0), after, &settings), CommuteMode::Home);
    }

    #[test]
    fn test_holiday_daytime() {
        let settings = Settings::default();
        let holiday = DayVerdicts {
            today: true,
            ..WORKDAY
        };
        // The work window does not apply on holidays.
        assert_eq!(resolve_with_verdicts(at(9, 0), holiday, &settings), CommuteMode::Holiday);
        assert_eq!(resolve_with_verdicts(at(22, 0), holiday, &settings), CommuteMode::Holiday);
    }

    #[tokio::test]
    async fn test_resolve_mode_consults_oracle() {
        let settings = Settings::default();
        let holiday = NaiveDate::from_ymd_opt(2025, 1, 28).unwrap();
        let oracle = FixedOracle::new([holiday]);

        let eve = NaiveDate::from_ymd_opt(2025, 1, 27)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();
        assert_eq!(resolve_mode(eve, &settings, &oracle).await, CommuteMode::OldHome);

        let day = holiday.and_hms_opt(15, 0, 0).unwrap();
        assert_eq!(resolve_mode(day, &settings, &oracle).await, CommuteMode::Holiday);

        let after = NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        assert_eq!(resolve_mode(after, &settings, &oracle).await, CommuteMode::Work);

        let night = holiday.and_hms_opt(2, 0, 0).unwrap();
        assert_eq!(resolve_mode(night, &settings, &oracle).await, CommuteMode::LateNight);
    }
}
