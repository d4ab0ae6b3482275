//! Study streaks
//!
//! A streak is a run of calendar-adjacent study days. The current streak
//! starts at the most recent study day and walks backwards until a gap.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streak summary derived from a user's study dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakInfo {
    pub current: u32,
    pub best: u32,
    pub last_activity_day: Option<NaiveDate>,
}

impl StreakInfo {
    /// Build from study dates in any order; duplicates are ignored
    pub fn from_dates(dates: &[NaiveDate]) -> Self {
        let days = distinct_descending(dates);
        let Some(&last) = days.first() else {
            return Self::default();
        };

        let mut current = 0;
        let mut best = 0;
        let mut run = 0;
        let mut in_first_run = true;
        let mut previous: Option<NaiveDate> = None;

        for day in days {
            let adjacent = previous.is_some_and(|p| (p - day).num_days() == 1);
            if previous.is_some() && !adjacent {
                in_first_run = false;
                run = 0;
            }
            run += 1;
            if in_first_run {
                current = run;
            }
            best = best.max(run);
            previous = Some(day);
        }

        Self {
            current,
            best,
            last_activity_day: Some(last),
        }
    }

    /// Still extendable: the last study day is today or yesterday
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.last_activity_day
            .is_some_and(|last| (today - last).num_days() <= 1)
    }
}

/// Length of the current streak; no dates means no streak
pub fn current_streak(dates: &[NaiveDate]) -> u32 {
    StreakInfo::from_dates(dates).current
}

fn distinct_descending(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(current_streak(&[]), 0);
        assert_eq!(StreakInfo::from_dates(&[]), StreakInfo::default());
    }

    #[test]
    fn test_run_from_most_recent_day() {
        let dates = [d("2024-03-10"), d("2024-03-09"), d("2024-03-08"), d("2024-03-05")];
        assert_eq!(current_streak(&dates), 3);
    }

    #[test]
    fn test_gap_ends_streak_and_order_does_not_matter() {
        let dates = [
            d("2024-03-01"),
            d("2024-03-10"),
            d("2024-03-02"),
            d("2024-03-03"),
            d("2024-03-02"),
        ];
        let info = StreakInfo::from_dates(&dates);
        assert_eq!(info.current, 1);
        assert_eq!(info.best, 3);
        assert_eq!(info.last_activity_day, Some(d("2024-03-10")));
    }

    #[test]
    fn test_is_active() {
        let info = StreakInfo::from_dates(&[d("2024-03-09")]);
        assert!(info.is_active(d("2024-03-09")));
        assert!(info.is_active(d("2024-03-10")));
        assert!(!info.is_active(d("2024-03-11")));
    }
}
