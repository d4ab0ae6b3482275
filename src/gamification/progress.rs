//! Per-user activity summary over a trailing window of days

use chrono::NaiveDate;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::requirements::study_dates;
use super::streaks::StreakInfo;
use crate::store::records::{query_one, FromRow};
use crate::store::{StoreResult, TransactionScope};
use crate::time_bucket::{day_bucket, window_start};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Window length in days, ending today
    pub days: u32,
    pub sessions: i64,
    pub total_hours: f64,
    pub active_days: i64,
    /// Mean of non-zero ratings
    pub average_rating: Option<f64>,
    /// Over all time, not just the window
    pub current_streak: u32,
    pub best_streak: u32,
    /// The last study day is today or yesterday
    pub streak_active: bool,
    pub badges_earned: i64,
}

struct StudyTotals {
    sessions: i64,
    minutes: i64,
    active_days: i64,
    average_rating: Option<f64>,
}

impl FromRow for StudyTotals {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            sessions: row.get("sessions")?,
            minutes: row.get("minutes")?,
            active_days: row.get("active_days")?,
            average_rating: row.get("average_rating")?,
        })
    }
}

pub fn activity_summary(
    scope: &TransactionScope<'_>,
    user_id: i64,
    days: u32,
    today: NaiveDate,
) -> StoreResult<ActivitySummary> {
    let days = days.max(1);
    let since = window_start(today, days);
    let until = day_bucket(today);

    let totals: Option<StudyTotals> = query_one(
        scope,
        "SELECT COUNT(*) AS sessions,
                COALESCE(SUM(duration), 0) AS minutes,
                COUNT(DISTINCT date) AS active_days,
                AVG(NULLIF(performance_rating, 0)) AS average_rating
         FROM study_logs
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
        params![user_id, since, until],
    )?;
    let badges_earned: Option<i64> = query_one(
        scope,
        "SELECT COUNT(*) FROM user_badges
         WHERE user_id = ?1 AND date(earned_date) >= ?2 AND date(earned_date) <= ?3",
        params![user_id, since, until],
    )?;
    let streak = StreakInfo::from_dates(&study_dates(scope, user_id)?);

    let mut summary = ActivitySummary {
        days,
        current_streak: streak.current,
        best_streak: streak.best,
        streak_active: streak.is_active(today),
        badges_earned: badges_earned.unwrap_or(0),
        ..ActivitySummary::default()
    };
    if let Some(t) = totals {
        summary.sessions = t.sessions;
        summary.total_hours = t.minutes as f64 / 60.0;
        summary.active_days = t.active_days;
        summary.average_rating = t.average_rating;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PoolConfig, RetryPolicy, Store};
    use tempfile::tempdir;

    fn store_with_sessions(dir: &std::path::Path, sessions: &str) -> Store {
        let store = Store::open(
            PoolConfig::new(dir.join("progress.db")).with_max_size(1),
            RetryPolicy::default(),
        )
        .unwrap();
        store
            .coordinator()
            .with_transaction(|tx| {
                tx.execute_batch("INSERT INTO users (id, username) VALUES (1, 'ayse');")?;
                tx.execute_batch(sessions)?;
                Ok(())
            })
            .unwrap();
        store
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_future_sessions_are_outside_the_window() {
        let dir = tempdir().unwrap();
        let store = store_with_sessions(
            dir.path(),
            "INSERT INTO study_logs (user_id, subject, duration, date, performance_rating)
             VALUES (1, 'Fizik', 60, '2024-03-09', 4),
                    (1, 'Fizik', 90, '2024-03-10', 0),
                    (1, 'Tarih', 600, '2024-03-15', 1);",
        );

        let summary = store
            .coordinator()
            .with_read_transaction(|tx| activity_summary(tx, 1, 7, day(10)))
            .unwrap();

        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.total_hours, 2.5);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.average_rating, Some(4.0));
    }

    #[test]
    fn test_streak_fields() {
        let dir = tempdir().unwrap();
        let store = store_with_sessions(
            dir.path(),
            "INSERT INTO study_logs (user_id, subject, duration, date)
             VALUES (1, 'Fizik', 30, '2024-03-01'),
                    (1, 'Fizik', 30, '2024-03-02'),
                    (1, 'Fizik', 30, '2024-03-03'),
                    (1, 'Fizik', 30, '2024-03-08');",
        );
        let c = store.coordinator();

        let summary = c
            .with_read_transaction(|tx| activity_summary(tx, 1, 30, day(9)))
            .unwrap();
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.best_streak, 3);
        assert!(summary.streak_active);

        let later = c
            .with_read_transaction(|tx| activity_summary(tx, 1, 30, day(12)))
            .unwrap();
        assert!(!later.streak_active);
    }
}
