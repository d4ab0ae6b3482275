//! Measuring a user's activity against badge requirements

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::definitions::{RequirementType, MATH_SUBJECT};
use super::streaks::current_streak;
use crate::store::records::{query_many, query_one};
use crate::store::StoreResult;
use crate::time_bucket::{day_bucket, parse_day_bucket};

/// Current value of `requirement` for `user_id`, in the unit of the badge's
/// `requirement_value` (counts, hours or days). `today` anchors `daily_hours`.
pub fn measure(
    conn: &Connection,
    user_id: i64,
    requirement: RequirementType,
    today: NaiveDate,
) -> StoreResult<f64> {
    let value = match requirement {
        RequirementType::Registration => Some(1.0),
        RequirementType::StudySessions => query_one::<f64, _>(
            conn,
            "SELECT COUNT(*) FROM study_logs WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::StudyDays => query_one::<f64, _>(
            conn,
            "SELECT COUNT(DISTINCT date) FROM study_logs WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::StudyHours => query_one::<f64, _>(
            conn,
            "SELECT COALESCE(SUM(duration), 0) / 60.0 FROM study_logs WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::MathHours => query_one::<f64, _>(
            conn,
            "SELECT COALESCE(SUM(duration), 0) / 60.0 FROM study_logs
             WHERE user_id = ?1 AND subject = ?2",
            params![user_id, MATH_SUBJECT],
        )?,
        RequirementType::DailyHours => query_one::<f64, _>(
            conn,
            "SELECT COALESCE(SUM(duration), 0) / 60.0 FROM study_logs
             WHERE user_id = ?1 AND date = ?2",
            params![user_id, day_bucket(today)],
        )?,
        RequirementType::StreakDays => {
            Some(f64::from(current_streak(&study_dates(conn, user_id)?)))
        }
        RequirementType::MockExams => query_one::<f64, _>(
            conn,
            "SELECT COUNT(*) FROM mock_exams WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::SetGoals => query_one::<f64, _>(
            conn,
            "SELECT COUNT(*) FROM goals WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::MotivationSessions => query_one::<f64, _>(
            conn,
            "SELECT COUNT(*) FROM mood_logs WHERE user_id = ?1",
            params![user_id],
        )?,
        RequirementType::Friends => query_one::<f64, _>(
            conn,
            "SELECT COUNT(*) FROM friendships
             WHERE (user_id = ?1 OR friend_id = ?1) AND status = 'accepted'",
            params![user_id],
        )?,
    };
    Ok(value.unwrap_or(0.0))
}

/// Distinct study days of a user; unparseable dates are skipped
pub fn study_dates(conn: &Connection, user_id: i64) -> StoreResult<Vec<NaiveDate>> {
    let days = query_many::<String, _>(
        conn,
        "SELECT DISTINCT date FROM study_logs WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(days.iter().filter_map(|d| parse_day_bucket(d)).collect())
}
