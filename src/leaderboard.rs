//! Read-only ranked views over users' progression and activity
//!
//! Ranks use SQL `RANK()`, so tied values share a rank and the next rank is
//! skipped. Rows are ordered by value (highest first) then user id, and users
//! with nothing to show are left out.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::store::records::{query_many, FromRow};
use crate::store::{StoreResult, TransactionCoordinator, TransactionScope};
use crate::time_bucket::{days_before, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    #[default]
    AllTime,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::AllTime => "all-time",
        }
    }

    /// First day bucket inside the window, `None` for all time.
    ///
    /// Weekly and monthly reach back a full 7 and 30 days before today.
    pub fn start(&self, today: NaiveDate) -> Option<String> {
        let days = match self {
            Self::Daily => 0,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::AllTime => return None,
        };
        Some(days_before(today, days))
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "all-time" | "all_time" | "alltime" => Ok(Self::AllTime),
            other => Err(format!(
                "unknown timeframe '{other}' (expected daily, weekly, monthly or all-time)"
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Lifetime XP; the timeframe does not apply
    #[default]
    TotalXp,
    /// Logged study minutes / 60
    StudyHours,
    /// Correct mock exam answers, AYT-style exams weighted 1.5
    QuestionsAnswered,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalXp => "total_xp",
            Self::StudyHours => "study_hours",
            Self::QuestionsAnswered => "questions_answered",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::TotalXp => TOTAL_XP_SQL,
            Self::StudyHours => STUDY_HOURS_SQL,
            Self::QuestionsAnswered => QUESTIONS_ANSWERED_SQL,
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_xp" | "xp" => Ok(Self::TotalXp),
            "study_hours" | "hours" => Ok(Self::StudyHours),
            "questions_answered" | "questions" => Ok(Self::QuestionsAnswered),
            other => Err(format!(
                "unknown category '{other}' (expected total_xp, study_hours or questions_answered)"
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub username: String,
    pub level: u32,
    pub value: f64,
}

impl FromRow for LeaderboardEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rank: row.get("rank")?,
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            level: row.get("level")?,
            value: row.get("value")?,
        })
    }
}

/// Ranked entries inside an existing scope
pub fn leaderboard(
    scope: &TransactionScope<'_>,
    timeframe: Timeframe,
    category: Category,
    limit: usize,
    today: NaiveDate,
) -> StoreResult<Vec<LeaderboardEntry>> {
    let since = timeframe.start(today);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    query_many(scope, category.sql(), params![since, limit])
}

/// Leaderboard queries, each in its own read transaction
#[derive(Clone)]
pub struct Leaderboard {
    coordinator: TransactionCoordinator,
}

impl Leaderboard {
    pub fn new(coordinator: TransactionCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn get_leaderboard(
        &self,
        timeframe: Timeframe,
        category: Category,
        limit: usize,
    ) -> StoreResult<Vec<LeaderboardEntry>> {
        self.get_leaderboard_on(timeframe, category, limit, today())
    }

    pub fn get_leaderboard_on(
        &self,
        timeframe: Timeframe,
        category: Category,
        limit: usize,
        today: NaiveDate,
    ) -> StoreResult<Vec<LeaderboardEntry>> {
        self.coordinator
            .with_read_transaction(|tx| leaderboard(tx, timeframe, category, limit, today))
    }
}

// ?1 is the first day of the window (NULL for all time), ?2 the row limit.
// Total XP is a lifetime counter and has no ?1.

const TOTAL_XP_SQL: &str = "
    SELECT RANK() OVER (ORDER BY ul.total_xp DESC) AS rank,
           u.id AS user_id,
           u.username,
           ul.current_level AS level,
           CAST(ul.total_xp AS REAL) AS value
    FROM users u
    JOIN user_levels ul ON ul.user_id = u.id
    WHERE ul.total_xp > 0
    ORDER BY ul.total_xp DESC, u.id ASC
    LIMIT ?2";

const STUDY_HOURS_SQL: &str = "
    WITH totals AS (
        SELECT user_id, SUM(duration) / 60.0 AS value
        FROM study_logs
        WHERE ?1 IS NULL OR date >= ?1
        GROUP BY user_id
    )
    SELECT RANK() OVER (ORDER BY t.value DESC) AS rank,
           u.id AS user_id,
           u.username,
           COALESCE(ul.current_level, 1) AS level,
           t.value
    FROM totals t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN user_levels ul ON ul.user_id = u.id
    WHERE t.value > 0
    ORDER BY t.value DESC, u.id ASC
    LIMIT ?2";

const QUESTIONS_ANSWERED_SQL: &str = "
    WITH totals AS (
        SELECT user_id,
               SUM(COALESCE(json_extract(subject_results, '$.correct'), 0)
                   * CASE WHEN exam_type = 'TYT' THEN 1.0 ELSE 1.5 END) AS value
        FROM mock_exams
        WHERE ?1 IS NULL OR exam_date >= ?1
        GROUP BY user_id
    )
    SELECT RANK() OVER (ORDER BY t.value DESC) AS rank,
           u.id AS user_id,
           u.username,
           COALESCE(ul.current_level, 1) AS level,
           t.value
    FROM totals t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN user_levels ul ON ul.user_id = u.id
    WHERE t.value > 0
    ORDER BY t.value DESC, u.id ASC
    LIMIT ?2";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(Timeframe::Daily.start(today).as_deref(), Some("2024-03-10"));
        assert_eq!(Timeframe::Weekly.start(today).as_deref(), Some("2024-03-03"));
        assert_eq!(Timeframe::Monthly.start(today).as_deref(), Some("2024-02-09"));
        assert_eq!(Timeframe::AllTime.start(today), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("all-time".parse::<Timeframe>(), Ok(Timeframe::AllTime));
        assert_eq!("questions".parse::<Category>(), Ok(Category::QuestionsAnswered));
        assert!("yearly".parse::<Timeframe>().is_err());
    }
}
