//! Users and activity rows
//!
//! The scope functions compose into larger transactions; [`ActivityRecorder`]
//! runs each of them in a transaction of its own.

use chrono::NaiveDate;
use rusqlite::params;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{StudyLog, User, UserBadge, UserLevel, XpBonus};
use crate::store::records::{self, Column, Table};
use crate::store::{StoreResult, TransactionCoordinator, TransactionScope};
use crate::time_bucket::day_bucket;

/// One study session as entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudySession {
    pub subject: String,
    pub topic: Option<String>,
    pub duration_minutes: u32,
    pub date: NaiveDate,
    /// 1 - 5
    pub performance_rating: Option<u8>,
    pub notes: Option<String>,
}

impl NewStudySession {
    pub fn new(subject: impl Into<String>, duration_minutes: u32, date: NaiveDate) -> Self {
        Self {
            subject: subject.into(),
            topic: None,
            duration_minutes,
            date,
            performance_rating: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Create a user together with its level-1 progression row
pub fn register_user(scope: &TransactionScope<'_>, username: &str) -> StoreResult<i64> {
    let user_id = records::insert(
        scope,
        Table::Users,
        &[(Column::Username, Value::Text(username.to_string()))],
    )?;
    let initial = UserLevel::initial(user_id);
    records::insert(
        scope,
        Table::UserLevels,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::CurrentLevel, Value::Integer(i64::from(initial.current_level))),
            (Column::CurrentXp, Value::Integer(initial.current_xp)),
            (Column::TotalXp, Value::Integer(initial.total_xp)),
        ],
    )?;
    info!(user_id, username, "Registered user");
    Ok(user_id)
}

pub fn find_user(scope: &TransactionScope<'_>, username: &str) -> StoreResult<Option<User>> {
    records::query_one(
        scope,
        "SELECT id, username, created_at FROM users WHERE username = ?1",
        params![username],
    )
}

pub fn log_study_session(
    scope: &TransactionScope<'_>,
    user_id: i64,
    session: &NewStudySession,
) -> StoreResult<i64> {
    records::insert(
        scope,
        Table::StudyLogs,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::Subject, Value::Text(session.subject.clone())),
            (Column::Topic, session.topic.clone().into()),
            (Column::Duration, Value::Integer(i64::from(session.duration_minutes))),
            (Column::Date, Value::Text(day_bucket(session.date))),
            (
                Column::PerformanceRating,
                Value::Integer(session.performance_rating.map_or(0, i64::from)),
            ),
            (Column::Notes, session.notes.clone().into()),
        ],
    )
}

pub fn add_goal(
    scope: &TransactionScope<'_>,
    user_id: i64,
    title: &str,
    deadline: NaiveDate,
) -> StoreResult<i64> {
    records::insert(
        scope,
        Table::Goals,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::Title, Value::Text(title.to_string())),
            (Column::Deadline, Value::Text(day_bucket(deadline))),
        ],
    )
}

/// `subject_results` is stored as JSON, e.g. `{"correct": 30, "wrong": 5}`
pub fn log_mock_exam(
    scope: &TransactionScope<'_>,
    user_id: i64,
    exam_type: &str,
    exam_date: NaiveDate,
    total_time: Option<u32>,
    subject_results: &serde_json::Value,
) -> StoreResult<i64> {
    records::insert(
        scope,
        Table::MockExams,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::ExamType, Value::Text(exam_type.to_string())),
            (Column::ExamDate, Value::Text(day_bucket(exam_date))),
            (Column::TotalTime, total_time.map(i64::from).into()),
            (Column::SubjectResults, Value::Text(subject_results.to_string())),
        ],
    )
}

pub fn log_mood(
    scope: &TransactionScope<'_>,
    user_id: i64,
    mood: &str,
    stress_level: Option<u8>,
    date: NaiveDate,
) -> StoreResult<i64> {
    records::insert(
        scope,
        Table::MoodLogs,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::Mood, Value::Text(mood.to_string())),
            (Column::StressLevel, stress_level.map(i64::from).into()),
            (Column::Date, Value::Text(day_bucket(date))),
        ],
    )
}

pub fn add_friendship(
    scope: &TransactionScope<'_>,
    user_id: i64,
    friend_id: i64,
    status: FriendshipStatus,
) -> StoreResult<i64> {
    records::insert(
        scope,
        Table::Friendships,
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::FriendId, Value::Integer(friend_id)),
            (Column::Status, Value::Text(status.as_str().to_string())),
        ],
    )
}

/// Change the status of a friendship request; returns rows changed
pub fn set_friendship_status(
    scope: &TransactionScope<'_>,
    user_id: i64,
    friend_id: i64,
    status: FriendshipStatus,
) -> StoreResult<usize> {
    records::update(
        scope,
        Table::Friendships,
        &[(Column::Status, Value::Text(status.as_str().to_string()))],
        &[
            (Column::UserId, Value::Integer(user_id)),
            (Column::FriendId, Value::Integer(friend_id)),
        ],
    )
}

/// Most recent sessions first
pub fn study_history(
    scope: &TransactionScope<'_>,
    user_id: i64,
    limit: u32,
) -> StoreResult<Vec<StudyLog>> {
    records::query_many(
        scope,
        "SELECT id, user_id, subject, topic, duration, date, performance_rating, notes
         FROM study_logs WHERE user_id = ?1
         ORDER BY date DESC, id DESC LIMIT ?2",
        params![user_id, limit],
    )
}

/// Bonus XP ledger in the order it was written
pub fn xp_ledger(scope: &TransactionScope<'_>, user_id: i64) -> StoreResult<Vec<XpBonus>> {
    records::query_many(
        scope,
        "SELECT id, user_id, amount, reason, awarded_at
         FROM xp_bonuses WHERE user_id = ?1 ORDER BY id",
        params![user_id],
    )
}

pub fn earned_badges(scope: &TransactionScope<'_>, user_id: i64) -> StoreResult<Vec<UserBadge>> {
    records::query_many(
        scope,
        "SELECT user_id, badge_id, earned_date
         FROM user_badges WHERE user_id = ?1 ORDER BY earned_date, badge_id",
        params![user_id],
    )
}

/// Each write in its own transaction
#[derive(Clone)]
pub struct ActivityRecorder {
    coordinator: TransactionCoordinator,
}

impl ActivityRecorder {
    pub fn new(coordinator: TransactionCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn register_user(&self, username: &str) -> StoreResult<i64> {
        self.coordinator.with_transaction(|tx| register_user(tx, username))
    }

    pub fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        self.coordinator.with_read_transaction(|tx| find_user(tx, username))
    }

    pub fn log_study_session(&self, user_id: i64, session: &NewStudySession) -> StoreResult<i64> {
        self.coordinator
            .with_transaction(|tx| log_study_session(tx, user_id, session))
    }

    pub fn study_history(&self, user_id: i64, limit: u32) -> StoreResult<Vec<StudyLog>> {
        self.coordinator
            .with_read_transaction(|tx| study_history(tx, user_id, limit))
    }

    pub fn xp_ledger(&self, user_id: i64) -> StoreResult<Vec<XpBonus>> {
        self.coordinator.with_read_transaction(|tx| xp_ledger(tx, user_id))
    }

    pub fn earned_badges(&self, user_id: i64) -> StoreResult<Vec<UserBadge>> {
        self.coordinator
            .with_read_transaction(|tx| earned_badges(tx, user_id))
    }

    pub fn add_goal(&self, user_id: i64, title: &str, deadline: NaiveDate) -> StoreResult<i64> {
        self.coordinator
            .with_transaction(|tx| add_goal(tx, user_id, title, deadline))
    }

    pub fn log_mock_exam(
        &self,
        user_id: i64,
        exam_type: &str,
        exam_date: NaiveDate,
        total_time: Option<u32>,
        subject_results: &serde_json::Value,
    ) -> StoreResult<i64> {
        self.coordinator.with_transaction(|tx| {
            log_mock_exam(tx, user_id, exam_type, exam_date, total_time, subject_results)
        })
    }

    pub fn log_mood(
        &self,
        user_id: i64,
        mood: &str,
        stress_level: Option<u8>,
        date: NaiveDate,
    ) -> StoreResult<i64> {
        self.coordinator
            .with_transaction(|tx| log_mood(tx, user_id, mood, stress_level, date))
    }

    pub fn add_friendship(
        &self,
        user_id: i64,
        friend_id: i64,
        status: FriendshipStatus,
    ) -> StoreResult<i64> {
        self.coordinator
            .with_transaction(|tx| add_friendship(tx, user_id, friend_id, status))
    }

    pub fn set_friendship_status(
        &self,
        user_id: i64,
        friend_id: i64,
        status: FriendshipStatus,
    ) -> StoreResult<usize> {
        self.coordinator
            .with_transaction(|tx| set_friendship_status(tx, user_id, friend_id, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PoolConfig, RetryPolicy, Store, StoreError};
    use tempfile::tempdir;

    fn recorder(dir: &std::path::Path) -> ActivityRecorder {
        let store = Store::open(
            PoolConfig::new(dir.join("activity.db")).with_max_size(2),
            RetryPolicy::default(),
        )
        .unwrap();
        ActivityRecorder::new(store.coordinator().clone())
    }

    #[test]
    fn test_register_creates_level_row() {
        let dir = tempdir().unwrap();
        let recorder = recorder(dir.path());
        let id = recorder.register_user("ayse").unwrap();

        let user = recorder.find_user("ayse").unwrap().unwrap();
        assert_eq!(user.id, id);

        let level: (u32, i64) = recorder
            .coordinator
            .with_read_transaction(|tx| {
                Ok(tx.query_row(
                    "SELECT current_level, total_xp FROM user_levels WHERE user_id = ?1",
                    [id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(level, (1, 0));
    }

    #[test]
    fn test_duplicate_username_rolls_back_whole_registration() {
        let dir = tempdir().unwrap();
        let recorder = recorder(dir.path());
        recorder.register_user("ayse").unwrap();

        let err = recorder.register_user("ayse").unwrap_err();
        assert!(matches!(err, StoreError::TransactionFailed { attempts: 1, .. }));

        let levels: i64 = recorder
            .coordinator
            .with_read_transaction(|tx| {
                Ok(tx.query_row("SELECT COUNT(*) FROM user_levels", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(levels, 1);
    }

    #[test]
    fn test_accepting_a_friendship() {
        let dir = tempdir().unwrap();
        let recorder = recorder(dir.path());
        let a = recorder.register_user("ayse").unwrap();
        let b = recorder.register_user("mehmet").unwrap();

        recorder.add_friendship(a, b, FriendshipStatus::Pending).unwrap();
        let changed = recorder
            .set_friendship_status(a, b, FriendshipStatus::Accepted)
            .unwrap();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_study_history_newest_first() {
        let dir = tempdir().unwrap();
        let recorder = recorder(dir.path());
        let id = recorder.register_user("ayse").unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        let mut rated = NewStudySession::new("Fizik", 45, day(9));
        rated.topic = Some("Optik".to_string());
        rated.performance_rating = Some(4);
        recorder.log_study_session(id, &rated).unwrap();
        recorder
            .log_study_session(id, &NewStudySession::new("Tarih", 30, day(10)))
            .unwrap();
        recorder
            .log_study_session(id, &NewStudySession::new("Kimya", 20, day(1)))
            .unwrap();

        let history = recorder.study_history(id, 2).unwrap();
        let subjects: Vec<&str> = history.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Tarih", "Fizik"]);
        assert_eq!(history[0].date, "2024-03-10");
        assert_eq!(history[0].performance_rating, Some(0));
        assert_eq!(history[1].topic.as_deref(), Some("Optik"));
        assert_eq!(history[1].duration, 45);
    }

    #[test]
    fn test_ledger_and_badges_start_empty() {
        let dir = tempdir().unwrap();
        let recorder = recorder(dir.path());
        let id = recorder.register_user("ayse").unwrap();

        assert!(recorder.xp_ledger(id).unwrap().is_empty());
        assert!(recorder.earned_badges(id).unwrap().is_empty());
        assert!(recorder.study_history(id, 10).unwrap().is_empty());
    }
}
