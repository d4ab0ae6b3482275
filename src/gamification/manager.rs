//! Gamification facade
//!
//! Runs each progression, badge and summary operation in a transaction of its
//! own and reports what happened as [`GamificationEvent`]s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::evaluator::{AwardedBadge, BadgeEvaluator, BadgeProgress};
use super::levels::LevelInfo;
use super::progress::{activity_summary, ActivitySummary};
use super::progression::ProgressionEngine;
use super::xp::ActivityType;
use crate::activity::{self, NewStudySession};
use crate::store::{StoreResult, TransactionCoordinator};
use crate::time_bucket::today;

/// Ledger reason of [`GamificationManager::grant_xp`]
pub const MANUAL_GRANT_REASON: &str = "Manual grant";

/// Something the user should be told about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GamificationEvent {
    XpAwarded { amount: i64, reason: String },
    LevelUp { old_level: u32, new_level: u32 },
    BadgeEarned(AwardedBadge),
}

/// Result of logging a study session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyOutcome {
    pub log_id: i64,
    pub level: LevelInfo,
    pub events: Vec<GamificationEvent>,
}

#[derive(Clone)]
pub struct GamificationManager {
    coordinator: TransactionCoordinator,
    evaluator: BadgeEvaluator,
}

impl GamificationManager {
    pub fn new(coordinator: TransactionCoordinator, engine: ProgressionEngine) -> Self {
        Self {
            coordinator,
            evaluator: BadgeEvaluator::new(engine),
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        self.evaluator.engine()
    }

    pub fn evaluator(&self) -> &BadgeEvaluator {
        &self.evaluator
    }

    pub fn coordinator(&self) -> &TransactionCoordinator {
        &self.coordinator
    }

    /// XP one activity is worth; no database access
    pub fn xp_for_activity(&self, activity: ActivityType, duration_minutes: u32) -> u32 {
        self.engine().xp_for_activity(activity, duration_minutes)
    }

    /// Grant XP outside activity accounting. The grant is written to the bonus
    /// ledger as [`MANUAL_GRANT_REASON`] and is not clamped.
    pub fn grant_xp(&self, user_id: i64, amount: i64) -> StoreResult<LevelInfo> {
        self.coordinator.with_transaction(|tx| {
            let info = self.engine().grant_xp(tx, user_id, amount)?;
            self.engine().record_bonus(tx, user_id, MANUAL_GRANT_REASON, amount)?;
            Ok(info)
        })
    }

    pub fn award_bonus_xp(
        &self,
        user_id: i64,
        reason: &str,
        amount: i64,
    ) -> StoreResult<LevelInfo> {
        self.coordinator
            .with_transaction(|tx| self.engine().award_bonus_xp(tx, user_id, reason, amount))
    }

    pub fn record_activity(
        &self,
        user_id: i64,
        activity: ActivityType,
        duration_minutes: u32,
    ) -> StoreResult<Option<LevelInfo>> {
        self.coordinator.with_transaction(|tx| {
            self.engine()
                .record_activity(tx, user_id, activity, duration_minutes)
        })
    }

    /// `None` when the name is unknown or worth no XP
    pub fn record_named_activity(
        &self,
        user_id: i64,
        activity: &str,
        duration_minutes: u32,
    ) -> StoreResult<Option<LevelInfo>> {
        self.coordinator.with_transaction(|tx| {
            self.engine()
                .record_named_activity(tx, user_id, activity, duration_minutes)
        })
    }

    pub fn check_and_award_badges(&self, user_id: i64) -> StoreResult<Vec<AwardedBadge>> {
        self.coordinator
            .with_transaction(|tx| self.evaluator.check_and_award_badges(tx, user_id))
    }

    /// Store the session, grant its XP and award any badge it unlocks, all in
    /// one transaction.
    pub fn log_study_session(
        &self,
        user_id: i64,
        session: &NewStudySession,
    ) -> StoreResult<StudyOutcome> {
        self.log_study_session_on(user_id, session, today())
    }

    pub fn log_study_session_on(
        &self,
        user_id: i64,
        session: &NewStudySession,
        today: NaiveDate,
    ) -> StoreResult<StudyOutcome> {
        self.coordinator.with_transaction(|tx| {
            let engine = self.engine();
            let log_id = activity::log_study_session(tx, user_id, session)?;

            let mut events = Vec::new();
            let mut level = engine.level_info(tx, user_id)?;
            let start_level = level.level;

            let minutes = session.duration_minutes;
            let xp = engine.xp_for_activity(ActivityType::StudySession, minutes);
            if let Some(info) =
                engine.record_activity(tx, user_id, ActivityType::StudySession, minutes)?
            {
                events.push(GamificationEvent::XpAwarded {
                    amount: i64::from(xp),
                    reason: format!("Study session: {}", session.subject),
                });
                level = info;
            }

            for badge in self.evaluator.check_and_award_badges_on(tx, user_id, today)? {
                if let Some(info) = badge.level {
                    level = info;
                }
                events.push(GamificationEvent::BadgeEarned(badge));
            }

            if level.level > start_level {
                events.push(GamificationEvent::LevelUp {
                    old_level: start_level,
                    new_level: level.level,
                });
            }

            Ok(StudyOutcome {
                log_id,
                level,
                events,
            })
        })
    }

    pub fn level(&self, user_id: i64) -> StoreResult<LevelInfo> {
        self.coordinator
            .with_read_transaction(|tx| self.engine().level_info(tx, user_id))
    }

    pub fn badge_progress(&self, user_id: i64) -> StoreResult<Vec<BadgeProgress>> {
        self.coordinator
            .with_read_transaction(|tx| self.evaluator.badge_progress(tx, user_id))
    }

    pub fn activity_summary(&self, user_id: i64, days: u32) -> StoreResult<ActivitySummary> {
        self.coordinator
            .with_read_transaction(|tx| activity_summary(tx, user_id, days, today()))
    }
}
