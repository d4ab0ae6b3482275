//! Badge rule evaluation and exactly-once awarding
//!
//! The `UNIQUE (user_id, badge_id)` constraint on `user_badges` is what makes
//! an award happen once. A concurrent evaluation that loses the race sees a
//! constraint violation, which is treated as "already awarded".

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::definitions::RequirementType;
use super::levels::LevelInfo;
use super::progression::ProgressionEngine;
use super::requirements::measure;
use crate::models::{Badge, UserBadge};
use crate::store::records::{self, Column, FromRow, Table};
use crate::store::{StoreResult, TransactionScope};
use crate::time_bucket::today;

/// A badge granted by one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub badge: Badge,
    /// Level state after the badge's XP was granted
    pub level: Option<LevelInfo>,
}

/// How close a user is to one badge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub badge: Badge,
    pub measured: f64,
    /// 0 - 100
    pub percentage: f64,
    pub earned_date: Option<String>,
}

impl BadgeProgress {
    pub fn is_earned(&self) -> bool {
        self.earned_date.is_some()
    }
}

/// Catalog badge joined with the user's award, if any
struct CatalogRow {
    badge: Badge,
    earned: Option<UserBadge>,
}

impl FromRow for CatalogRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let earned = match row.get::<_, Option<i64>>("badge_id")? {
            Some(_) => Some(UserBadge::from_row(row)?),
            None => None,
        };
        Ok(Self {
            badge: Badge::from_row(row)?,
            earned,
        })
    }
}

/// Outcome of one award attempt
enum Award {
    Granted,
    /// Another scope already holds the row
    DuplicateAward,
}

#[derive(Debug, Clone, Default)]
pub struct BadgeEvaluator {
    engine: ProgressionEngine,
}

impl BadgeEvaluator {
    pub fn new(engine: ProgressionEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Award every badge whose requirement the user now meets
    pub fn check_and_award_badges(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
    ) -> StoreResult<Vec<AwardedBadge>> {
        self.check_and_award_badges_on(scope, user_id, today())
    }

    /// Same as [`check_and_award_badges`](Self::check_and_award_badges) with
    /// an explicit "today" for day-relative requirements
    pub fn check_and_award_badges_on(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        today: NaiveDate,
    ) -> StoreResult<Vec<AwardedBadge>> {
        let candidates: Vec<Badge> = records::query_many(
            scope,
            "SELECT b.id, b.name, b.description, b.icon, b.category,
                    b.requirement_type, b.requirement_value, b.points
             FROM badges b
             WHERE NOT EXISTS (
                 SELECT 1 FROM user_badges ub WHERE ub.user_id = ?1 AND ub.badge_id = b.id
             )
             ORDER BY b.id",
            params![user_id],
        )?;

        let mut awarded = Vec::new();
        for badge in candidates {
            let Some(requirement) = RequirementType::from_str(&badge.requirement_type) else {
                warn!(
                    badge = %badge.name,
                    requirement_type = %badge.requirement_type,
                    "Unknown badge requirement type, skipping"
                );
                continue;
            };

            let measured = measure(scope, user_id, requirement, today)?;
            if measured < badge.requirement_value as f64 {
                continue;
            }

            match self.try_award(scope, user_id, &badge)? {
                Award::Granted => {
                    let level = self.reward(scope, user_id, &badge)?;
                    info!(user_id, badge = %badge.name, "Badge earned");
                    awarded.push(AwardedBadge { badge, level });
                }
                Award::DuplicateAward => {
                    debug!(user_id, badge = %badge.name, "Badge already awarded");
                }
            }
        }
        Ok(awarded)
    }

    /// Every catalog badge with the user's measured value and earned date
    pub fn badge_progress(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
    ) -> StoreResult<Vec<BadgeProgress>> {
        self.badge_progress_on(scope, user_id, today())
    }

    pub fn badge_progress_on(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        today: NaiveDate,
    ) -> StoreResult<Vec<BadgeProgress>> {
        let rows: Vec<CatalogRow> = records::query_many(
            scope,
            "SELECT b.id, b.name, b.description, b.icon, b.category,
                    b.requirement_type, b.requirement_value, b.points,
                    ub.user_id, ub.badge_id, ub.earned_date
             FROM badges b
             LEFT JOIN user_badges ub ON ub.badge_id = b.id AND ub.user_id = ?1
             ORDER BY b.id",
            params![user_id],
        )?;

        let mut progress = Vec::with_capacity(rows.len());
        for CatalogRow { badge, earned } in rows {
            let earned_date = earned.map(|e| e.earned_date);
            let measured = match RequirementType::from_str(&badge.requirement_type) {
                Some(requirement) => measure(scope, user_id, requirement, today)?,
                None => {
                    warn!(
                        requirement_type = %badge.requirement_type,
                        "Unknown badge requirement type"
                    );
                    0.0
                }
            };
            let percentage = if earned_date.is_some() || badge.requirement_value <= 0 {
                100.0
            } else {
                (measured / badge.requirement_value as f64 * 100.0).min(100.0)
            };
            progress.push(BadgeProgress {
                badge,
                measured,
                percentage,
                earned_date,
            });
        }
        Ok(progress)
    }

    fn try_award(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        badge: &Badge,
    ) -> StoreResult<Award> {
        let result = records::insert(
            scope,
            Table::UserBadges,
            &[
                (Column::UserId, Value::Integer(user_id)),
                (Column::BadgeId, Value::Integer(badge.id)),
            ],
        );
        match result {
            Ok(_) => Ok(Award::Granted),
            Err(e) if e.is_unique_violation() => Ok(Award::DuplicateAward),
            Err(e) => Err(e),
        }
    }

    /// Ledger row plus the badge's XP
    fn reward(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        badge: &Badge,
    ) -> StoreResult<Option<LevelInfo>> {
        if badge.points <= 0 {
            return Ok(None);
        }
        let reason = format!("Badge earned: {}", badge.name);
        self.engine.record_bonus(scope, user_id, &reason, badge.points)?;
        self.engine.grant_xp(scope, user_id, badge.points).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PoolConfig, RetryPolicy, Store};
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> Store {
        let store = Store::open(
            PoolConfig::new(dir.join("badges.db")).with_max_size(2),
            RetryPolicy::default(),
        )
        .unwrap();
        store
            .coordinator()
            .with_transaction(|tx| {
                tx.execute_batch(
                    "INSERT INTO users (id, username) VALUES (1, 'ayse');
                     INSERT INTO user_levels (user_id) VALUES (1);",
                )?;
                Ok(())
            })
            .unwrap();
        store
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_registration_and_first_session_awarded_once() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let evaluator = BadgeEvaluator::default();
        let c = store.coordinator();

        c.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO study_logs (user_id, subject, duration, date)
                 VALUES (1, 'Fizik', 30, '2024-03-10')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let first = c
            .with_transaction(|tx| evaluator.check_and_award_badges_on(tx, 1, day()))
            .unwrap();
        let names: Vec<_> = first.iter().map(|a| a.badge.name.as_str()).collect();
        assert_eq!(names, ["Hoş Geldin!", "İlk Adım"]);

        let second = c
            .with_transaction(|tx| evaluator.check_and_award_badges_on(tx, 1, day()))
            .unwrap();
        assert!(second.is_empty());

        let total_xp: i64 = c
            .with_read_transaction(|tx| {
                Ok(tx.query_row(
                    "SELECT total_xp FROM user_levels WHERE user_id = 1",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(total_xp, 200);
    }

    #[test]
    fn test_unknown_requirement_type_is_skipped() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let evaluator = BadgeEvaluator::default();
        let c = store.coordinator();

        c.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO badges
                    (name, description, icon, category, requirement_type, requirement_value)
                 VALUES ('Planner', 'Plan five days', '📅', 'planning', 'study_plans', 0)",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let awarded = c
            .with_transaction(|tx| evaluator.check_and_award_badges_on(tx, 1, day()))
            .unwrap();
        assert!(awarded.iter().all(|a| a.badge.name != "Planner"));
    }

    #[test]
    fn test_badge_progress_percentages() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let evaluator = BadgeEvaluator::default();
        let c = store.coordinator();

        c.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO study_logs (user_id, subject, duration, date)
                 VALUES (1, 'Matematik', 90, '2024-03-10')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let progress = c
            .with_read_transaction(|tx| evaluator.badge_progress_on(tx, 1, day()))
            .unwrap();
        let math = progress
            .iter()
            .find(|p| p.badge.requirement_type == "math_hours")
            .unwrap();
        assert!((math.percentage - 50.0).abs() < 1e-9);
        assert!(!math.is_earned());

        let grind = progress
            .iter()
            .find(|p| p.badge.name == "YKS Savaşçısı")
            .unwrap();
        assert!((grind.measured - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_award_is_swallowed() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let evaluator = BadgeEvaluator::default();
        let c = store.coordinator();

        c.with_transaction(|tx| {
            let badge: Badge = records::query_one(
                tx,
                "SELECT id, name, description, icon, category,
                        requirement_type, requirement_value, points
                 FROM badges WHERE name = ?1",
                params!["Hoş Geldin!"],
            )?
            .unwrap();
            // Row written by a scope that won the race
            tx.execute(
                "INSERT INTO user_badges (user_id, badge_id) VALUES (1, ?1)",
                [badge.id],
            )?;

            assert!(matches!(
                evaluator.try_award(tx, 1, &badge)?,
                Award::DuplicateAward
            ));

            // The failed insert leaves the transaction open
            let held: i64 = tx.query_row(
                "SELECT COUNT(*) FROM user_badges WHERE user_id = 1",
                [],
                |r| r.get(0),
            )?;
            assert_eq!(held, 1);
            Ok(())
        })
        .unwrap();

        let (total_xp, ledger): (i64, i64) = c
            .with_read_transaction(|tx| {
                Ok(tx.query_row(
                    "SELECT (SELECT total_xp FROM user_levels WHERE user_id = 1),
                            (SELECT COUNT(*) FROM xp_bonuses WHERE user_id = 1)",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!((total_xp, ledger), (0, 0));

        let progress = c
            .with_read_transaction(|tx| evaluator.badge_progress_on(tx, 1, day()))
            .unwrap();
        let welcome = progress
            .iter()
            .find(|p| p.badge.name == "Hoş Geldin!")
            .unwrap();
        assert!(welcome.is_earned());
    }
}
