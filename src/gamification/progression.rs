//! XP grants and level transitions
//!
//! Every mutating operation takes the [`TransactionScope`] it runs in, so a
//! grant composes atomically with whatever else the caller does in that scope.

use chrono::Utc;
use rusqlite::params;
use rusqlite::types::Value;
use tracing::{debug, info};

use super::levels::{LevelCurve, LevelInfo};
use super::xp::{ActivityType, XpRates};
use crate::models::UserLevel;
use crate::store::records::{self, Column, Table};
use crate::store::{StoreError, StoreResult, TransactionScope};

/// Upper bound of a single bonus grant unless configured otherwise
pub const DEFAULT_MAX_BONUS_XP: i64 = 1000;

#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    rates: XpRates,
    curve: LevelCurve,
    max_bonus_xp: i64,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self {
            rates: XpRates::default(),
            curve: LevelCurve::default(),
            max_bonus_xp: DEFAULT_MAX_BONUS_XP,
        }
    }
}

impl ProgressionEngine {
    /// Fails with [`StoreError::Config`] when the curve or the bonus cap is
    /// unusable.
    pub fn new(rates: XpRates, curve: LevelCurve, max_bonus_xp: i64) -> StoreResult<Self> {
        curve.validate()?;
        if max_bonus_xp < 1 {
            return Err(StoreError::Config(format!(
                "max_bonus_xp must be at least 1, got {max_bonus_xp}"
            )));
        }
        Ok(Self {
            rates,
            curve,
            max_bonus_xp,
        })
    }

    pub fn rates(&self) -> &XpRates {
        &self.rates
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// XP earned by one activity; pure
    pub fn xp_for_activity(&self, activity: ActivityType, duration_minutes: u32) -> u32 {
        self.rates.xp_for(activity, duration_minutes)
    }

    /// Stored progression of a user, or the initial state if none exists yet
    pub fn user_level(&self, scope: &TransactionScope<'_>, user_id: i64) -> StoreResult<UserLevel> {
        Ok(load(scope, user_id)?.unwrap_or_else(|| UserLevel::initial(user_id)))
    }

    /// Read-only level view
    pub fn level_info(&self, scope: &TransactionScope<'_>, user_id: i64) -> StoreResult<LevelInfo> {
        let level = self.user_level(scope, user_id)?;
        Ok(self.info(level.current_level, level))
    }

    /// Add `amount` XP to a user and apply every level-up it causes.
    ///
    /// A missing `user_levels` row is created at level 1 first. Non-positive
    /// amounts fail with [`StoreError::InvalidAmount`] and change nothing.
    pub fn grant_xp(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        amount: i64,
    ) -> StoreResult<LevelInfo> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let before = match load(scope, user_id)? {
            Some(level) => level,
            None => {
                records::insert(
                    scope,
                    Table::UserLevels,
                    &[(Column::UserId, Value::Integer(user_id))],
                )?;
                UserLevel::initial(user_id)
            }
        };

        let (level, current_xp) = self
            .curve
            .advance(before.current_level, before.current_xp, amount);
        let after = UserLevel {
            user_id,
            current_level: level,
            current_xp,
            total_xp: before.total_xp.saturating_add(amount),
        };

        records::update(
            scope,
            Table::UserLevels,
            &[
                (Column::CurrentLevel, Value::Integer(i64::from(after.current_level))),
                (Column::CurrentXp, Value::Integer(after.current_xp)),
                (Column::TotalXp, Value::Integer(after.total_xp)),
                (Column::UpdatedAt, Value::Text(timestamp())),
            ],
            &[(Column::UserId, Value::Integer(user_id))],
        )?;

        let info = self.info(before.current_level, after);
        if info.leveled_up {
            info!(
                user_id,
                from = info.previous_level,
                to = info.level,
                "Level up"
            );
        } else {
            debug!(user_id, amount, total_xp = info.total_xp, "XP granted");
        }
        Ok(info)
    }

    /// Grant XP outside activity accounting and record it in the bonus ledger.
    ///
    /// The amount is clamped to the configured maximum.
    pub fn award_bonus_xp(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        reason: &str,
        amount: i64,
    ) -> StoreResult<LevelInfo> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }
        let amount = amount.min(self.max_bonus_xp);
        self.record_bonus(scope, user_id, reason, amount)?;
        self.grant_xp(scope, user_id, amount)
    }

    /// Grant the XP one activity is worth. Returns `None` when it is worth
    /// nothing.
    pub fn record_activity(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        activity: ActivityType,
        duration_minutes: u32,
    ) -> StoreResult<Option<LevelInfo>> {
        let xp = self.xp_for_activity(activity, duration_minutes);
        if xp == 0 {
            return Ok(None);
        }
        debug!(user_id, %activity, xp, "Recording activity");
        self.grant_xp(scope, user_id, i64::from(xp)).map(Some)
    }

    /// [`record_activity`](Self::record_activity) for a textual activity
    /// name. Unknown names are worth nothing and grant nothing.
    pub fn record_named_activity(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        activity: &str,
        duration_minutes: u32,
    ) -> StoreResult<Option<LevelInfo>> {
        let xp = self.rates.xp_for_name(activity, duration_minutes);
        if xp == 0 {
            return Ok(None);
        }
        debug!(user_id, activity, xp, "Recording activity");
        self.grant_xp(scope, user_id, i64::from(xp)).map(Some)
    }

    /// Append a ledger row without touching levels
    pub(crate) fn record_bonus(
        &self,
        scope: &TransactionScope<'_>,
        user_id: i64,
        reason: &str,
        amount: i64,
    ) -> StoreResult<i64> {
        records::insert(
            scope,
            Table::XpBonuses,
            &[
                (Column::UserId, Value::Integer(user_id)),
                (Column::Amount, Value::Integer(amount)),
                (Column::Reason, Value::Text(reason.to_string())),
            ],
        )
    }

    fn info(&self, previous_level: u32, after: UserLevel) -> LevelInfo {
        LevelInfo {
            user_id: after.user_id,
            previous_level,
            level: after.current_level,
            current_xp: after.current_xp,
            total_xp: after.total_xp,
            leveled_up: after.current_level > previous_level,
            xp_for_next: self.curve.threshold_for(after.current_level),
        }
    }
}

fn load(scope: &TransactionScope<'_>, user_id: i64) -> StoreResult<Option<UserLevel>> {
    records::query_one(
        scope,
        "SELECT user_id, current_level, current_xp, total_xp FROM user_levels WHERE user_id = ?1",
        params![user_id],
    )
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
