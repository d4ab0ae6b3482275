//! XP, levels and badges
//!
//! ```text
//!   activity ──► ProgressionEngine ──► user_levels
//!                      ▲
//!   BadgeEvaluator ────┘──► user_badges, xp_bonuses
//! ```
//!
//! The engine and the evaluator work inside a caller's transaction scope;
//! [`GamificationManager`] wraps each operation in a scope of its own.

pub mod definitions;
mod evaluator;
mod levels;
mod manager;
mod progress;
mod progression;
pub mod requirements;
pub mod streaks;
mod xp;

pub use definitions::{BadgeDefinition, RequirementType, DEFAULT_BADGES};
pub use evaluator::{AwardedBadge, BadgeEvaluator, BadgeProgress};
pub use levels::{LevelCurve, LevelInfo};
pub use manager::{GamificationEvent, GamificationManager, StudyOutcome, MANUAL_GRANT_REASON};
pub use progress::{activity_summary, ActivitySummary};
pub use progression::{ProgressionEngine, DEFAULT_MAX_BONUS_XP};
pub use streaks::{current_streak, StreakInfo};
pub use xp::{ActivityType, XpRates};
