//! MotiKoç - study tracking with XP, levels and badges
//!
//! The core is a transactional data-access layer over one SQLite file and a
//! gamification engine on top of it:
//!
//! 1. [`store`]: connection pool, retrying transaction coordinator and
//!    parameterized record helpers.
//! 2. [`gamification`]: XP grants and level transitions, badge evaluation with
//!    exactly-once awards.
//! 3. [`leaderboard`]: read-only ranked views.
//!
//! Activity rows (study logs, goals, mock exams, mood logs, friendships) are
//! written through [`activity`].

pub mod activity;
pub mod config;
pub mod gamification;
pub mod leaderboard;
pub mod models;
pub mod store;
pub mod time_bucket;

pub use config::Config;
pub use store::{Store, StoreError, StoreResult};
