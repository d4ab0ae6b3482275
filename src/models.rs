//! Typed rows of the tables the core reads
//!
//! Each struct maps one table (or a fixed projection of it) through
//! [`FromRow`], reading columns by name.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::store::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Progression state of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevel {
    pub user_id: i64,
    pub current_level: u32,
    /// XP accumulated toward the next level
    pub current_xp: i64,
    /// Every XP point ever granted
    pub total_xp: i64,
}

impl UserLevel {
    /// Fresh state written at registration
    pub fn initial(user_id: i64) -> Self {
        Self {
            user_id,
            current_level: 1,
            current_xp: 0,
            total_xp: 0,
        }
    }
}

impl FromRow for UserLevel {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            current_level: row.get("current_level")?,
            current_xp: row.get("current_xp")?,
            total_xp: row.get("total_xp")?,
        })
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    /// Stored requirement type, see `RequirementType`
    pub requirement_type: String,
    pub requirement_value: i64,
    /// XP granted when the badge is earned
    pub points: i64,
}

impl FromRow for Badge {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            icon: row.get("icon")?,
            category: row.get("category")?,
            requirement_type: row.get("requirement_type")?,
            requirement_value: row.get("requirement_value")?,
            points: row.get("points")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: i64,
    pub badge_id: i64,
    pub earned_date: String,
}

impl FromRow for UserBadge {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            badge_id: row.get("badge_id")?,
            earned_date: row.get("earned_date")?,
        })
    }
}

/// Ledger entry for XP granted outside activity accounting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpBonus {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub reason: String,
    pub awarded_at: String,
}

impl FromRow for XpBonus {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            amount: row.get("amount")?,
            reason: row.get("reason")?,
            awarded_at: row.get("awarded_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLog {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub topic: Option<String>,
    /// Minutes
    pub duration: i64,
    /// "YYYY-MM-DD"
    pub date: String,
    pub performance_rating: Option<i64>,
    pub notes: Option<String>,
}

impl FromRow for StudyLog {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            subject: row.get("subject")?,
            topic: row.get("topic")?,
            duration: row.get("duration")?,
            date: row.get("date")?,
            performance_rating: row.get("performance_rating")?,
            notes: row.get("notes")?,
        })
    }
}
