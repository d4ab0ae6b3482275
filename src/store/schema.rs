//! Schema bootstrap and migrations
//!
//! Creates every table the core reads or writes, applies pending migrations
//! and seeds the badge catalog. Safe to run on every start.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::error::StoreResult;
use crate::gamification::definitions::DEFAULT_BADGES;

/// Latest schema version this build knows how to migrate to
pub const SCHEMA_VERSION: i64 = 3;

/// Create tables, run migrations and seed badges
pub fn initialize(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    run_migrations(conn)?;
    seed_badges(conn)?;
    Ok(())
}

/// Current schema version (0 for a fresh file)
pub fn schema_version(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?)
}

fn run_migrations(conn: &Connection) -> StoreResult<()> {
    let version = schema_version(conn)?;

    // Migration 2: badge XP reward, older files only had the catalog fields
    if version < 2 {
        if !has_column(conn, "badges", "points")? {
            conn.execute_batch(
                "ALTER TABLE badges ADD COLUMN points INTEGER NOT NULL DEFAULT 100;",
            )?;
        }
        conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        debug!("Applied schema migration 2");
    }

    // Migration 3: activity indexes used by the evaluator and the leaderboard
    if version < 3 {
        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_study_logs_user_date ON study_logs(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_mock_exams_user_date ON mock_exams(user_id, exam_date);
            CREATE INDEX IF NOT EXISTS idx_mood_logs_user ON mood_logs(user_id);
            CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);
            CREATE INDEX IF NOT EXISTS idx_friendships_user ON friendships(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_xp_bonuses_user ON xp_bonuses(user_id);
            "#,
        )?;
        conn.execute("INSERT OR REPLACE INTO schema_version VALUES (3)", [])?;
        debug!("Applied schema migration 3");
    }

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

fn seed_badges(conn: &Connection) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO badges
            (name, description, icon, category, requirement_type, requirement_value, points)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut inserted = 0;
    for badge in DEFAULT_BADGES {
        inserted += stmt.execute(params![
            badge.name,
            badge.description,
            badge.icon,
            badge.category,
            badge.requirement.as_str(),
            badge.requirement_value,
            badge.points,
        ])?;
    }
    if inserted > 0 {
        info!(count = inserted, "Seeded default badges");
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS user_levels (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL UNIQUE,
    current_level INTEGER NOT NULL DEFAULT 1 CHECK (current_level >= 1),
    current_xp INTEGER NOT NULL DEFAULT 0 CHECK (current_xp >= 0),
    total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS badges (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    category TEXT NOT NULL,
    requirement_type TEXT NOT NULL,
    requirement_value INTEGER NOT NULL,
    points INTEGER NOT NULL DEFAULT 100
);

CREATE TABLE IF NOT EXISTS user_badges (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    badge_id INTEGER NOT NULL,
    earned_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (user_id, badge_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (badge_id) REFERENCES badges(id) ON DELETE CASCADE
);

-- Append-only ledger of XP granted outside activity accounting
CREATE TABLE IF NOT EXISTS xp_bonuses (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    amount INTEGER NOT NULL,
    reason TEXT NOT NULL,
    awarded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS study_logs (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    subject TEXT NOT NULL,
    topic TEXT,
    duration INTEGER NOT NULL DEFAULT 0,
    date TEXT NOT NULL,
    performance_rating INTEGER DEFAULT 0 CHECK (performance_rating BETWEEN 0 AND 5),
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    deadline TEXT NOT NULL,
    progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- subject_results holds a JSON object, e.g. {"correct": 30, "wrong": 5}
CREATE TABLE IF NOT EXISTS mock_exams (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    exam_type TEXT NOT NULL,
    exam_date TEXT NOT NULL,
    total_time INTEGER,
    subject_results TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS mood_logs (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    mood TEXT NOT NULL,
    stress_level INTEGER CHECK (stress_level BETWEEN 1 AND 5),
    notes TEXT,
    date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS friendships (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    friend_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'accepted', 'rejected')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (user_id, friend_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (friend_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
