//! Database schema definitions for Trailhead.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    completed_trips INTEGER NOT NULL DEFAULT 0,
    saved_trips INTEGER NOT NULL DEFAULT 0,
    achievements_count INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_is_active ON users(is_active);

-- Activity tags table
CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    icon TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

-- Paths table
CREATE TABLE IF NOT EXISTS paths (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    location TEXT NOT NULL,
    length_km REAL NOT NULL,
    estimated_duration INTEGER NOT NULL,
    difficulty TEXT NOT NULL,
    coordinates_json TEXT,
    rating REAL NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,
    is_featured INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_by TEXT REFERENCES users(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_paths_active_featured ON paths(is_active, is_featured);
CREATE INDEX IF NOT EXISTS idx_paths_difficulty ON paths(difficulty);
CREATE INDEX IF NOT EXISTS idx_paths_rating ON paths(rating);

-- Pivot table for path activities
CREATE TABLE IF NOT EXISTS path_activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path_id TEXT NOT NULL REFERENCES paths(id) ON DELETE CASCADE,
    activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE(path_id, activity_id)
);

-- Journeys table
CREATE TABLE IF NOT EXISTS journeys (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    path_id TEXT NOT NULL REFERENCES paths(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'started',
    started_at TEXT NOT NULL,
    completed_at TEXT,
    distance_traveled REAL,
    actual_duration INTEGER,
    visited_checkpoints INTEGER NOT NULL DEFAULT 0,
    recorded_positions_json TEXT,
    weather_conditions_json TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_journeys_user_status ON journeys(user_id, status);
CREATE INDEX IF NOT EXISTS idx_journeys_path_status ON journeys(path_id, status);
CREATE INDEX IF NOT EXISTS idx_journeys_started_at ON journeys(started_at);

-- At most one active journey per user, enforced by the store itself
CREATE UNIQUE INDEX IF NOT EXISTS idx_journeys_one_active
    ON journeys(user_id) WHERE status IN ('started', 'paused');

-- Reviews table
CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    path_id TEXT NOT NULL REFERENCES paths(id) ON DELETE CASCADE,
    rating INTEGER NOT NULL,
    comment TEXT,
    is_approved INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, path_id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_path_approved ON reviews(path_id, is_approved);

-- Saved paths table
CREATE TABLE IF NOT EXISTS saved_paths (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    path_id TEXT NOT NULL REFERENCES paths(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, path_id)
);

-- Achievement definitions table
CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT,
    points INTEGER NOT NULL DEFAULT 0,
    requirements_json TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_achievements_category ON achievements(category);
CREATE INDEX IF NOT EXISTS idx_achievements_is_active ON achievements(is_active);

-- Per-user achievement progress table
CREATE TABLE IF NOT EXISTS user_achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    achievement_id TEXT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
    progress REAL NOT NULL DEFAULT 0,
    unlocked_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, achievement_id)
);

CREATE INDEX IF NOT EXISTS idx_user_achievements_unlocked ON user_achievements(user_id, unlocked_at);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
