//! User records and profile statistics.
//!
//! Users carry cached activity counters (`completed_trips`, `saved_trips`,
//! `achievements_count`). The counters are mutated only by the journey,
//! saved-path and achievement operations, never recomputed on read.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Number of completed journeys
    pub completed_trips: u32,
    /// Number of currently saved paths
    pub saved_trips: u32,
    /// Number of unlocked achievements
    pub achievements_count: u32,
    /// Whether the account is active
    pub is_active: bool,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with zeroed counters.
    pub fn new(name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            completed_trips: 0,
            saved_trips: 0,
            achievements_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregated profile statistics, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatistics {
    pub total_journeys: u32,
    pub completed_journeys: u32,
    pub total_distance_km: f64,
    pub total_reviews: u32,
}

/// Store for user records.
pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    /// Create a new user store with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new user.
    pub fn insert(&self, user: &User) -> Result<(), UserError> {
        self.conn
            .execute(
                "INSERT INTO users (id, name, email, completed_trips, saved_trips,
                 achievements_count, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.completed_trips,
                    user.saved_trips,
                    user.achievements_count,
                    user.is_active as i32,
                    user.created_at.to_rfc3339(),
                    user.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| {
                if crate::storage::database::is_unique_violation(&e) {
                    UserError::EmailTaken(user.email.clone())
                } else {
                    UserError::DatabaseError(e)
                }
            })?;

        Ok(())
    }

    /// Get a user by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<User>, UserError> {
        self.conn
            .query_row(
                "SELECT id, name, email, completed_trips, saved_trips, achievements_count,
                        is_active, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                parse_user_row,
            )
            .optional()
            .map_err(UserError::DatabaseError)
    }

    /// Get an active user by ID, treating inactive accounts as missing.
    pub fn get_active(&self, id: Uuid) -> Result<User, UserError> {
        match self.get(id)? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(UserError::NotFound(id)),
        }
    }

    /// Compute profile statistics for a user.
    pub fn statistics(&self, user_id: Uuid) -> Result<UserStatistics, UserError> {
        let id = user_id.to_string();

        let total_journeys: u32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM journeys WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(UserError::DatabaseError)?;

        let (completed_journeys, total_distance_km): (u32, f64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(distance_traveled), 0)
                 FROM journeys WHERE user_id = ?1 AND status = 'completed'",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(UserError::DatabaseError)?;

        let total_reviews: u32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM reviews WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(UserError::DatabaseError)?;

        Ok(UserStatistics {
            total_journeys,
            completed_journeys,
            total_distance_km,
            total_reviews,
        })
    }
}

/// Parse a database row into a User.
pub(crate) fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let is_active: i32 = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(User {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1)?,
        email: row.get(2)?,
        completed_trips: row.get(3)?,
        saved_trips: row.get(4)?,
        achievements_count: row.get(5)?,
        is_active: is_active != 0,
        created_at: crate::storage::database::parse_timestamp(&created_at_str),
        updated_at: crate::storage::database::parse_timestamp(&updated_at_str),
    })
}

/// User store errors.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
