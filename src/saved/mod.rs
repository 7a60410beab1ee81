//! Saved (favorited) paths with per-user counter maintenance.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::paths::store::{parse_path_row, PATH_COLUMNS};
use crate::paths::Path;

/// Manager for a user's saved paths.
pub struct SavedPathManager<'a> {
    conn: &'a mut Connection,
}

impl<'a> SavedPathManager<'a> {
    /// Create a saved-path manager with a database connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Save a path for a user, bumping the `saved_trips` counter.
    pub fn save(&mut self, user_id: Uuid, path_id: Uuid) -> Result<(), SavedPathError> {
        let path_active: Option<i32> = self
            .conn
            .query_row(
                "SELECT is_active FROM paths WHERE id = ?1",
                params![path_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match path_active {
            Some(1) => {}
            _ => return Err(SavedPathError::PathNotFound(path_id)),
        }

        if self.is_saved(user_id, path_id)? {
            return Err(SavedPathError::AlreadySaved);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO saved_paths (user_id, path_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id.to_string(), path_id.to_string(), now],
        )
        .map_err(|e| {
            if crate::storage::database::is_unique_violation(&e) {
                SavedPathError::AlreadySaved
            } else {
                SavedPathError::DatabaseError(e)
            }
        })?;

        tx.execute(
            "UPDATE users SET saved_trips = saved_trips + 1, updated_at = ?2 WHERE id = ?1",
            params![user_id.to_string(), now],
        )?;

        tx.commit()?;

        tracing::info!(user = %user_id, path = %path_id, "Path saved");
        Ok(())
    }

    /// Remove a saved path, decrementing the `saved_trips` counter.
    pub fn unsave(&mut self, user_id: Uuid, path_id: Uuid) -> Result<(), SavedPathError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM saved_paths WHERE user_id = ?1 AND path_id = ?2",
            params![user_id.to_string(), path_id.to_string()],
        )?;

        if removed == 0 {
            return Err(SavedPathError::NotSaved);
        }

        tx.execute(
            "UPDATE users SET saved_trips = MAX(saved_trips - 1, 0), updated_at = ?2
             WHERE id = ?1",
            params![user_id.to_string(), now],
        )?;

        tx.commit()?;

        tracing::info!(user = %user_id, path = %path_id, "Path unsaved");
        Ok(())
    }

    /// Whether the user has saved the path.
    pub fn is_saved(&self, user_id: Uuid, path_id: Uuid) -> Result<bool, SavedPathError> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM saved_paths WHERE user_id = ?1 AND path_id = ?2)",
                params![user_id.to_string(), path_id.to_string()],
                |row| row.get(0),
            )
            .map_err(SavedPathError::from)
    }

    /// The user's saved paths, most recently saved first.
    pub fn saved_paths(&self, user_id: Uuid) -> Result<Vec<Path>, SavedPathError> {
        let columns = PATH_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {columns} FROM paths p
             JOIN saved_paths sp ON sp.path_id = p.id
             WHERE sp.user_id = ?1
             ORDER BY sp.created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string()], parse_path_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(SavedPathError::from)
    }
}

/// Saved-path errors.
#[derive(Debug, thiserror::Error)]
pub enum SavedPathError {
    #[error("Path not found: {0}")]
    PathNotFound(Uuid),

    #[error("Path already saved")]
    AlreadySaved,

    #[error("Path not saved")]
    NotSaved,

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
