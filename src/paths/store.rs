//! Path and activity persistence.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{Activity, Coordinate, Difficulty, Path, PathError};
use crate::storage::database::parse_timestamp;

/// Column list shared by every path SELECT.
pub(crate) const PATH_COLUMNS: &str = "id, name, description, location, length_km, \
     estimated_duration, difficulty, coordinates_json, rating, review_count, \
     is_featured, is_active, created_by, created_at, updated_at";

/// Store for path records and their activity tags.
pub struct PathStore<'a> {
    conn: &'a mut Connection,
}

impl<'a> PathStore<'a> {
    /// Create a new path store with a database connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Insert a path and attach its activity tags in one transaction.
    pub fn insert(&mut self, path: &Path, activity_ids: &[Uuid]) -> Result<(), PathError> {
        let tx = self.conn.transaction()?;

        insert_path_row(&tx, path)?;
        for activity_id in activity_ids {
            attach_activity(&tx, path.id, *activity_id)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Update a path; when `activity_ids` is given the tag set is replaced.
    pub fn update(
        &mut self,
        path: &Path,
        activity_ids: Option<&[Uuid]>,
    ) -> Result<(), PathError> {
        let tx = self.conn.transaction()?;

        let coordinates_json = if path.coordinates.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&path.coordinates)?)
        };

        let rows_affected = tx.execute(
            "UPDATE paths SET name = ?2, description = ?3, location = ?4, length_km = ?5,
             estimated_duration = ?6, difficulty = ?7, coordinates_json = ?8,
             is_featured = ?9, is_active = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                path.id.to_string(),
                path.name,
                path.description,
                path.location,
                path.length_km,
                path.estimated_duration,
                path.difficulty.as_str(),
                coordinates_json,
                path.is_featured as i32,
                path.is_active as i32,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(PathError::NotFound(path.id));
        }

        if let Some(ids) = activity_ids {
            tx.execute(
                "DELETE FROM path_activities WHERE path_id = ?1",
                params![path.id.to_string()],
            )?;
            for activity_id in ids {
                attach_activity(&tx, path.id, *activity_id)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a path by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<Path>, PathError> {
        get_path(self.conn, id)
    }

    /// Insert a new activity tag.
    pub fn insert_activity(&self, activity: &Activity) -> Result<(), PathError> {
        self.conn.execute(
            "INSERT INTO activities (id, slug, name, icon, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.id.to_string(),
                activity.slug,
                activity.name,
                activity.icon,
                activity.is_active as i32,
                activity.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get an activity by slug.
    pub fn activity_by_slug(&self, slug: &str) -> Result<Option<Activity>, PathError> {
        self.conn
            .query_row(
                "SELECT id, slug, name, icon, is_active, created_at
                 FROM activities WHERE slug = ?1",
                params![slug],
                parse_activity_row,
            )
            .optional()
            .map_err(PathError::from)
    }

    /// List all active activity tags.
    pub fn list_activities(&self) -> Result<Vec<Activity>, PathError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, slug, name, icon, is_active, created_at
             FROM activities WHERE is_active = 1 ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], parse_activity_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }

    /// List the activity tags attached to a path.
    pub fn activities_for_path(&self, path_id: Uuid) -> Result<Vec<Activity>, PathError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.slug, a.name, a.icon, a.is_active, a.created_at
             FROM activities a
             JOIN path_activities pa ON pa.activity_id = a.id
             WHERE pa.path_id = ?1
             ORDER BY a.name ASC",
        )?;

        let rows = stmt.query_map(params![path_id.to_string()], parse_activity_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }
}

/// Insert a path row.
pub(crate) fn insert_path_row(conn: &Connection, path: &Path) -> Result<(), PathError> {
    let coordinates_json = if path.coordinates.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&path.coordinates)?)
    };

    conn.execute(
        "INSERT INTO paths (id, name, description, location, length_km, estimated_duration,
         difficulty, coordinates_json, rating, review_count, is_featured, is_active,
         created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            path.id.to_string(),
            path.name,
            path.description,
            path.location,
            path.length_km,
            path.estimated_duration,
            path.difficulty.as_str(),
            coordinates_json,
            path.rating,
            path.review_count,
            path.is_featured as i32,
            path.is_active as i32,
            path.created_by.map(|id| id.to_string()),
            path.created_at.to_rfc3339(),
            path.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Attach an activity tag to a path (idempotent).
fn attach_activity(conn: &Connection, path_id: Uuid, activity_id: Uuid) -> Result<(), PathError> {
    conn.execute(
        "INSERT OR IGNORE INTO path_activities (path_id, activity_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![
            path_id.to_string(),
            activity_id.to_string(),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Fetch a path by ID.
pub(crate) fn get_path(conn: &Connection, id: Uuid) -> Result<Option<Path>, PathError> {
    conn.query_row(
        &format!("SELECT {PATH_COLUMNS} FROM paths WHERE id = ?1"),
        params![id.to_string()],
        parse_path_row,
    )
    .optional()
    .map_err(PathError::from)
}

/// Parse a database row into a Path.
pub(crate) fn parse_path_row(row: &rusqlite::Row) -> rusqlite::Result<Path> {
    let id_str: String = row.get(0)?;
    let difficulty_str: String = row.get(6)?;
    let coordinates_json: Option<String> = row.get(7)?;
    let is_featured: i32 = row.get(10)?;
    let is_active: i32 = row.get(11)?;
    let created_by_str: Option<String> = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    let coordinates: Vec<Coordinate> = coordinates_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();

    Ok(Path {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        length_km: row.get(4)?,
        estimated_duration: row.get(5)?,
        difficulty: Difficulty::from_str(&difficulty_str).unwrap_or(Difficulty::Moderate),
        coordinates,
        rating: row.get(8)?,
        review_count: row.get(9)?,
        is_featured: is_featured != 0,
        is_active: is_active != 0,
        created_by: created_by_str.and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

/// Parse an activity row.
pub(crate) fn parse_activity_row(row: &rusqlite::Row) -> rusqlite::Result<Activity> {
    let id_str: String = row.get(0)?;
    let is_active: i32 = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    Ok(Activity {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        slug: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at_str),
    })
}
