//! Path query service: filtered listing, search, featured/similar lookup,
//! nearby search and per-path statistics.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use super::geo::haversine_distance;
use super::store::{get_path, parse_path_row, PATH_COLUMNS};
use super::types::{Coordinate, NearbyPath, Path, PathError, PathFilter, PathStatistics};
use crate::storage::config::QuerySettings;

/// Read-side query service over active paths.
pub struct PathQuery<'a> {
    conn: &'a Connection,
    settings: QuerySettings,
}

impl<'a> PathQuery<'a> {
    /// Create a query service with default settings.
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            settings: QuerySettings::default(),
        }
    }

    /// Create a query service with explicit settings.
    pub fn with_settings(conn: &'a Connection, settings: QuerySettings) -> Self {
        Self { conn, settings }
    }

    /// Get an active path by ID; inactive paths are reported as missing.
    pub fn get_active(&self, id: Uuid) -> Result<Path, PathError> {
        match get_path(self.conn, id)? {
            Some(path) if path.is_active => Ok(path),
            _ => Err(PathError::NotFound(id)),
        }
    }

    /// List active paths matching the filter, sorted as requested.
    pub fn list(&self, filter: &PathFilter) -> Result<Vec<Path>, PathError> {
        let mut sql = format!("SELECT {PATH_COLUMNS} FROM paths WHERE is_active = 1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(difficulty) = filter.difficulty {
            sql.push_str(" AND difficulty = ?");
            values.push(Value::Text(difficulty.as_str().to_string()));
        }

        if let Some(activity) = &filter.activity {
            sql.push_str(
                " AND id IN (SELECT pa.path_id FROM path_activities pa \
                 JOIN activities a ON a.id = pa.activity_id WHERE a.slug = ?)",
            );
            values.push(Value::Text(activity.clone()));
        }

        if let Some(location) = &filter.location {
            sql.push_str(" AND location LIKE ?");
            values.push(Value::Text(format!("%{location}%")));
        }

        if let Some(min_length) = filter.min_length {
            sql.push_str(" AND length_km >= ?");
            values.push(Value::Real(min_length));
        }

        if let Some(max_length) = filter.max_length {
            sql.push_str(" AND length_km <= ?");
            values.push(Value::Real(max_length));
        }

        if let Some(min_rating) = filter.min_rating {
            sql.push_str(" AND rating >= ?");
            values.push(Value::Real(min_rating));
        }

        // Sort columns come from a fixed enum, never from caller strings
        sql.push_str(&format!(
            " ORDER BY {} {}",
            filter.sort_by.column(),
            filter.sort_order.as_sql()
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), parse_path_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }

    /// Full-text-ish search over name, description and location.
    pub fn search(&self, query: &str) -> Result<Vec<Path>, PathError> {
        if query.trim().chars().count() < 2 {
            return Err(PathError::ValidationError(
                "Search query must be at least 2 characters".to_string(),
            ));
        }

        let pattern = format!("%{}%", query.trim());
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths
             WHERE is_active = 1
               AND (name LIKE ?1 OR description LIKE ?1 OR location LIKE ?1)
             ORDER BY rating DESC
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(
            params![pattern, self.settings.search_limit as i64],
            parse_path_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }

    /// Featured paths, best rated first.
    pub fn featured(&self) -> Result<Vec<Path>, PathError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths
             WHERE is_active = 1 AND is_featured = 1
             ORDER BY rating DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![self.settings.featured_limit as i64], parse_path_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }

    /// Paths similar to the given one: same difficulty or a shared activity.
    pub fn similar(&self, path_id: Uuid) -> Result<Vec<Path>, PathError> {
        let path = self.get_active(path_id)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths
             WHERE is_active = 1 AND id != ?1
               AND (difficulty = ?2 OR id IN (
                   SELECT pa.path_id FROM path_activities pa
                   WHERE pa.activity_id IN (
                       SELECT activity_id FROM path_activities WHERE path_id = ?1)))
             ORDER BY rating DESC
             LIMIT ?3"
        ))?;

        let rows = stmt.query_map(
            params![
                path.id.to_string(),
                path.difficulty.as_str(),
                self.settings.similar_limit as i64
            ],
            parse_path_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(PathError::from)
    }

    /// Active paths whose trailhead lies within `radius_km` of the query
    /// point, closest first, capped at the configured limit.
    pub fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<Vec<NearbyPath>, PathError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PathError::ValidationError(format!(
                "Latitude out of range: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(PathError::ValidationError(format!(
                "Longitude out of range: {lng}"
            )));
        }

        let radius = radius_km.unwrap_or(self.settings.nearby_radius_km);
        if !(1.0..=100.0).contains(&radius) {
            return Err(PathError::ValidationError(format!(
                "Radius must be between 1 and 100 km: {radius}"
            )));
        }

        let origin = Coordinate::new(lat, lng);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths
             WHERE is_active = 1 AND coordinates_json IS NOT NULL"
        ))?;
        let rows = stmt.query_map([], parse_path_row)?;

        let mut results = Vec::new();
        for row in rows {
            let path = row?;
            let Some(trailhead) = path.trailhead().copied() else {
                continue;
            };

            let distance_km = haversine_distance(&origin, &trailhead);
            if distance_km < radius {
                results.push(NearbyPath { path, distance_km });
            }
        }

        results.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.settings.nearby_limit);

        Ok(results)
    }

    /// Journey statistics for a path.
    pub fn statistics(&self, path_id: Uuid) -> Result<PathStatistics, PathError> {
        let id = path_id.to_string();

        let total_journeys: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM journeys WHERE path_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        let (completed_journeys, average_duration): (u32, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), AVG(actual_duration)
             FROM journeys WHERE path_id = ?1 AND status = 'completed'",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let unique_visitors: u32 = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM journeys WHERE path_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(PathStatistics {
            total_journeys,
            completed_journeys,
            average_duration,
            unique_visitors,
        })
    }
}
