//! Journey lifecycle state machine and statistics.

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{
    CompletionData, Journey, JourneyError, JourneyStatistics, JourneyStatus, MonthlyStat,
    PositionUpdate, TrackPoint,
};
use crate::achievements::{self, Achievement};
use crate::paths::Difficulty;
use crate::storage::database::parse_timestamp;

/// Column list shared by every journey SELECT.
const JOURNEY_COLUMNS: &str = "id, user_id, path_id, status, started_at, completed_at, \
     distance_traveled, actual_duration, visited_checkpoints, recorded_positions_json, \
     weather_conditions_json, notes, created_at, updated_at";

/// Journey engine bound to a connection.
///
/// Mutating operations run as single statements or explicit transactions;
/// `complete` spans the status flip, counter increment and achievement
/// recheck in one transaction.
pub struct JourneyEngine<'a> {
    conn: &'a mut Connection,
}

impl<'a> JourneyEngine<'a> {
    /// Create an engine with a database connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Start a new journey on a path.
    pub fn start(&mut self, user_id: Uuid, path_id: Uuid) -> Result<Journey, JourneyError> {
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
            _ => return Err(JourneyError::PathNotFound(path_id)),
        }

        if self.active_journey(user_id)?.is_some() {
            return Err(JourneyError::ActiveJourneyExists);
        }

        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO journeys (id, user_id, path_id, status, started_at,
                 visited_checkpoints, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'started', ?4, 0, ?4, ?4)",
                params![id.to_string(), user_id.to_string(), path_id.to_string(), now],
            )
            .map_err(|e| {
                // The partial unique index is the backstop under concurrent starts
                if crate::storage::database::is_unique_violation(&e) {
                    JourneyError::ActiveJourneyExists
                } else {
                    JourneyError::DatabaseError(e)
                }
            })?;

        tracing::info!(user = %user_id, path = %path_id, journey = %id, "Journey started");
        self.get(id)
    }

    /// Get a journey by ID.
    pub fn get(&self, id: Uuid) -> Result<Journey, JourneyError> {
        self.conn
            .query_row(
                &format!("SELECT {JOURNEY_COLUMNS} FROM journeys WHERE id = ?1"),
                params![id.to_string()],
                parse_journey_row,
            )
            .optional()?
            .ok_or(JourneyError::NotFound(id))
    }

    /// The user's active journey, if any.
    pub fn active_journey(&self, user_id: Uuid) -> Result<Option<Journey>, JourneyError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {JOURNEY_COLUMNS} FROM journeys
                     WHERE user_id = ?1 AND status IN ('started', 'paused')"
                ),
                params![user_id.to_string()],
                parse_journey_row,
            )
            .optional()
            .map_err(JourneyError::from)
    }

    /// All journeys for a user, newest first.
    pub fn journeys_for_user(&self, user_id: Uuid) -> Result<Vec<Journey>, JourneyError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {JOURNEY_COLUMNS} FROM journeys
             WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string()], parse_journey_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(JourneyError::from)
    }

    /// Pause an in-progress journey.
    pub fn pause(&mut self, user_id: Uuid, journey_id: Uuid) -> Result<Journey, JourneyError> {
        let journey = self.owned(user_id, journey_id)?;

        if journey.status != JourneyStatus::Started {
            return Err(JourneyError::NotInProgress);
        }

        self.set_status(journey_id, JourneyStatus::Paused)?;
        tracing::info!(journey = %journey_id, "Journey paused");
        self.get(journey_id)
    }

    /// Resume a paused journey.
    pub fn resume(&mut self, user_id: Uuid, journey_id: Uuid) -> Result<Journey, JourneyError> {
        let journey = self.owned(user_id, journey_id)?;

        if journey.status != JourneyStatus::Paused {
            return Err(JourneyError::NotPaused);
        }

        self.set_status(journey_id, JourneyStatus::Started)?;
        tracing::info!(journey = %journey_id, "Journey resumed");
        self.get(journey_id)
    }

    /// Complete an active journey: record final data, bump the user's
    /// completed-trip counter and recheck achievements in one transaction,
    /// so a failure anywhere rolls back everything.
    ///
    /// Returns the completed journey and the achievements unlocked by it.
    pub fn complete(
        &mut self,
        user_id: Uuid,
        journey_id: Uuid,
        data: CompletionData,
    ) -> Result<(Journey, Vec<Achievement>), JourneyError> {
        if data.distance_traveled < 0.0 {
            return Err(JourneyError::ValidationError(
                "Distance traveled cannot be negative".to_string(),
            ));
        }

        let tx = self.conn.transaction()?;

        let journey = tx
            .query_row(
                &format!("SELECT {JOURNEY_COLUMNS} FROM journeys WHERE id = ?1"),
                params![journey_id.to_string()],
                parse_journey_row,
            )
            .optional()?
            .ok_or(JourneyError::NotFound(journey_id))?;

        if journey.user_id != user_id {
            return Err(JourneyError::NotOwner);
        }
        if !journey.status.is_active() {
            return Err(JourneyError::NotActive);
        }

        let now = Utc::now().to_rfc3339();
        let positions = data.recorded_positions.unwrap_or_default();
        let positions_json = serde_json::to_string(&positions)?;
        let weather_json = data
            .weather_conditions
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            "UPDATE journeys SET status = 'completed', completed_at = ?2,
             distance_traveled = ?3, actual_duration = ?4, visited_checkpoints = ?5,
             recorded_positions_json = ?6, weather_conditions_json = ?7, notes = ?8,
             updated_at = ?2
             WHERE id = ?1",
            params![
                journey_id.to_string(),
                now,
                data.distance_traveled,
                data.actual_duration,
                data.visited_checkpoints.unwrap_or(0),
                positions_json,
                weather_json,
                data.notes,
            ],
        )?;

        tx.execute(
            "UPDATE users SET completed_trips = completed_trips + 1, updated_at = ?2
             WHERE id = ?1",
            params![user_id.to_string(), now],
        )?;

        let unlocked = achievements::check_and_unlock(&tx, user_id)?;

        let completed = tx
            .query_row(
                &format!("SELECT {JOURNEY_COLUMNS} FROM journeys WHERE id = ?1"),
                params![journey_id.to_string()],
                parse_journey_row,
            )
            .optional()?
            .ok_or(JourneyError::NotFound(journey_id))?;

        tx.commit()?;

        tracing::info!(
            journey = %journey_id,
            distance_km = data.distance_traveled,
            unlocked = unlocked.len(),
            "Journey completed"
        );
        Ok((completed, unlocked))
    }

    /// Abandon an active journey.
    pub fn abandon(&mut self, user_id: Uuid, journey_id: Uuid) -> Result<Journey, JourneyError> {
        let journey = self.owned(user_id, journey_id)?;

        if !journey.status.is_active() {
            return Err(JourneyError::NotActive);
        }

        self.set_status(journey_id, JourneyStatus::Abandoned)?;
        tracing::info!(journey = %journey_id, "Journey abandoned");
        self.get(journey_id)
    }

    /// Append a GPS fix to an in-progress journey. Paused journeys do not
    /// accept fixes. The timestamp is assigned here, not by the client.
    pub fn update_position(
        &mut self,
        user_id: Uuid,
        journey_id: Uuid,
        position: PositionUpdate,
    ) -> Result<Journey, JourneyError> {
        if !(-90.0..=90.0).contains(&position.lat) {
            return Err(JourneyError::ValidationError(format!(
                "Latitude out of range: {}",
                position.lat
            )));
        }
        if !(-180.0..=180.0).contains(&position.lng) {
            return Err(JourneyError::ValidationError(format!(
                "Longitude out of range: {}",
                position.lng
            )));
        }

        let journey = self.owned(user_id, journey_id)?;

        if journey.status != JourneyStatus::Started {
            return Err(JourneyError::NotInProgress);
        }

        let mut positions = journey.recorded_positions;
        positions.push(TrackPoint {
            lat: position.lat,
            lng: position.lng,
            altitude: position.altitude,
            accuracy: position.accuracy,
            timestamp: Utc::now(),
        });

        self.conn.execute(
            "UPDATE journeys SET recorded_positions_json = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                journey_id.to_string(),
                serde_json::to_string(&positions)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.get(journey_id)
    }

    /// Aggregated journey statistics for a user.
    pub fn statistics(&self, user_id: Uuid) -> Result<JourneyStatistics, JourneyError> {
        let id = user_id.to_string();

        let total_journeys: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM journeys WHERE user_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        let (completed_journeys, total_distance_km, total_time_minutes): (u32, f64, u32) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(distance_traveled), 0),
                        COALESCE(SUM(actual_duration), 0)
                 FROM journeys WHERE user_id = ?1 AND status = 'completed'",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let favorite_difficulty: Option<Difficulty> = self
            .conn
            .query_row(
                "SELECT p.difficulty FROM journeys j
                 JOIN paths p ON p.id = j.path_id
                 WHERE j.user_id = ?1 AND j.status = 'completed'
                 GROUP BY p.difficulty
                 ORDER BY COUNT(*) DESC
                 LIMIT 1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|s| Difficulty::from_str(&s));

        let monthly = self.monthly_stats(user_id)?;

        Ok(JourneyStatistics {
            total_journeys,
            completed_journeys,
            total_distance_km,
            total_time_minutes,
            favorite_difficulty,
            monthly,
        })
    }

    /// Completed/distance figures for the trailing six months, oldest first.
    fn monthly_stats(&self, user_id: Uuid) -> Result<Vec<MonthlyStat>, JourneyError> {
        let today = Utc::now().date_naive();
        let mut stats = Vec::with_capacity(6);

        for offset in (0..6).rev() {
            let mut year = today.year();
            let mut month = today.month() as i32 - offset;
            while month <= 0 {
                month += 12;
                year -= 1;
            }

            let key = format!("{year:04}-{month:02}");
            let label = NaiveDate::from_ymd_opt(year, month as u32, 1)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or(key.clone());

            let (completed, distance_km): (u32, f64) = self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(distance_traveled), 0)
                 FROM journeys
                 WHERE user_id = ?1 AND status = 'completed'
                   AND strftime('%Y-%m', completed_at) = ?2",
                params![user_id.to_string(), key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            stats.push(MonthlyStat {
                month: label,
                completed,
                distance_km,
            });
        }

        Ok(stats)
    }

    /// Fetch a journey and verify the acting user owns it.
    fn owned(&self, user_id: Uuid, journey_id: Uuid) -> Result<Journey, JourneyError> {
        let journey = self.get(journey_id)?;
        if journey.user_id != user_id {
            return Err(JourneyError::NotOwner);
        }
        Ok(journey)
    }

    /// Flip a journey's status.
    fn set_status(&self, journey_id: Uuid, status: JourneyStatus) -> Result<(), JourneyError> {
        self.conn.execute(
            "UPDATE journeys SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                journey_id.to_string(),
                status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Parse a database row into a Journey.
pub(crate) fn parse_journey_row(row: &rusqlite::Row) -> rusqlite::Result<Journey> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let path_id_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let started_at_str: String = row.get(4)?;
    let completed_at_str: Option<String> = row.get(5)?;
    let positions_json: Option<String> = row.get(9)?;
    let weather_json: Option<String> = row.get(10)?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    let recorded_positions: Vec<TrackPoint> = positions_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();

    let weather_conditions: Option<serde_json::Value> = weather_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok());

    Ok(Journey {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        user_id: Uuid::parse_str(&user_id_str).unwrap_or_default(),
        path_id: Uuid::parse_str(&path_id_str).unwrap_or_default(),
        status: JourneyStatus::from_str(&status_str).unwrap_or(JourneyStatus::Abandoned),
        started_at: parse_timestamp(&started_at_str),
        completed_at: completed_at_str.as_deref().map(parse_timestamp),
        distance_traveled: row.get(6)?,
        actual_duration: row.get(7)?,
        visited_checkpoints: row.get(8)?,
        recorded_positions,
        weather_conditions,
        notes: row.get(11)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}
