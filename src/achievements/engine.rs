//! Achievement progress computation and unlocking.
//!
//! Progress is always recomputed from scratch against the journey history,
//! never incremented, so a recheck after any completion converges to the
//! same numbers. `check_and_unlock` is a plain function over a connection so
//! journey completion can run it inside its own transaction.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{
    Achievement, AchievementCategory, AchievementError, AchievementStatus, LeaderboardEntry,
    Requirement, UserAchievement,
};
use crate::storage::database::parse_timestamp;

/// Column list shared by every achievement SELECT.
const ACHIEVEMENT_COLUMNS: &str =
    "id, slug, category, title, description, icon, points, requirements_json, is_active, created_at";

/// Achievement engine bound to a connection.
pub struct AchievementEngine<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementEngine<'a> {
    /// Create an engine with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Recompute progress for every active achievement and unlock any that
    /// reached 100. Returns the achievements unlocked by this invocation.
    pub fn check_and_unlock(&self, user_id: Uuid) -> Result<Vec<Achievement>, AchievementError> {
        check_and_unlock(self.conn, user_id)
    }

    /// Every active achievement with the user's progress and unlock state.
    pub fn user_achievements(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AchievementStatus>, AchievementError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.slug, a.category, a.title, a.description, a.icon, a.points,
                    a.requirements_json, a.is_active, a.created_at,
                    ua.progress, ua.unlocked_at
             FROM achievements a
             LEFT JOIN user_achievements ua
               ON ua.achievement_id = a.id AND ua.user_id = ?1
             WHERE a.is_active = 1
             ORDER BY a.category ASC, a.points ASC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let achievement = parse_achievement_row(row)?;
            let progress: Option<f64> = row.get(10)?;
            let unlocked_at: Option<String> = row.get(11)?;
            Ok((achievement, progress, unlocked_at))
        })?;

        let mut statuses = Vec::new();
        for row in rows {
            let (achievement, progress, unlocked_at) = row?;
            let unlocked_at = unlocked_at.as_deref().map(parse_timestamp);
            statuses.push(AchievementStatus {
                achievement,
                progress: progress.unwrap_or(0.0),
                unlocked_at,
                is_unlocked: unlocked_at.is_some(),
            });
        }

        Ok(statuses)
    }

    /// Users ranked by total points of unlocked achievements.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AchievementError> {
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.name, COUNT(ua.id), COALESCE(SUM(a.points), 0)
             FROM users u
             JOIN user_achievements ua ON ua.user_id = u.id
             JOIN achievements a ON a.id = ua.achievement_id
             WHERE ua.unlocked_at IS NOT NULL
             GROUP BY u.id
             ORDER BY COALESCE(SUM(a.points), 0) DESC, COUNT(ua.id) DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let id_str: String = row.get(0)?;
            Ok(LeaderboardEntry {
                user_id: Uuid::parse_str(&id_str).unwrap_or_default(),
                name: row.get(1)?,
                unlocked_count: row.get(2)?,
                total_points: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(AchievementError::from)
    }

    /// Get an active achievement by ID.
    pub fn get_active(&self, id: Uuid) -> Result<Achievement, AchievementError> {
        let achievement = self
            .conn
            .query_row(
                &format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = ?1"),
                params![id.to_string()],
                parse_achievement_row,
            )
            .optional()?;

        match achievement {
            Some(a) if a.is_active => Ok(a),
            _ => Err(AchievementError::NotFound(id)),
        }
    }
}

/// Recompute progress for every active achievement the user has not yet
/// unlocked, and unlock those that reached 100.
pub fn check_and_unlock(
    conn: &Connection,
    user_id: Uuid,
) -> Result<Vec<Achievement>, AchievementError> {
    let achievements = active_achievements(conn)?;
    let mut unlocked = Vec::new();
    let now = Utc::now().to_rfc3339();

    for achievement in achievements {
        let record = get_or_create_record(conn, user_id, achievement.id)?;
        if record.is_unlocked() {
            continue;
        }

        let progress = compute_progress(conn, user_id, &achievement)?;
        conn.execute(
            "UPDATE user_achievements SET progress = ?2, updated_at = ?3 WHERE id = ?1",
            params![record.id, progress, now],
        )?;

        if progress >= 100.0 {
            // The NULL guard makes the unlock idempotent and irreversible
            let flipped = conn.execute(
                "UPDATE user_achievements
                 SET progress = 100, unlocked_at = ?2, updated_at = ?2
                 WHERE id = ?1 AND unlocked_at IS NULL",
                params![record.id, now],
            )?;

            if flipped == 1 {
                conn.execute(
                    "UPDATE users SET achievements_count = achievements_count + 1,
                     updated_at = ?2 WHERE id = ?1",
                    params![user_id.to_string(), now],
                )?;

                tracing::info!(
                    user = %user_id,
                    achievement = %achievement.slug,
                    "Achievement unlocked"
                );
                unlocked.push(achievement);
            }
        }
    }

    Ok(unlocked)
}

/// Insert an achievement definition, ignoring an already-installed slug.
/// Returns true when the row was newly written.
pub fn insert_achievement(
    conn: &Connection,
    achievement: &Achievement,
) -> Result<bool, AchievementError> {
    let requirements_json = match &achievement.requirement {
        Some(requirement) => serde_json::to_string(requirement)?,
        None => "{}".to_string(),
    };

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO achievements
         (id, slug, category, title, description, icon, points, requirements_json,
          is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            achievement.id.to_string(),
            achievement.slug,
            achievement.category.as_str(),
            achievement.title,
            achievement.description,
            achievement.icon,
            achievement.points,
            requirements_json,
            achievement.is_active as i32,
            achievement.created_at.to_rfc3339(),
        ],
    )?;

    Ok(inserted > 0)
}

/// Load all active achievement definitions.
pub fn active_achievements(conn: &Connection) -> Result<Vec<Achievement>, AchievementError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE is_active = 1
         ORDER BY category ASC, points ASC"
    ))?;

    let rows = stmt.query_map([], parse_achievement_row)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(AchievementError::from)
}

/// Fetch the user's record for an achievement, creating it at zero progress
/// on first contact.
fn get_or_create_record(
    conn: &Connection,
    user_id: Uuid,
    achievement_id: Uuid,
) -> Result<UserAchievement, AchievementError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO user_achievements
         (user_id, achievement_id, progress, created_at, updated_at)
         VALUES (?1, ?2, 0, ?3, ?3)",
        params![user_id.to_string(), achievement_id.to_string(), now],
    )?;

    conn.query_row(
        "SELECT id, user_id, achievement_id, progress, unlocked_at, created_at, updated_at
         FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2",
        params![user_id.to_string(), achievement_id.to_string()],
        parse_user_achievement_row,
    )
    .map_err(AchievementError::from)
}

/// Compute a user's progress on one achievement, clamped to [0, 100].
///
/// A requirement that does not belong to the achievement's category, or one
/// that failed to decode, computes as zero rather than an error.
fn compute_progress(
    conn: &Connection,
    user_id: Uuid,
    achievement: &Achievement,
) -> Result<f64, AchievementError> {
    let Some(requirement) = &achievement.requirement else {
        tracing::warn!(
            achievement = %achievement.slug,
            "Undecodable requirement document, treating progress as 0"
        );
        return Ok(0.0);
    };

    let id = user_id.to_string();

    let progress = match (achievement.category, requirement) {
        (AchievementCategory::Explorer, Requirement::CompletedPaths { completed_paths }) => {
            let completed: u32 = conn.query_row(
                "SELECT COUNT(DISTINCT path_id) FROM journeys
                 WHERE user_id = ?1 AND status = 'completed'",
                params![id],
                |row| row.get(0),
            )?;
            ratio(completed as f64, *completed_paths as f64)
        }

        (AchievementCategory::Explorer, Requirement::UniqueLocations { unique_locations }) => {
            let locations: u32 = conn.query_row(
                "SELECT COUNT(DISTINCT p.location) FROM journeys j
                 JOIN paths p ON p.id = j.path_id
                 WHERE j.user_id = ?1 AND j.status = 'completed'",
                params![id],
                |row| row.get(0),
            )?;
            ratio(locations as f64, *unique_locations as f64)
        }

        (AchievementCategory::Hiker, Requirement::TotalDistance { total_distance }) => {
            let distance: f64 = conn.query_row(
                "SELECT COALESCE(SUM(distance_traveled), 0) FROM journeys
                 WHERE user_id = ?1 AND status = 'completed'",
                params![id],
                |row| row.get(0),
            )?;
            ratio(distance, *total_distance)
        }

        (AchievementCategory::Hiker, Requirement::TotalDuration { total_duration }) => {
            let duration: f64 = conn.query_row(
                "SELECT COALESCE(SUM(actual_duration), 0) FROM journeys
                 WHERE user_id = ?1 AND status = 'completed'",
                params![id],
                |row| row.get(0),
            )?;
            ratio(duration, *total_duration as f64)
        }

        (
            AchievementCategory::RegionSpecific,
            Requirement::RegionPaths {
                region,
                paths_count,
            },
        ) => {
            // instr() keeps the region match case-sensitive
            let completed: u32 = conn.query_row(
                "SELECT COUNT(DISTINCT p.id) FROM journeys j
                 JOIN paths p ON p.id = j.path_id
                 WHERE j.user_id = ?1 AND j.status = 'completed'
                   AND instr(p.location, ?2) > 0",
                params![id, region],
                |row| row.get(0),
            )?;
            ratio(completed as f64, *paths_count as f64)
        }

        (AchievementCategory::Challenge, Requirement::DifficultyCount { difficulty, count }) => {
            let completed: u32 = conn.query_row(
                "SELECT COUNT(*) FROM journeys j
                 JOIN paths p ON p.id = j.path_id
                 WHERE j.user_id = ?1 AND j.status = 'completed'
                   AND p.difficulty = ?2",
                params![id, difficulty.as_str()],
                |row| row.get(0),
            )?;
            ratio(completed as f64, *count as f64)
        }

        (AchievementCategory::Challenge, Requirement::ConsecutiveDays { consecutive_days }) => {
            let streak = longest_daily_streak(conn, user_id)?;
            ratio(streak as f64, *consecutive_days as f64)
        }

        _ => {
            tracing::warn!(
                achievement = %achievement.slug,
                category = achievement.category.as_str(),
                "Requirement does not match achievement category, treating progress as 0"
            );
            0.0
        }
    };

    Ok(progress)
}

/// Longest run of consecutive calendar days with at least one completion.
pub fn longest_daily_streak(conn: &Connection, user_id: Uuid) -> Result<u32, AchievementError> {
    let mut stmt = conn.prepare(
        "SELECT completed_at FROM journeys
         WHERE user_id = ?1 AND status = 'completed' AND completed_at IS NOT NULL
         ORDER BY completed_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut days: Vec<NaiveDate> = Vec::new();
    for row in rows {
        days.push(parse_timestamp(&row?).date_naive());
    }
    // Sorted newest-first; equal days are adjacent, so dedup collapses them
    days.dedup();

    Ok(max_streak(&days))
}

/// Scan newest-first deduplicated dates for the longest day-by-day run.
pub(crate) fn max_streak(days: &[NaiveDate]) -> u32 {
    if days.is_empty() {
        return 0;
    }

    let mut streak = 1u32;
    let mut max = 1u32;

    for pair in days.windows(2) {
        if pair[0].signed_duration_since(pair[1]).num_days() == 1 {
            streak += 1;
            max = max.max(streak);
        } else {
            streak = 1;
        }
    }

    max
}

/// Percentage of `value` against `target`, clamped to [0, 100].
fn ratio(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (value / target * 100.0).min(100.0)
}

/// Parse a database row into an Achievement.
pub(crate) fn parse_achievement_row(row: &rusqlite::Row) -> rusqlite::Result<Achievement> {
    let id_str: String = row.get(0)?;
    let category_str: String = row.get(2)?;
    let requirements_json: String = row.get(7)?;
    let is_active: i32 = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    // A document that fails to decode degrades to None (zero progress)
    let requirement: Option<Requirement> = serde_json::from_str(&requirements_json).ok();

    Ok(Achievement {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        slug: row.get(1)?,
        category: AchievementCategory::from_str(&category_str)
            .unwrap_or(AchievementCategory::Challenge),
        title: row.get(3)?,
        description: row.get(4)?,
        icon: row.get(5)?,
        points: row.get(6)?,
        requirement,
        is_active: is_active != 0,
        created_at: parse_timestamp(&created_at_str),
    })
}

/// Parse a database row into a UserAchievement.
fn parse_user_achievement_row(row: &rusqlite::Row) -> rusqlite::Result<UserAchievement> {
    let user_id_str: String = row.get(1)?;
    let achievement_id_str: String = row.get(2)?;
    let unlocked_at_str: Option<String> = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    let updated_at_str: String = row.get(6)?;

    Ok(UserAchievement {
        id: row.get(0)?,
        user_id: Uuid::parse_str(&user_id_str).unwrap_or_default(),
        achievement_id: Uuid::parse_str(&achievement_id_str).unwrap_or_default(),
        progress: row.get(3)?,
        unlocked_at: unlocked_at_str.as_deref().map(parse_timestamp),
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}
