//! Journey types and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::AchievementError;
use crate::paths::Difficulty;

/// Lifecycle status of a journey.
///
/// `Started` and `Paused` are the active states; `Completed` and
/// `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyStatus {
    Started,
    Paused,
    Completed,
    Abandoned,
}

impl JourneyStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JourneyStatus::Started => "started",
            JourneyStatus::Paused => "paused",
            JourneyStatus::Completed => "completed",
            JourneyStatus::Abandoned => "abandoned",
        }
    }

    /// Parse the storage representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "started" => Some(JourneyStatus::Started),
            "paused" => Some(JourneyStatus::Paused),
            "completed" => Some(JourneyStatus::Completed),
            "abandoned" => Some(JourneyStatus::Abandoned),
            _ => None,
        }
    }

    /// Whether the journey is still underway (started or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, JourneyStatus::Started | JourneyStatus::Paused)
    }
}

impl std::fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded GPS fix along a journey. The timestamp is assigned by the
/// server when the fix is recorded, not supplied by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// A client-supplied position fix, before the server stamps it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PositionUpdate {
    pub lat: f64,
    pub lng: f64,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// One user's attempt at one path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    /// Unique identifier
    pub id: Uuid,
    /// User taking the journey
    pub user_id: Uuid,
    /// Path being walked
    pub path_id: Uuid,
    /// Lifecycle status
    pub status: JourneyStatus,
    /// When the journey was started
    pub started_at: DateTime<Utc>,
    /// When the journey was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Actual distance covered in kilometers
    pub distance_traveled: Option<f64>,
    /// Actual duration in minutes
    pub actual_duration: Option<u32>,
    /// Number of checkpoints visited
    pub visited_checkpoints: u32,
    /// Ordered GPS track
    pub recorded_positions: Vec<TrackPoint>,
    /// Free-form weather observations
    pub weather_conditions: Option<serde_json::Value>,
    /// User notes
    pub notes: Option<String>,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Journey {
    /// Whether the journey is in an active state.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether the journey was completed.
    pub fn is_completed(&self) -> bool {
        self.status == JourneyStatus::Completed
    }

    /// Human-readable duration, e.g. "3h 20m".
    pub fn duration_formatted(&self) -> Option<String> {
        let minutes = self.actual_duration?;
        let hours = minutes / 60;
        let minutes = minutes % 60;

        if hours > 0 {
            Some(format!("{hours}h {minutes}m"))
        } else {
            Some(format!("{minutes}m"))
        }
    }
}

/// Final data recorded when a journey completes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionData {
    /// Distance covered in kilometers
    pub distance_traveled: f64,
    /// Duration in minutes
    pub actual_duration: u32,
    /// Checkpoints visited
    pub visited_checkpoints: Option<u32>,
    /// Final GPS track; replaces whatever was recorded along the way
    pub recorded_positions: Option<Vec<TrackPoint>>,
    /// Weather observations
    pub weather_conditions: Option<serde_json::Value>,
    /// User notes
    pub notes: Option<String>,
}

/// Per-month completion figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStat {
    /// Month label, e.g. "Mar 2026"
    pub month: String,
    pub completed: u32,
    pub distance_km: f64,
}

/// Aggregated journey statistics for a user.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyStatistics {
    pub total_journeys: u32,
    pub completed_journeys: u32,
    pub total_distance_km: f64,
    pub total_time_minutes: u32,
    /// Most frequently completed difficulty, if any
    pub favorite_difficulty: Option<Difficulty>,
    /// Trailing six months, oldest first
    pub monthly: Vec<MonthlyStat>,
}

/// Journey engine errors.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("You already have an active journey")]
    ActiveJourneyExists,

    #[error("Journey is not in progress")]
    NotInProgress,

    #[error("Journey is not paused")]
    NotPaused,

    #[error("Journey is not active")]
    NotActive,

    #[error("Journey not found: {0}")]
    NotFound(Uuid),

    #[error("Path not found: {0}")]
    PathNotFound(Uuid),

    #[error("Journey does not belong to the acting user")]
    NotOwner,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Achievement check failed: {0}")]
    AchievementError(#[from] AchievementError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
