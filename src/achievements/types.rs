//! Achievement definitions and per-user progress records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paths::Difficulty;

/// Achievement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Completing distinct paths and visiting new locations
    Explorer,
    /// Accumulated distance and time on the trail
    Hiker,
    /// Completing paths within a named region
    RegionSpecific,
    /// Difficulty and consistency challenges
    Challenge,
}

impl AchievementCategory {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::Explorer => "explorer",
            AchievementCategory::Hiker => "hiker",
            AchievementCategory::RegionSpecific => "region_specific",
            AchievementCategory::Challenge => "challenge",
        }
    }

    /// Parse the storage representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "explorer" => Some(AchievementCategory::Explorer),
            "hiker" => Some(AchievementCategory::Hiker),
            "region_specific" => Some(AchievementCategory::RegionSpecific),
            "challenge" => Some(AchievementCategory::Challenge),
            _ => None,
        }
    }
}

/// Declarative unlock criteria attached to an achievement definition.
///
/// Serialized as the flat key/value document the requirement columns hold
/// (`{"completed_paths": 5}`, `{"region": "Ramallah", "paths_count": 3}`,
/// ...), so each variant is keyed by its field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    /// Complete N distinct paths
    CompletedPaths { completed_paths: u32 },
    /// Complete paths in N distinct locations
    UniqueLocations { unique_locations: u32 },
    /// Accumulate a total distance in kilometers
    TotalDistance { total_distance: f64 },
    /// Accumulate a total duration in minutes
    TotalDuration { total_duration: u32 },
    /// Complete N distinct paths whose location names a region
    RegionPaths { region: String, paths_count: u32 },
    /// Complete N journeys on paths of a given difficulty
    DifficultyCount { difficulty: Difficulty, count: u32 },
    /// Complete journeys on N consecutive calendar days
    ConsecutiveDays { consecutive_days: u32 },
}

/// Achievement definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique identifier
    pub id: Uuid,
    /// Short code/key
    pub slug: String,
    /// Category
    pub category: AchievementCategory,
    /// Display name
    pub title: String,
    /// Description
    pub description: String,
    /// Icon name
    pub icon: Option<String>,
    /// Points awarded on unlock
    pub points: u32,
    /// Unlock criteria; `None` when the stored document could not be
    /// decoded, which computes as zero progress
    pub requirement: Option<Requirement>,
    /// Whether the achievement can currently be earned
    pub is_active: bool,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Achievement {
    /// Create a new achievement definition.
    pub fn new(
        slug: &str,
        title: &str,
        description: &str,
        category: AchievementCategory,
        points: u32,
        requirement: Requirement,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            category,
            title: title.to_string(),
            description: description.to_string(),
            icon: None,
            points,
            requirement: Some(requirement),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Set the icon name.
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }
}

/// A user's progress on one achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    /// Row identifier
    pub id: i64,
    /// User
    pub user_id: Uuid,
    /// Achievement definition
    pub achievement_id: Uuid,
    /// Progress percentage in [0, 100]
    pub progress: f64,
    /// When the achievement was unlocked; never cleared once set
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserAchievement {
    /// Check if the achievement is unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// An achievement together with one user's standing on it.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub progress: f64,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub is_unlocked: bool,
}

/// One row of the achievement leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub name: String,
    pub unlocked_count: u32,
    pub total_points: u32,
}

/// Achievement engine errors.
#[derive(Debug, thiserror::Error)]
pub enum AchievementError {
    #[error("Achievement not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
