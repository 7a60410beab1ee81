//! Path and activity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trail difficulty grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

impl Difficulty {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
        }
    }

    /// Parse the storage representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "moderate" => Some(Difficulty::Moderate),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single latitude/longitude pair along a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// An activity tag describing what a path is suitable for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: Uuid,
    /// URL-friendly key
    pub slug: String,
    /// Display name
    pub name: String,
    /// Icon name
    pub icon: Option<String>,
    /// Whether the tag is selectable
    pub is_active: bool,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Create a new activity tag.
    pub fn new(slug: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            icon: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A hiking path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Long-form description
    pub description: Option<String>,
    /// Human-readable location / region
    pub location: String,
    /// Trail length in kilometers
    pub length_km: f64,
    /// Estimated completion time in minutes
    pub estimated_duration: u32,
    /// Difficulty grade
    pub difficulty: Difficulty,
    /// Ordered coordinates along the trail; the first is the trailhead
    pub coordinates: Vec<Coordinate>,
    /// Cached average rating over approved reviews
    pub rating: f64,
    /// Cached count of approved reviews
    pub review_count: u32,
    /// Whether the path is editorially featured
    pub is_featured: bool,
    /// Whether the path is visible
    pub is_active: bool,
    /// User who created the path
    pub created_by: Option<Uuid>,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Path {
    /// Create a new path with empty caches.
    pub fn new(
        name: &str,
        location: &str,
        length_km: f64,
        estimated_duration: u32,
        difficulty: Difficulty,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            location: location.to_string(),
            length_km,
            estimated_duration,
            difficulty,
            coordinates: Vec::new(),
            rating: 0.0,
            review_count: 0,
            is_featured: false,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The trailhead coordinate, if the path has any geometry.
    pub fn trailhead(&self) -> Option<&Coordinate> {
        self.coordinates.first()
    }
}

/// Sortable path columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    CreatedAt,
    Name,
    Location,
    Length,
    EstimatedDuration,
    Difficulty,
    Rating,
    ReviewCount,
}

impl SortBy {
    /// Column name in the paths table.
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::Name => "name",
            SortBy::Location => "location",
            SortBy::Length => "length_km",
            SortBy::EstimatedDuration => "estimated_duration",
            SortBy::Difficulty => "difficulty",
            SortBy::Rating => "rating",
            SortBy::ReviewCount => "review_count",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter criteria for path listings.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    /// Restrict to a difficulty grade
    pub difficulty: Option<Difficulty>,
    /// Restrict to paths tagged with this activity slug
    pub activity: Option<String>,
    /// Location substring match
    pub location: Option<String>,
    /// Minimum length in kilometers
    pub min_length: Option<f64>,
    /// Maximum length in kilometers
    pub max_length: Option<f64>,
    /// Minimum cached rating
    pub min_rating: Option<f64>,
    /// Sort column
    pub sort_by: SortBy,
    /// Sort direction
    pub sort_order: SortOrder,
}

/// A path together with its distance from a query point.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPath {
    pub path: Path,
    pub distance_km: f64,
}

/// Aggregated per-path journey statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStatistics {
    pub total_journeys: u32,
    pub completed_journeys: u32,
    /// Average duration of completed journeys in minutes
    pub average_duration: Option<f64>,
    pub unique_visitors: u32,
}

/// Errors from the path store and query service.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Path not found: {0}")]
    NotFound(Uuid),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
