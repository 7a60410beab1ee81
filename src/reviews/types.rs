//! Review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's review of a path. One per (user, path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier
    pub id: Uuid,
    /// Reviewing user
    pub user_id: Uuid,
    /// Reviewed path
    pub path_id: Uuid,
    /// Rating in [1, 5]
    pub rating: u8,
    /// Free-form comment
    pub comment: Option<String>,
    /// Whether the review counts toward the path rating
    pub is_approved: bool,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Review manager errors.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFound(Uuid),

    #[error("You must complete this path before reviewing it")]
    PathNotCompleted,

    #[error("You have already reviewed this path")]
    AlreadyReviewed,

    #[error("Review not found: {0}")]
    NotFound(Uuid),

    #[error("Review does not belong to the acting user")]
    NotOwner,

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
