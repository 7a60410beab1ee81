//! Review lifecycle and the path rating aggregator.
//!
//! Every review mutation recomputes the owning path's cached `rating` and
//! `review_count` inside the same transaction, so the caches never
//! observably diverge from the underlying review set.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{Review, ReviewError};
use crate::storage::database::parse_timestamp;

/// Maximum comment length in characters.
const MAX_COMMENT_CHARS: usize = 1000;

/// Column list shared by every review SELECT.
const REVIEW_COLUMNS: &str =
    "id, user_id, path_id, rating, comment, is_approved, created_at, updated_at";

/// Manager for path reviews.
pub struct ReviewManager<'a> {
    conn: &'a mut Connection,
}

impl<'a> ReviewManager<'a> {
    /// Create a review manager with a database connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Submit a review for a path the user has completed.
    pub fn submit(
        &mut self,
        user_id: Uuid,
        path_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review, ReviewError> {
        validate_rating(rating)?;
        validate_comment(comment.as_deref())?;

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
            _ => return Err(ReviewError::PathNotFound(path_id)),
        }

        let has_completed: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM journeys
             WHERE user_id = ?1 AND path_id = ?2 AND status = 'completed')",
            params![user_id.to_string(), path_id.to_string()],
            |row| row.get(0),
        )?;
        if !has_completed {
            return Err(ReviewError::PathNotCompleted);
        }

        let already: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = ?1 AND path_id = ?2)",
            params![user_id.to_string(), path_id.to_string()],
            |row| row.get(0),
        )?;
        if already {
            return Err(ReviewError::AlreadyReviewed);
        }

        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO reviews (id, user_id, path_id, rating, comment, is_approved,
             created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
            params![
                id.to_string(),
                user_id.to_string(),
                path_id.to_string(),
                rating,
                comment,
                now,
            ],
        )
        .map_err(|e| {
            // The UNIQUE(user_id, path_id) index is the backstop
            if crate::storage::database::is_unique_violation(&e) {
                ReviewError::AlreadyReviewed
            } else {
                ReviewError::DatabaseError(e)
            }
        })?;

        recompute_path_rating(&tx, path_id)?;
        tx.commit()?;

        tracing::info!(user = %user_id, path = %path_id, rating, "Review submitted");
        self.get(id)
    }

    /// Update the acting user's review. `None` fields are left unchanged.
    pub fn update(
        &mut self,
        user_id: Uuid,
        review_id: Uuid,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<Review, ReviewError> {
        let review = self.owned(user_id, review_id)?;

        if let Some(rating) = rating {
            validate_rating(rating)?;
        }
        validate_comment(comment.as_deref())?;

        let new_rating = rating.unwrap_or(review.rating);
        let new_comment = comment.or(review.comment);

        let tx = self.conn.transaction()?;

        tx.execute(
            "UPDATE reviews SET rating = ?2, comment = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                review_id.to_string(),
                new_rating,
                new_comment,
                Utc::now().to_rfc3339(),
            ],
        )?;

        recompute_path_rating(&tx, review.path_id)?;
        tx.commit()?;

        self.get(review_id)
    }

    /// Delete the acting user's review.
    pub fn delete(&mut self, user_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        let review = self.owned(user_id, review_id)?;

        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM reviews WHERE id = ?1",
            params![review_id.to_string()],
        )?;

        recompute_path_rating(&tx, review.path_id)?;
        tx.commit()?;

        tracing::info!(review = %review_id, "Review deleted");
        Ok(())
    }

    /// Get a review by ID.
    pub fn get(&self, id: Uuid) -> Result<Review, ReviewError> {
        self.conn
            .query_row(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
                params![id.to_string()],
                parse_review_row,
            )
            .optional()?
            .ok_or(ReviewError::NotFound(id))
    }

    /// All reviews written by a user, newest first.
    pub fn reviews_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, ReviewError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string()], parse_review_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(ReviewError::from)
    }

    /// Approved reviews for a path, newest first.
    pub fn reviews_for_path(&self, path_id: Uuid) -> Result<Vec<Review>, ReviewError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE path_id = ?1 AND is_approved = 1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![path_id.to_string()], parse_review_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(ReviewError::from)
    }

    /// Fetch a review and verify the acting user owns it.
    fn owned(&self, user_id: Uuid, review_id: Uuid) -> Result<Review, ReviewError> {
        let review = self.get(review_id)?;
        if review.user_id != user_id {
            return Err(ReviewError::NotOwner);
        }
        Ok(review)
    }
}

/// Recompute a path's cached rating and review count from its approved
/// reviews. Zero when there are none.
pub fn recompute_path_rating(conn: &Connection, path_id: Uuid) -> Result<(), ReviewError> {
    let (avg_rating, count): (f64, u32) = conn.query_row(
        "SELECT COALESCE(AVG(rating), 0), COUNT(*)
         FROM reviews WHERE path_id = ?1 AND is_approved = 1",
        params![path_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    conn.execute(
        "UPDATE paths SET rating = ?2, review_count = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            path_id.to_string(),
            avg_rating,
            count,
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Validate a rating value.
fn validate_rating(rating: u8) -> Result<(), ReviewError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::ValidationError(format!(
            "Rating must be between 1 and 5: {rating}"
        )));
    }
    Ok(())
}

/// Validate a comment length.
fn validate_comment(comment: Option<&str>) -> Result<(), ReviewError> {
    if let Some(comment) = comment {
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(ReviewError::ValidationError(format!(
                "Comment cannot exceed {MAX_COMMENT_CHARS} characters"
            )));
        }
    }
    Ok(())
}

/// Parse a database row into a Review.
fn parse_review_row(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let path_id_str: String = row.get(2)?;
    let is_approved: i32 = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    Ok(Review {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        user_id: Uuid::parse_str(&user_id_str).unwrap_or_default(),
        path_id: Uuid::parse_str(&path_id_str).unwrap_or_default(),
        rating: row.get(3)?,
        comment: row.get(4)?,
        is_approved: is_approved != 0,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}
