//! Shared helpers for integration tests.

use trailhead::journeys::{CompletionData, Journey, JourneyEngine};
use trailhead::paths::{Difficulty, Path, PathStore};
use trailhead::storage::Database;
use trailhead::users::{User, UserStore};

/// Open a fresh in-memory database.
pub fn test_db() -> Database {
    Database::open_in_memory().expect("Failed to create database")
}

/// Insert a user with a unique email derived from the name.
pub fn seed_user(db: &Database, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    let user = User::new(name.to_string(), email);
    UserStore::new(db.connection())
        .insert(&user)
        .expect("Failed to insert user");
    user
}

/// Insert an active path.
pub fn seed_path(db: &mut Database, name: &str, location: &str, difficulty: Difficulty) -> Path {
    let path = Path::new(name, location, 8.0, 180, difficulty);
    PathStore::new(db.connection_mut())
        .insert(&path, &[])
        .expect("Failed to insert path");
    path
}

/// Completion payload with the given distance and duration.
pub fn completion(distance_km: f64, duration_minutes: u32) -> CompletionData {
    CompletionData {
        distance_traveled: distance_km,
        actual_duration: duration_minutes,
        ..Default::default()
    }
}

/// Start and immediately complete a journey on a path.
pub fn complete_journey(db: &mut Database, user: &User, path: &Path, distance_km: f64) -> Journey {
    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine
        .start(user.id, path.id)
        .expect("Failed to start journey");
    let (journey, _) = engine
        .complete(user.id, journey.id, completion(distance_km, 120))
        .expect("Failed to complete journey");
    journey
}

/// Overwrite a journey's completion timestamp, for streak scenarios.
pub fn backdate_completion(db: &Database, journey: &Journey, date: &str) {
    db.connection()
        .execute(
            "UPDATE journeys SET completed_at = ?2 WHERE id = ?1",
            rusqlite::params![journey.id.to_string(), format!("{date}T10:00:00+00:00")],
        )
        .expect("Failed to backdate journey");
}
