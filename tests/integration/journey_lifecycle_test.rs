//! Integration tests for the journey lifecycle state machine.

use crate::common::{completion, seed_path, seed_user, test_db};
use trailhead::achievements::install_default_achievements;
use trailhead::journeys::{JourneyEngine, JourneyError, JourneyStatus, PositionUpdate};
use trailhead::paths::Difficulty;
use trailhead::users::UserStore;

#[test]
fn test_full_lifecycle_start_pause_resume_complete() {
    let mut db = test_db();
    let user = seed_user(&db, "Lina");
    let path = seed_path(&mut db, "Wadi Qelt", "Jericho", Difficulty::Moderate);

    let mut engine = JourneyEngine::new(db.connection_mut());

    let journey = engine.start(user.id, path.id).unwrap();
    assert_eq!(journey.status, JourneyStatus::Started);
    assert!(journey.completed_at.is_none());

    let journey = engine.pause(user.id, journey.id).unwrap();
    assert_eq!(journey.status, JourneyStatus::Paused);

    let journey = engine.resume(user.id, journey.id).unwrap();
    assert_eq!(journey.status, JourneyStatus::Started);

    let (journey, unlocked) = engine
        .complete(user.id, journey.id, completion(11.5, 260))
        .unwrap();
    assert_eq!(journey.status, JourneyStatus::Completed);
    assert!(journey.completed_at.is_some());
    assert_eq!(journey.distance_traveled, Some(11.5));
    assert_eq!(journey.actual_duration, Some(260));
    // No achievement catalog installed, nothing to unlock
    assert!(unlocked.is_empty());

    let user = UserStore::new(db.connection()).get(user.id).unwrap().unwrap();
    assert_eq!(user.completed_trips, 1);
}

#[test]
fn test_one_active_journey_per_user() {
    let mut db = test_db();
    let user = seed_user(&db, "Omar");
    let path_a = seed_path(&mut db, "Trail A", "Ramallah", Difficulty::Easy);
    let path_b = seed_path(&mut db, "Trail B", "Ramallah", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, path_a.id).unwrap();

    // A second start is rejected while one is underway
    let result = engine.start(user.id, path_b.id);
    assert!(matches!(result, Err(JourneyError::ActiveJourneyExists)));

    // Paused still counts as active
    engine.pause(user.id, journey.id).unwrap();
    let result = engine.start(user.id, path_b.id);
    assert!(matches!(result, Err(JourneyError::ActiveJourneyExists)));

    // After abandoning, a new journey may begin
    engine.abandon(user.id, journey.id).unwrap();
    assert!(engine.start(user.id, path_b.id).is_ok());
}

#[test]
fn test_storage_layer_enforces_single_active_journey() {
    let mut db = test_db();
    let user = seed_user(&db, "Noor");
    let path = seed_path(&mut db, "Trail", "Nablus", Difficulty::Easy);

    JourneyEngine::new(db.connection_mut())
        .start(user.id, path.id)
        .unwrap();

    // Bypass the engine: the partial unique index must still reject a
    // second active row for the same user
    let result = db.connection().execute(
        "INSERT INTO journeys (id, user_id, path_id, status, started_at,
         visited_checkpoints, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'started', ?4, 0, ?4, ?4)",
        rusqlite::params![
            uuid::Uuid::new_v4().to_string(),
            user.id.to_string(),
            path.id.to_string(),
            chrono::Utc::now().to_rfc3339(),
        ],
    );
    assert!(result.is_err());
}

#[test]
fn test_invalid_transitions_are_rejected() {
    let mut db = test_db();
    let user = seed_user(&db, "Sami");
    let path = seed_path(&mut db, "Trail", "Hebron", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, path.id).unwrap();

    // Resume requires paused
    assert!(matches!(
        engine.resume(user.id, journey.id),
        Err(JourneyError::NotPaused)
    ));

    // Pausing twice fails the second time
    engine.pause(user.id, journey.id).unwrap();
    assert!(matches!(
        engine.pause(user.id, journey.id),
        Err(JourneyError::NotInProgress)
    ));

    // Terminal states accept nothing further
    engine.resume(user.id, journey.id).unwrap();
    engine
        .complete(user.id, journey.id, completion(5.0, 90))
        .unwrap();

    assert!(matches!(
        engine.complete(user.id, journey.id, completion(5.0, 90)),
        Err(JourneyError::NotActive)
    ));
    assert!(matches!(
        engine.abandon(user.id, journey.id),
        Err(JourneyError::NotActive)
    ));
    assert!(matches!(
        engine.pause(user.id, journey.id),
        Err(JourneyError::NotInProgress)
    ));
}

#[test]
fn test_completing_abandoned_journey_is_rejected() {
    let mut db = test_db();
    let user = seed_user(&db, "Dana");
    let path = seed_path(&mut db, "Trail", "Jenin", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, path.id).unwrap();
    engine.abandon(user.id, journey.id).unwrap();

    assert!(matches!(
        engine.complete(user.id, journey.id, completion(3.0, 60)),
        Err(JourneyError::NotActive)
    ));
}

#[test]
fn test_position_updates_only_while_in_progress() {
    let mut db = test_db();
    let user = seed_user(&db, "Rami");
    let path = seed_path(&mut db, "Trail", "Bethlehem", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, path.id).unwrap();

    let fix = PositionUpdate {
        lat: 31.70,
        lng: 35.20,
        altitude: Some(780.0),
        accuracy: Some(4.5),
    };

    let journey = engine.update_position(user.id, journey.id, fix).unwrap();
    assert_eq!(journey.recorded_positions.len(), 1);
    assert_eq!(journey.recorded_positions[0].altitude, Some(780.0));

    let second = PositionUpdate {
        lat: 31.71,
        lng: 35.21,
        altitude: None,
        accuracy: None,
    };
    let journey = engine.update_position(user.id, journey.id, second).unwrap();
    assert_eq!(journey.recorded_positions.len(), 2);

    // Timestamps are server-assigned and ordered
    assert!(
        journey.recorded_positions[0].timestamp <= journey.recorded_positions[1].timestamp
    );

    // Paused journeys do not accept fixes
    engine.pause(user.id, journey.id).unwrap();
    assert!(matches!(
        engine.update_position(user.id, journey.id, fix),
        Err(JourneyError::NotInProgress)
    ));
}

#[test]
fn test_position_update_validates_coordinates() {
    let mut db = test_db();
    let user = seed_user(&db, "Yara");
    let path = seed_path(&mut db, "Trail", "Nablus", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, path.id).unwrap();

    let bad = PositionUpdate {
        lat: 95.0,
        lng: 35.0,
        altitude: None,
        accuracy: None,
    };
    assert!(matches!(
        engine.update_position(user.id, journey.id, bad),
        Err(JourneyError::ValidationError(_))
    ));
}

#[test]
fn test_operations_require_ownership() {
    let mut db = test_db();
    let owner = seed_user(&db, "Owner");
    let other = seed_user(&db, "Other");
    let path = seed_path(&mut db, "Trail", "Jericho", Difficulty::Easy);

    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(owner.id, path.id).unwrap();

    assert!(matches!(
        engine.pause(other.id, journey.id),
        Err(JourneyError::NotOwner)
    ));
    assert!(matches!(
        engine.complete(other.id, journey.id, completion(1.0, 10)),
        Err(JourneyError::NotOwner)
    ));
}

#[test]
fn test_start_requires_active_path() {
    let mut db = test_db();
    let user = seed_user(&db, "Hala");
    let mut path = trailhead::paths::Path::new("Closed", "Hebron", 5.0, 100, Difficulty::Easy);
    path.is_active = false;
    trailhead::paths::PathStore::new(db.connection_mut())
        .insert(&path, &[])
        .unwrap();

    let mut engine = JourneyEngine::new(db.connection_mut());
    assert!(matches!(
        engine.start(user.id, path.id),
        Err(JourneyError::PathNotFound(_))
    ));
}

#[test]
fn test_completion_rolls_back_when_achievement_check_fails() {
    let mut db = test_db();
    let user = seed_user(&db, "Atomic");
    let path = seed_path(&mut db, "Trail", "Ramallah", Difficulty::Easy);

    install_default_achievements(db.connection()).unwrap();

    let journey = JourneyEngine::new(db.connection_mut())
        .start(user.id, path.id)
        .unwrap();

    // Sabotage the achievement recheck step
    db.connection()
        .execute_batch("ALTER TABLE user_achievements RENAME TO user_achievements_gone")
        .unwrap();

    let result = JourneyEngine::new(db.connection_mut()).complete(
        user.id,
        journey.id,
        completion(5.0, 90),
    );
    assert!(result.is_err());

    // The whole completion must have rolled back: journey still active,
    // counter untouched
    let journey = JourneyEngine::new(db.connection_mut())
        .get(journey.id)
        .unwrap();
    assert_eq!(journey.status, JourneyStatus::Started);
    assert!(journey.completed_at.is_none());

    let user = UserStore::new(db.connection()).get(user.id).unwrap().unwrap();
    assert_eq!(user.completed_trips, 0);
}

#[test]
fn test_statistics_totals_and_favorite_difficulty() {
    let mut db = test_db();
    let user = seed_user(&db, "Stats");
    let easy_a = seed_path(&mut db, "Easy A", "Ramallah", Difficulty::Easy);
    let easy_b = seed_path(&mut db, "Easy B", "Ramallah", Difficulty::Easy);
    let hard = seed_path(&mut db, "Hard", "Nablus", Difficulty::Hard);

    for (path, distance) in [(&easy_a, 4.0), (&easy_b, 6.0), (&hard, 12.0)] {
        let mut engine = JourneyEngine::new(db.connection_mut());
        let journey = engine.start(user.id, path.id).unwrap();
        engine
            .complete(user.id, journey.id, completion(distance, 100))
            .unwrap();
    }

    // One abandoned journey contributes to totals only
    let mut engine = JourneyEngine::new(db.connection_mut());
    let journey = engine.start(user.id, easy_a.id).unwrap();
    engine.abandon(user.id, journey.id).unwrap();

    let stats = engine.statistics(user.id).unwrap();
    assert_eq!(stats.total_journeys, 4);
    assert_eq!(stats.completed_journeys, 3);
    assert_eq!(stats.total_distance_km, 22.0);
    assert_eq!(stats.total_time_minutes, 300);
    assert_eq!(stats.favorite_difficulty, Some(Difficulty::Easy));

    // Trailing six months, all three completions landing in the current one
    assert_eq!(stats.monthly.len(), 6);
    let current = stats.monthly.last().unwrap();
    assert_eq!(current.completed, 3);
    assert_eq!(current.distance_km, 22.0);
}
