//! Integration tests for reviews and the path rating aggregator.

use crate::common::{complete_journey, seed_path, seed_user, test_db};
use trailhead::paths::{Difficulty, PathQuery};
use trailhead::reviews::{recompute_path_rating, ReviewError, ReviewManager};

#[test]
fn test_rating_cache_tracks_review_set() {
    let mut db = test_db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let path = seed_path(&mut db, "Wadi Qelt", "Jericho", Difficulty::Moderate);

    complete_journey(&mut db, &alice, &path, 11.0);
    complete_journey(&mut db, &bob, &path, 11.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    reviews
        .submit(alice.id, path.id, 4, Some("Lovely gorge".to_string()))
        .unwrap();
    let bob_review = reviews.submit(bob.id, path.id, 5, None).unwrap();

    let fetched = PathQuery::new(db.connection()).get_active(path.id).unwrap();
    assert_eq!(fetched.rating, 4.5);
    assert_eq!(fetched.review_count, 2);

    // Deleting the 5 drops the average to 4.0 with one review left
    ReviewManager::new(db.connection_mut())
        .delete(bob.id, bob_review.id)
        .unwrap();

    let fetched = PathQuery::new(db.connection()).get_active(path.id).unwrap();
    assert_eq!(fetched.rating, 4.0);
    assert_eq!(fetched.review_count, 1);
}

#[test]
fn test_review_requires_completed_journey() {
    let mut db = test_db();
    let user = seed_user(&db, "Newcomer");
    let path = seed_path(&mut db, "Trail", "Ramallah", Difficulty::Easy);

    let mut reviews = ReviewManager::new(db.connection_mut());
    let result = reviews.submit(user.id, path.id, 5, None);
    assert!(matches!(result, Err(ReviewError::PathNotCompleted)));

    // An abandoned journey does not qualify
    {
        let mut journeys = trailhead::journeys::JourneyEngine::new(db.connection_mut());
        let journey = journeys.start(user.id, path.id).unwrap();
        journeys.abandon(user.id, journey.id).unwrap();
    }
    let mut reviews = ReviewManager::new(db.connection_mut());
    let result = reviews.submit(user.id, path.id, 5, None);
    assert!(matches!(result, Err(ReviewError::PathNotCompleted)));
}

#[test]
fn test_one_review_per_user_per_path() {
    let mut db = test_db();
    let user = seed_user(&db, "Critic");
    let path = seed_path(&mut db, "Trail", "Hebron", Difficulty::Easy);

    complete_journey(&mut db, &user, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    reviews.submit(user.id, path.id, 3, None).unwrap();

    // A second submission is rejected even with different content
    let result = reviews.submit(user.id, path.id, 5, Some("Changed my mind".to_string()));
    assert!(matches!(result, Err(ReviewError::AlreadyReviewed)));
}

#[test]
fn test_rating_bounds_are_validated() {
    let mut db = test_db();
    let user = seed_user(&db, "Bounds");
    let path = seed_path(&mut db, "Trail", "Jenin", Difficulty::Easy);

    complete_journey(&mut db, &user, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    assert!(matches!(
        reviews.submit(user.id, path.id, 0, None),
        Err(ReviewError::ValidationError(_))
    ));
    assert!(matches!(
        reviews.submit(user.id, path.id, 6, None),
        Err(ReviewError::ValidationError(_))
    ));
}

#[test]
fn test_update_recomputes_rating_and_checks_ownership() {
    let mut db = test_db();
    let owner = seed_user(&db, "Owner");
    let other = seed_user(&db, "Other");
    let path = seed_path(&mut db, "Trail", "Bethlehem", Difficulty::Easy);

    complete_journey(&mut db, &owner, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    let review = reviews.submit(owner.id, path.id, 2, None).unwrap();

    assert!(matches!(
        reviews.update(other.id, review.id, Some(5), None),
        Err(ReviewError::NotOwner)
    ));
    assert!(matches!(
        reviews.delete(other.id, review.id),
        Err(ReviewError::NotOwner)
    ));

    let updated = reviews.update(owner.id, review.id, Some(5), None).unwrap();
    assert_eq!(updated.rating, 5);

    let fetched = PathQuery::new(db.connection()).get_active(path.id).unwrap();
    assert_eq!(fetched.rating, 5.0);
    assert_eq!(fetched.review_count, 1);
}

#[test]
fn test_only_approved_reviews_count() {
    let mut db = test_db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let path = seed_path(&mut db, "Trail", "Nablus", Difficulty::Easy);

    complete_journey(&mut db, &alice, &path, 4.0);
    complete_journey(&mut db, &bob, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    reviews.submit(alice.id, path.id, 5, None).unwrap();
    let bob_review = reviews.submit(bob.id, path.id, 1, None).unwrap();

    // Moderation pulls Bob's review out of the aggregate
    db.connection()
        .execute(
            "UPDATE reviews SET is_approved = 0 WHERE id = ?1",
            rusqlite::params![bob_review.id.to_string()],
        )
        .unwrap();
    recompute_path_rating(db.connection(), path.id).unwrap();

    let fetched = PathQuery::new(db.connection()).get_active(path.id).unwrap();
    assert_eq!(fetched.rating, 5.0);
    assert_eq!(fetched.review_count, 1);

    let visible = ReviewManager::new(db.connection_mut())
        .reviews_for_path(path.id)
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[test]
fn test_rating_resets_to_zero_when_last_review_goes() {
    let mut db = test_db();
    let user = seed_user(&db, "Solo");
    let path = seed_path(&mut db, "Trail", "Jericho", Difficulty::Easy);

    complete_journey(&mut db, &user, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    let review = reviews.submit(user.id, path.id, 4, None).unwrap();
    reviews.delete(user.id, review.id).unwrap();

    let fetched = PathQuery::new(db.connection()).get_active(path.id).unwrap();
    assert_eq!(fetched.rating, 0.0);
    assert_eq!(fetched.review_count, 0);
}

#[test]
fn test_overlong_comment_is_rejected() {
    let mut db = test_db();
    let user = seed_user(&db, "Wordy");
    let path = seed_path(&mut db, "Trail", "Ramallah", Difficulty::Easy);

    complete_journey(&mut db, &user, &path, 4.0);

    let mut reviews = ReviewManager::new(db.connection_mut());
    let essay = "x".repeat(1001);
    assert!(matches!(
        reviews.submit(user.id, path.id, 4, Some(essay)),
        Err(ReviewError::ValidationError(_))
    ));
}
