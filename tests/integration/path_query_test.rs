//! Integration tests for the path query service.

use crate::common::{complete_journey, seed_path, seed_user, test_db};
use trailhead::paths::{
    Activity, Coordinate, Difficulty, Path, PathFilter, PathQuery, PathStore,
};
use trailhead::storage::config::QuerySettings;

#[test]
fn test_activity_filter_matches_tagged_paths() {
    let mut db = test_db();

    let hiking = Activity::new("hiking", "Hiking");
    let biking = Activity::new("biking", "Mountain Biking");
    {
        let mut store = PathStore::new(db.connection_mut());
        store.insert_activity(&hiking).unwrap();
        store.insert_activity(&biking).unwrap();

        let tagged = Path::new("Tagged", "Ramallah", 8.0, 150, Difficulty::Easy);
        store.insert(&tagged, &[hiking.id]).unwrap();

        let other = Path::new("Other", "Ramallah", 8.0, 150, Difficulty::Easy);
        store.insert(&other, &[biking.id]).unwrap();
    }

    let query = PathQuery::new(db.connection());
    let filter = PathFilter {
        activity: Some("hiking".to_string()),
        ..Default::default()
    };

    let paths = query.list(&filter).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].name, "Tagged");
}

#[test]
fn test_location_substring_filter() {
    let mut db = test_db();
    seed_path(&mut db, "A", "North Ramallah", Difficulty::Easy);
    seed_path(&mut db, "B", "Jericho valley", Difficulty::Easy);

    let query = PathQuery::new(db.connection());
    let filter = PathFilter {
        location: Some("Ramallah".to_string()),
        ..Default::default()
    };

    let paths = query.list(&filter).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].name, "A");
}

#[test]
fn test_min_rating_filter_uses_cached_rating() {
    let mut db = test_db();
    let user = seed_user(&db, "Rater");
    let good = seed_path(&mut db, "Good", "Ramallah", Difficulty::Easy);
    let bad = seed_path(&mut db, "Bad", "Ramallah", Difficulty::Easy);

    complete_journey(&mut db, &user, &good, 5.0);
    complete_journey(&mut db, &user, &bad, 5.0);

    let mut reviews = trailhead::reviews::ReviewManager::new(db.connection_mut());
    reviews.submit(user.id, good.id, 5, None).unwrap();
    reviews.submit(user.id, bad.id, 2, None).unwrap();

    let query = PathQuery::new(db.connection());
    let filter = PathFilter {
        min_rating: Some(4.0),
        ..Default::default()
    };

    let paths = query.list(&filter).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].name, "Good");
}

#[test]
fn test_search_matches_name_description_location() {
    let mut db = test_db();
    {
        let mut store = PathStore::new(db.connection_mut());

        let mut by_desc = Path::new("Plain Name", "Hebron", 5.0, 100, Difficulty::Easy);
        by_desc.description = Some("Ancient terraces and springs".to_string());
        store.insert(&by_desc, &[]).unwrap();

        let by_location = Path::new("Other", "Terrace District", 5.0, 100, Difficulty::Easy);
        store.insert(&by_location, &[]).unwrap();

        let unrelated = Path::new("Unrelated", "Jenin", 5.0, 100, Difficulty::Easy);
        store.insert(&unrelated, &[]).unwrap();
    }

    let query = PathQuery::new(db.connection());
    let hits = query.search("errace").unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_featured_listing_respects_limit() {
    let mut db = test_db();
    {
        let mut store = PathStore::new(db.connection_mut());
        for i in 0..8 {
            let mut path = Path::new(&format!("Featured {i}"), "X", 5.0, 100, Difficulty::Easy);
            path.is_featured = true;
            path.rating = i as f64 / 2.0;
            store.insert(&path, &[]).unwrap();
        }
    }

    let settings = QuerySettings::default();
    let query = PathQuery::with_settings(db.connection(), settings);

    let featured = query.featured().unwrap();
    assert_eq!(featured.len(), 5);
    // Best rated first
    assert_eq!(featured[0].name, "Featured 7");
}

#[test]
fn test_similar_paths_share_difficulty_or_activity() {
    let mut db = test_db();

    let hiking = Activity::new("hiking", "Hiking");
    let (base, same_difficulty, shared_tag, unrelated) = {
        let mut store = PathStore::new(db.connection_mut());
        store.insert_activity(&hiking).unwrap();

        let base = Path::new("Base", "Ramallah", 8.0, 150, Difficulty::Hard);
        store.insert(&base, &[hiking.id]).unwrap();

        let same_difficulty = Path::new("Also Hard", "Nablus", 9.0, 180, Difficulty::Hard);
        store.insert(&same_difficulty, &[]).unwrap();

        let shared_tag = Path::new("Easy Hike", "Jenin", 4.0, 90, Difficulty::Easy);
        store.insert(&shared_tag, &[hiking.id]).unwrap();

        let unrelated = Path::new("Unrelated", "Hebron", 4.0, 90, Difficulty::Easy);
        store.insert(&unrelated, &[]).unwrap();

        (base, same_difficulty, shared_tag, unrelated)
    };

    let query = PathQuery::new(db.connection());
    let similar = query.similar(base.id).unwrap();

    let names: Vec<&str> = similar.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&same_difficulty.name.as_str()));
    assert!(names.contains(&shared_tag.name.as_str()));
    assert!(!names.contains(&unrelated.name.as_str()));
    assert!(!names.contains(&"Base"));
}

#[test]
fn test_nearby_caps_results_at_limit() {
    let mut db = test_db();
    {
        let mut store = PathStore::new(db.connection_mut());
        for i in 0..25 {
            let mut path = Path::new(&format!("Nearby {i}"), "X", 5.0, 100, Difficulty::Easy);
            // All within a couple of kilometers of the origin
            path.coordinates = vec![Coordinate::new(31.90 + (i as f64) * 0.001, 35.20)];
            store.insert(&path, &[]).unwrap();
        }
    }

    let query = PathQuery::new(db.connection());
    let results = query.nearby(31.90, 35.20, Some(10.0)).unwrap();

    assert_eq!(results.len(), 20);
    // Ascending by distance throughout
    for pair in results.windows(2) {
        assert!(pair[0].distance_km <= pair[1].distance_km);
    }
}

#[test]
fn test_paths_without_coordinates_are_skipped_by_nearby() {
    let mut db = test_db();
    seed_path(&mut db, "No Geometry", "Ramallah", Difficulty::Easy);

    let query = PathQuery::new(db.connection());
    let results = query.nearby(31.90, 35.20, Some(50.0)).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_path_statistics_count_journeys_and_visitors() {
    let mut db = test_db();
    let alice = seed_user(&db, "Alice");
    let bob = seed_user(&db, "Bob");
    let path = seed_path(&mut db, "Popular", "Ramallah", Difficulty::Easy);

    complete_journey(&mut db, &alice, &path, 5.0);
    complete_journey(&mut db, &alice, &path, 5.0);
    complete_journey(&mut db, &bob, &path, 5.0);

    // One abandoned attempt still counts as a journey and a visitor
    {
        let mut journeys = trailhead::journeys::JourneyEngine::new(db.connection_mut());
        let journey = journeys.start(bob.id, path.id).unwrap();
        journeys.abandon(bob.id, journey.id).unwrap();
    }

    let query = PathQuery::new(db.connection());
    let stats = query.statistics(path.id).unwrap();

    assert_eq!(stats.total_journeys, 4);
    assert_eq!(stats.completed_journeys, 3);
    assert_eq!(stats.unique_visitors, 2);
    assert_eq!(stats.average_duration, Some(120.0));
}
