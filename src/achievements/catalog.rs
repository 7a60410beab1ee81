//! Built-in achievement catalog.

use rusqlite::Connection;

use super::engine::insert_achievement;
use super::types::{Achievement, AchievementCategory, AchievementError, Requirement};
use crate::paths::Difficulty;

/// Get all default achievement definitions.
pub fn default_achievements() -> Vec<Achievement> {
    let mut achievements = Vec::new();

    achievements.extend(explorer_achievements());
    achievements.extend(hiker_achievements());
    achievements.extend(challenge_achievements());
    achievements.extend(region_achievements());

    achievements
}

/// Install the default catalog, skipping slugs that already exist.
/// Returns the number of definitions written.
pub fn install_default_achievements(conn: &Connection) -> Result<usize, AchievementError> {
    let mut installed = 0;
    for achievement in default_achievements() {
        if insert_achievement(conn, &achievement)? {
            installed += 1;
        }
    }

    tracing::info!("Installed {} default achievements", installed);
    Ok(installed)
}

fn explorer_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first-path",
            "First Steps",
            "Complete your first path",
            AchievementCategory::Explorer,
            10,
            Requirement::CompletedPaths { completed_paths: 1 },
        )
        .with_icon("footsteps"),
        Achievement::new(
            "explorer-5",
            "Explorer",
            "Complete 5 different paths",
            AchievementCategory::Explorer,
            25,
            Requirement::CompletedPaths { completed_paths: 5 },
        )
        .with_icon("compass"),
        Achievement::new(
            "pathfinder",
            "Pathfinder",
            "Complete 10 different paths",
            AchievementCategory::Explorer,
            50,
            Requirement::CompletedPaths {
                completed_paths: 10,
            },
        )
        .with_icon("map"),
        Achievement::new(
            "wanderer",
            "Wanderer",
            "Complete paths in 5 different locations",
            AchievementCategory::Explorer,
            40,
            Requirement::UniqueLocations {
                unique_locations: 5,
            },
        )
        .with_icon("globe"),
    ]
}

fn hiker_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "distance-10km",
            "10K Club",
            "Travel a total of 10 kilometers",
            AchievementCategory::Hiker,
            15,
            Requirement::TotalDistance {
                total_distance: 10.0,
            },
        )
        .with_icon("milestone"),
        Achievement::new(
            "distance-50km",
            "Half Century",
            "Travel a total of 50 kilometers",
            AchievementCategory::Hiker,
            40,
            Requirement::TotalDistance {
                total_distance: 50.0,
            },
        )
        .with_icon("trophy"),
        Achievement::new(
            "distance-100km",
            "Century Walker",
            "Travel a total of 100 kilometers",
            AchievementCategory::Hiker,
            75,
            Requirement::TotalDistance {
                total_distance: 100.0,
            },
        )
        .with_icon("medal"),
        Achievement::new(
            "duration-24h",
            "Full Day Out",
            "Spend 24 hours in total on the trail",
            AchievementCategory::Hiker,
            35,
            Requirement::TotalDuration {
                total_duration: 1440,
            },
        )
        .with_icon("hourglass"),
    ]
}

fn challenge_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "hard-path",
            "Challenge Accepted",
            "Complete a hard difficulty path",
            AchievementCategory::Challenge,
            30,
            Requirement::DifficultyCount {
                difficulty: Difficulty::Hard,
                count: 1,
            },
        )
        .with_icon("mountain"),
        Achievement::new(
            "streak-3",
            "Consistent Explorer",
            "Complete paths on 3 consecutive days",
            AchievementCategory::Challenge,
            20,
            Requirement::ConsecutiveDays {
                consecutive_days: 3,
            },
        )
        .with_icon("calendar"),
        Achievement::new(
            "streak-7",
            "Week Warrior",
            "Complete paths on 7 consecutive days",
            AchievementCategory::Challenge,
            50,
            Requirement::ConsecutiveDays {
                consecutive_days: 7,
            },
        )
        .with_icon("fire"),
    ]
}

fn region_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "ramallah-explorer",
            "Ramallah Explorer",
            "Complete 3 paths in the Ramallah area",
            AchievementCategory::RegionSpecific,
            25,
            Requirement::RegionPaths {
                region: "Ramallah".to_string(),
                paths_count: 3,
            },
        )
        .with_icon("location"),
        Achievement::new(
            "jerusalem-trails",
            "Jerusalem Trails",
            "Complete 3 paths in the Jerusalem area",
            AchievementCategory::RegionSpecific,
            25,
            Requirement::RegionPaths {
                region: "Jerusalem".to_string(),
                paths_count: 3,
            },
        )
        .with_icon("location"),
        Achievement::new(
            "bethlehem-walker",
            "Bethlehem Walker",
            "Complete 3 paths in the Bethlehem area",
            AchievementCategory::RegionSpecific,
            25,
            Requirement::RegionPaths {
                region: "Bethlehem".to_string(),
                paths_count: 3,
            },
        )
        .with_icon("location"),
    ]
}
