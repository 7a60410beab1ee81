//! Journey tracking: lifecycle state machine, position recording and
//! derived statistics.

pub mod engine;
pub mod types;

pub use engine::JourneyEngine;
pub use types::{
    CompletionData, Journey, JourneyError, JourneyStatistics, JourneyStatus, MonthlyStat,
    PositionUpdate, TrackPoint,
};
