//! Reviews and the path rating aggregator.

pub mod manager;
pub mod types;

pub use manager::{recompute_path_rating, ReviewManager};
pub use types::{Review, ReviewError};
