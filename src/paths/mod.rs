//! Path catalog: records, activity tags, and the query service.

pub mod geo;
pub mod query;
pub mod store;
pub mod types;

pub use query::PathQuery;
pub use store::PathStore;
pub use types::{
    Activity, Coordinate, Difficulty, NearbyPath, Path, PathError, PathFilter, PathStatistics,
    SortBy, SortOrder,
};
