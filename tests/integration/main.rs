//! Integration test modules.

mod common;

mod journey_lifecycle_test;
mod path_query_test;
mod review_rating_test;
