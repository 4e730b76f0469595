//! Backend test support utilities
//!
//! Helpers shared by the backend's integration tests: idempotent logging
//! setup, Problem Details assertions, and unique test data.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
