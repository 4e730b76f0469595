//! Error types for the collector backend.

pub mod domain;
pub mod error_code;
pub mod messages;

pub use domain::DomainError;
pub use error_code::ErrorCode;
