#![allow(dead_code)]

pub mod app_builder;
pub mod auth;
pub mod fake_source;
pub mod test_state;

pub use app_builder::create_test_app;
pub use fake_source::{market_record, three_page_source, FakeSource};
pub use test_state::{build_test_state, test_security, tiny_policy};
