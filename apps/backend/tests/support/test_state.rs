use std::sync::Arc;
use std::time::Duration;

use backend::config::db::DbProfile;
use backend::infra::state::build_state;
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::sync::{MarketSource, PagePolicy};
use backend::AppError;

pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Low bcrypt cost keeps registration fast in tests.
pub fn test_security() -> SecurityConfig {
    SecurityConfig::try_new(TEST_SECRET)
        .expect("test secret is not blank")
        .with_bcrypt_cost(4)
}

/// Three pages of two, no pause between pages.
pub fn tiny_policy() -> PagePolicy {
    PagePolicy {
        per_page: 2,
        pages: 3,
        delay: Duration::ZERO,
    }
}

/// Private in-memory database, in-process cache, scheduler off.
pub async fn build_test_state(source: Arc<dyn MarketSource>) -> Result<AppState, AppError> {
    build_state(test_security())
        .with_db(DbProfile::InMemory)
        .with_market_source(source)
        .with_page_policy(tiny_policy())
        .build()
        .await
}
