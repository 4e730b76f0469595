use std::time::SystemTime;

use backend::auth::jwt::mint_access_token;
use backend::state::security_config::SecurityConfig;

/// `Authorization` header value for a freshly minted token.
pub fn bearer_for(subject: &str, security: &SecurityConfig) -> String {
    let token = mint_access_token(subject, SystemTime::now(), security)
        .expect("minting a test token should succeed");
    format!("Bearer {token}")
}
