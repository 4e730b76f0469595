pub mod identity;
pub mod jwt;
pub mod password;

pub use identity::Identity;
pub use jwt::{mint_access_token, verify_access_token, Claims, TokenError};
