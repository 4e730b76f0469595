use super::jwt::Claims;

/// Authenticated caller, attached to request extensions by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Email the token was issued for
    pub subject: String,
    pub roles: Vec<String>,
    /// Token expiry, seconds since epoch
    pub expires_at: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles,
            expires_at: claims.exp,
        }
    }
}
