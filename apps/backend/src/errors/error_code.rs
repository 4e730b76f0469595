//! Error codes surfaced in Problem Details responses.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! Every variant maps 1:1 to a SCREAMING_SNAKE_CASE string.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Missing, malformed, expired or mis-signed bearer token
    Unauthorized,
    /// Login failed; never says which half was wrong
    InvalidCredentials,
    Forbidden,

    // Request Validation
    ValidationError,
    BadRequest,
    InvalidSortField,

    // Conflicts
    EmailAlreadyRegistered,
    SyncInProgress,
    Conflict,

    // Not Found
    NotFound,
    CryptoNotFound,
    CacheNotFound,

    // Upstream
    ExternalServiceError,

    // System
    DbError,
    DbUnavailable,
    InternalError,
    ConfigError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden => "FORBIDDEN",

            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidSortField => "INVALID_SORT_FIELD",

            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::SyncInProgress => "SYNC_IN_PROGRESS",
            Self::Conflict => "CONFLICT",

            Self::NotFound => "NOT_FOUND",
            Self::CryptoNotFound => "CRYPTO_NOT_FOUND",
            Self::CacheNotFound => "CACHE_NOT_FOUND",

            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
