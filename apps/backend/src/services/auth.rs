//! Registration and login. Every failure leaving this module is already an
//! `AppError` carrying its user-facing code and message.

use std::time::SystemTime;

use lazy_regex::regex_is_match;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::jwt::mint_access_token;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, FieldError};
use crate::errors::{messages, ErrorCode};
use crate::logging::pii::Redacted;
use crate::repos::users::{self, NewUser, User};
use crate::state::security_config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Outward view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for PublicIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email)
}

fn require(field: &str, value: &str, errors: &mut Vec<FieldError>) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, messages::empty_field(field)));
        false
    } else {
        true
    }
}

pub fn validate_registration(input: &Registration<'_>) -> Result<(), AppError> {
    let mut errors = Vec::new();

    require("firstName", input.first_name, &mut errors);
    require("lastName", input.last_name, &mut errors);
    if require("email", input.email, &mut errors) && !is_valid_email(input.email) {
        errors.push(
            FieldError::new("email", messages::INVALID_EMAIL_FORMAT).with_rejected(input.email),
        );
    }
    if require("password", input.password, &mut errors)
        && input.password.chars().count() < MIN_PASSWORD_LENGTH
    {
        errors.push(FieldError::new("password", messages::WEAK_PASSWORD));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors))
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::conflict(ErrorCode::EmailAlreadyRegistered, messages::email_taken(email))
}

/// Validate, reject duplicates, hash and persist.
///
/// A concurrent registration that slips past the existence check hits the
/// unique index and produces the same conflict.
pub async fn register<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    input: Registration<'_>,
    security: &SecurityConfig,
) -> Result<PublicIdentity, AppError> {
    validate_registration(&input)?;

    if users::exists_by_email(conn, input.email).await? {
        debug!(email = %Redacted(input.email), "registration rejected: email exists");
        return Err(email_taken(input.email));
    }

    let password_hash = hash_password(input.password, security.bcrypt_cost).await?;

    let user = users::create_user(
        conn,
        NewUser {
            first_name: input.first_name.trim(),
            last_name: input.last_name.trim(),
            email: input.email,
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(|e| {
        if e.is_unique_email() {
            email_taken(input.email)
        } else {
            AppError::from(e)
        }
    })?;

    info!(user_id = user.id, email = %Redacted(&user.email), "user registered");
    Ok(user.into())
}

/// Returns a signed access token. Unknown email and wrong password fail with
/// the same error.
pub async fn login<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
    password: &str,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let mut errors = Vec::new();
    require("email", email, &mut errors);
    require("password", password, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let Some(user) = users::find_by_email(conn, email).await? else {
        debug!(email = %Redacted(email), "login failed");
        return Err(AppError::invalid_credentials());
    };

    if !verify_password(password, &user.password_hash).await? {
        debug!(email = %Redacted(email), "login failed");
        return Err(AppError::invalid_credentials());
    }

    mint_access_token(&user.email, SystemTime::now(), security)
}

/// Profile of the token subject. A valid token for a deleted user is a 401,
/// not a 404.
pub async fn profile<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<PublicIdentity, AppError> {
    users::find_by_email(conn, email)
        .await?
        .map(PublicIdentity::from)
        .ok_or_else(AppError::invalid_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration<'a>(email: &'a str, password: &'a str) -> Registration<'a> {
        Registration {
            first_name: "Juan",
            last_name: "Perez",
            email,
            password,
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(validate_registration(&registration("juan@test.com", "Password123")).is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["juan", "juan@", "@test.com", "juan@test", "ju an@test.com"] {
            let err = validate_registration(&registration(email, "Password123")).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError, "email {email:?}");
            assert_eq!(err.detail(), messages::INVALID_EMAIL_FORMAT);
        }
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_registration(&registration("juan@test.com", "short")).unwrap_err();
        assert_eq!(err.detail(), messages::WEAK_PASSWORD);
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_registration(&registration("juan@test.com", "ñññññññ1")).is_ok());
    }

    #[test]
    fn blank_fields_are_each_reported() {
        let input = Registration {
            first_name: " ",
            last_name: "",
            email: "juan@test.com",
            password: "Password123",
        };
        match validate_registration(&input).unwrap_err() {
            AppError::Validation { field_errors, .. } => {
                let fields: Vec<_> = field_errors.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, vec!["firstName", "lastName"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn public_identity_serializes_camel_case_without_hash() {
        let identity = PublicIdentity {
            id: 7,
            first_name: "Juan".into(),
            last_name: "Perez".into(),
            email: "juan@test.com".into(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["firstName"], "Juan");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
