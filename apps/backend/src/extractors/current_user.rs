use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};

use crate::auth::identity::Identity;
use crate::error::AppError;

/// Identity attached by `AuthGate`. Rejects with 401 when the route was
/// reached without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn email(&self) -> &str {
        &self.0.subject
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(AppError::missing_token),
        )
    }
}
