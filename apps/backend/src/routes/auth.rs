use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{CurrentUser, JsonBody};
use crate::services::auth::{self as auth_service, Registration};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

async fn register(
    body: JsonBody<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    let identity = auth_service::register(
        db,
        Registration {
            first_name: &body.first_name,
            last_name: &body.last_name,
            email: body.email.trim(),
            password: &body.password,
        },
        &state.security,
    )
    .await?;
    Ok(HttpResponse::Ok().json(identity))
}

async fn login(
    body: JsonBody<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    let token =
        auth_service::login(db, body.email.trim(), &body.password, &state.security).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

async fn me(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    let identity = auth_service::profile(db, user.email()).await?;
    Ok(HttpResponse::Ok().json(identity))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/me", web::get().to(me));
}
