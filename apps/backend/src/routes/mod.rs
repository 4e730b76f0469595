use actix_web::web;

use crate::error::AppError;
use crate::errors::ErrorCode;

pub mod auth;
pub mod cache;
pub mod crypto;
pub mod health;

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request(
            ErrorCode::BadRequest,
            format!("Parámetros de consulta inválidos: {err}"),
        )
        .into()
    })
}

/// Every route of the service. Authentication is applied around the whole
/// app by `AuthGate`, not per scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(query_config())
        .service(web::scope("/actuator").configure(health::configure_routes))
        .service(web::scope("/api/auth").configure(auth::configure_routes))
        .service(web::scope("/api/crypto").configure(crypto::configure_routes))
        .service(web::scope("/api/cache").configure(cache::configure_routes));
}
