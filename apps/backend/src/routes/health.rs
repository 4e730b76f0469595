use actix_web::{web, HttpResponse};
use migration::get_latest_migration_version;
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    db: &'static str,
    migrations: String,
    cache: &'static str,
    time: String,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
}

async fn probe_db(state: &AppState) -> (&'static str, String) {
    let Some(db) = state.db() else {
        return ("error", "unknown".to_string());
    };
    let ping = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT 1 AS health_check".to_string(),
        ))
        .await;
    if let Err(e) = ping {
        warn!(error = %e, "health check query failed");
        return ("error", "unknown".to_string());
    }
    let migrations = match get_latest_migration_version(db).await {
        Ok(Some(version)) => version,
        Ok(None) => "no_migrations".to_string(),
        Err(_) => "unknown".to_string(),
    };
    ("ok", migrations)
}

/// Liveness plus a database probe. Always 200 so the process is not
/// restarted for a database outage; `db` tells the two apart.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    let (db, migrations) = probe_db(&state).await;
    let time = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    HttpResponse::Ok().json(HealthResponse {
        status: "UP",
        db,
        migrations,
        cache: state.cache.backend_name(),
        time,
    })
}

async fn info() -> HttpResponse {
    HttpResponse::Ok().json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/info", web::get().to(info));
}
