use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::errors::{messages, ErrorCode};
use crate::services::crypto::{self as crypto_service, ListParams};
use crate::state::app_state::AppState;
use crate::sync::{SyncError, SyncOutcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    status: &'static str,
    synced: usize,
    fetched: usize,
    failed_pages: u32,
}

/// Run a sync now and wait for it. Upstream failure is surfaced here as a
/// 502; the scheduled path only logs it.
async fn sync(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let worker = state.require_sync()?;
    match worker.run_once().await {
        Ok(SyncOutcome::Completed(report)) => Ok(HttpResponse::Ok().json(SyncResponse {
            status: "OK",
            synced: report.upserted,
            fetched: report.fetched,
            failed_pages: report.failed_pages,
        })),
        Ok(SyncOutcome::AlreadyRunning) => Err(AppError::conflict(
            ErrorCode::SyncInProgress,
            messages::SYNC_IN_PROGRESS,
        )),
        Err(SyncError::Upstream { last, .. }) => Err(AppError::external_service(last.to_string())),
        Err(SyncError::Store(e)) => Err(e.into()),
    }
}

async fn list(
    params: web::Query<ListParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let filter = params.to_filter()?;
    let db = state.require_db()?;
    let page = crypto_service::list(db, &state.cache, &filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn detail(
    coin_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    let record = crypto_service::detail(db, &state.cache, &coin_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    Ok(HttpResponse::Ok().json(crypto_service::stats(db, &state.cache).await?))
}

async fn scheduler_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    let running = state.sync.as_ref().is_some_and(|w| w.is_running());
    let status = crypto_service::scheduler_status(
        db,
        &state.cache,
        state.scheduler_enabled,
        running,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Literal paths are registered before `/{coin_id}` so they are not captured
/// as coin ids.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/sync", web::post().to(sync))
        .route("/list", web::get().to(list))
        .route("/stats", web::get().to(stats))
        .route("/scheduler/status", web::get().to(scheduler_status))
        .route("/{coin_id}", web::get().to(detail));
}
