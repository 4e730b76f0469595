use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheRegion;
use crate::error::AppError;
use crate::errors::{messages, ErrorCode};
use crate::services::crypto as crypto_service;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheInfo {
    total_caches: usize,
    cache_names: Vec<&'static str>,
    cache_descriptions: BTreeMap<&'static str, &'static str>,
    backend: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearResponse {
    status: &'static str,
    message: &'static str,
    cleared_caches: Vec<&'static str>,
    total_cleared: usize,
}

impl ClearResponse {
    fn new(message: &'static str, regions: &[CacheRegion]) -> Self {
        Self {
            status: "OK",
            message,
            cleared_caches: regions.iter().map(|r| r.name()).collect(),
            total_cleared: regions.len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

async fn info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(CacheInfo {
        total_caches: CacheRegion::ALL.len(),
        cache_names: CacheRegion::ALL.iter().map(|r| r.name()).collect(),
        cache_descriptions: CacheRegion::ALL
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect(),
        backend: state.cache.backend_name(),
    })
}

async fn clear_regions(
    state: &AppState,
    regions: &[CacheRegion],
    message: &'static str,
) -> HttpResponse {
    state.cache.invalidate_many(regions).await;
    let response = ClearResponse::new(message, regions);
    info!(caches = ?response.cleared_caches, "caches cleared manually");
    HttpResponse::Ok().json(response)
}

async fn clear_all(state: web::Data<AppState>) -> HttpResponse {
    clear_regions(&state, &CacheRegion::ALL, "Todos los cachés limpiados exitosamente").await
}

async fn clear_one(
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let Some(region) = CacheRegion::parse(&name) else {
        warn!(cache = %name, "attempt to clear unknown cache");
        return Err(AppError::not_found(
            ErrorCode::CacheNotFound,
            messages::cache_not_found(&name),
        ));
    };
    Ok(clear_regions(&state, &[region], "Caché limpiado exitosamente").await)
}

async fn clear_lists(state: web::Data<AppState>) -> HttpResponse {
    clear_regions(
        &state,
        &[CacheRegion::CryptoList, CacheRegion::CryptoStats],
        "Cachés de listas limpiados exitosamente",
    )
    .await
}

async fn clear_details(state: web::Data<AppState>) -> HttpResponse {
    clear_regions(
        &state,
        &[CacheRegion::CryptoDetails],
        "Caché de detalles limpiado exitosamente",
    )
    .await
}

async fn warmup(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = state.require_db()?;
    crypto_service::warmup(db, &state.cache).await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        status: "OK",
        message: "Caché precargada: estadísticas y primera página del listado",
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/info", web::get().to(info))
        .route("/clear-all", web::delete().to(clear_all))
        .route("/clear-lists", web::delete().to(clear_lists))
        .route("/clear-details", web::delete().to(clear_details))
        .route("/clear/{name}", web::delete().to(clear_one))
        .route("/warmup", web::post().to(warmup));
}
