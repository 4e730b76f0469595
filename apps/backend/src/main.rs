use actix_web::{web, App, HttpServer};
use backend::cache::CacheStore;
use backend::config::app::AppConfig;
use backend::infra::state::build_state;
use backend::middleware::{cors_middleware, AuthGate, RequestTrace, StructuredLogger, TraceSpan};
use backend::routes;
use backend::sync::scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let cache = match config.redis_url.as_deref() {
        Some(url) => match CacheStore::redis(url).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "redis unavailable; falling back to in-process cache");
                CacheStore::in_memory()
            }
        },
        None => CacheStore::in_memory(),
    };

    let app_state = match build_state(config.security.clone())
        .with_db(config.db_profile)
        .with_cache(cache)
        .with_sync_config(config.sync.clone())
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    info!(
        cache = app_state.cache.backend_name(),
        scheduler = app_state.scheduler_enabled,
        "application state ready"
    );

    let shutdown = CancellationToken::new();
    let scheduler_handle = match (&app_state.sync, app_state.scheduler_enabled) {
        (Some(worker), true) => Some(scheduler::spawn(worker.clone(), shutdown.clone())),
        _ => None,
    };

    let data = web::Data::new(app_state);
    let security = config.security.clone();
    let gateway_mode = config.gateway_mode;
    let origins = config.cors_allowed_origins.clone();

    info!(host = %config.host, port = config.port, "starting HTTP server");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(AuthGate::new(security.clone()).gateway_mode(gateway_mode))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .wrap(cors_middleware(&origins))
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let result = server.await;

    shutdown.cancel();
    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
    }

    result
}
