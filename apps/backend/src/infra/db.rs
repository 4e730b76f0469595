use std::future::Future;
use std::time::Duration;

use migration::MigrationCommand;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{db_url, DbProfile};
use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Retry `connect` with a fixed pause; the last error wins.
async fn retry_connection<T, F, Fut>(
    mut connect: F,
    max_attempts: u32,
    interval: Duration,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempts = attempt, "database connection established after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %err, "database connection failed; retrying");
                tokio::time::sleep(interval).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn connect_options(profile: DbProfile, url: String) -> ConnectOptions {
    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(false);
    if profile == DbProfile::InMemory {
        // Every pooled connection to sqlite::memory: is a separate database
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(10).connect_timeout(Duration::from_secs(10));
    }
    options
}

/// Connect without running migrations.
pub async fn connect_db(profile: DbProfile) -> Result<DatabaseConnection, AppError> {
    let url = db_url(profile)?;
    let attempts = if profile == DbProfile::InMemory {
        1
    } else {
        CONNECT_ATTEMPTS
    };

    retry_connection(
        || {
            let options = connect_options(profile, url.clone());
            async move {
                Database::connect(options)
                    .await
                    .map_err(|e| AppError::db_unavailable(format!("connect failed: {e}")))
            }
        },
        attempts,
        CONNECT_RETRY_INTERVAL,
    )
    .await
}

/// Connect and, for profiles that allow it, apply pending migrations.
pub async fn bootstrap_db(profile: DbProfile) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(profile).await?;
    if profile.auto_migrate() {
        migration::migrate(&conn, MigrationCommand::Up)
            .await
            .map_err(|e| AppError::config(format!("migrations failed: {e}")))?;
    }
    info!(?profile, "database ready");
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let out = retry_connection(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AppError::db_unavailable("down"))
                    } else {
                        Ok(n)
                    }
                }
            },
            5,
            Duration::ZERO,
        )
        .await
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let out: Result<(), AppError> = retry_connection(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::db_unavailable("down")) }
            },
            3,
            Duration::ZERO,
        )
        .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn in_memory_bootstrap_creates_schema() {
        let conn = bootstrap_db(DbProfile::InMemory).await.unwrap();
        assert!(migration::count_applied_migrations(&conn).await.unwrap() >= 1);
    }
}
