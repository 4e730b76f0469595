//! Fixed six-hourly trigger for [`SyncWorker::run_once`].

use std::sync::Arc;

use time::{Duration, OffsetDateTime, Time, UtcOffset};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::source::SourceError;
use super::worker::{SyncError, SyncOutcome, SyncWorker};

pub const INTERVAL_HOURS: u8 = 6;
pub const FREQUENCY: &str = "Every 6 hours";
pub const SCHEDULE: &str = "00:00, 06:00, 12:00, 18:00 UTC";
pub const CRON_EXPRESSION: &str = "0 0 */6 * * *";

/// Next UTC run boundary (00, 06, 12 or 18 o'clock) strictly after `now`.
pub fn next_run_after(now: OffsetDateTime) -> OffsetDateTime {
    let now = now.to_offset(UtcOffset::UTC);
    let next_hour = (now.hour() / INTERVAL_HOURS + 1) * INTERVAL_HOURS;
    now.replace_time(Time::MIDNIGHT) + Duration::hours(i64::from(next_hour))
}

/// `"HH:00:00 UTC (today)"` or `"... (tomorrow)"` relative to `now`.
pub fn describe_next_run(now: OffsetDateTime, next: OffsetDateTime) -> String {
    let now = now.to_offset(UtcOffset::UTC);
    let day = if next.date() == now.date() {
        "today"
    } else {
        "tomorrow"
    };
    format!("{:02}:00:00 UTC ({day})", next.hour())
}

fn log_outcome(result: Result<SyncOutcome, SyncError>) {
    match result {
        Ok(SyncOutcome::Completed(report)) => info!(
            fetched = report.fetched,
            upserted = report.upserted,
            failed_pages = report.failed_pages,
            "scheduled sync finished"
        ),
        Ok(SyncOutcome::AlreadyRunning) => {
            info!("scheduled sync skipped: previous run still active")
        }
        Err(SyncError::Upstream {
            last: SourceError::RateLimited,
            ..
        }) => warn!("scheduled sync hit the upstream rate limit; retrying at the next window"),
        Err(err) => error!(error = %err, "scheduled sync failed"),
    }
}

/// Run the worker at every boundary until `shutdown` is cancelled. Failures
/// are logged and never stop the loop.
pub fn spawn(worker: Arc<SyncWorker>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = OffsetDateTime::now_utc();
            let next = next_run_after(now);
            let wait = (next - now).unsigned_abs();
            info!(next_run = %next, "sync scheduler waiting");

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("sync scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            log_outcome(worker.run_once().await);
        }
    })
}
