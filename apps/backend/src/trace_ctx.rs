//! Task-local trace id for the request being served.
//!
//! `RequestTrace` scopes every request future with its trace id so that
//! `AppError::error_response` and log lines deep in services can read it
//! without threading it through every call.

use std::cell::RefCell;

use tokio::task_local;

/// Request extension carrying the id `RequestTrace` generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Trace id of the current task, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Run `future` with `trace_id` visible through [`trace_id`].
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
