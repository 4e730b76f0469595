#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use serde_json::Value;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Read a successful response body as JSON, failing with the raw body on a
/// non-2xx status.
pub async fn json_ok<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert!(
        status.is_success(),
        "expected 2xx, got {status}: {}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("response body should be JSON")
}

/// Problem Details body with the per-request `trace_id` removed, for
/// comparing two error responses.
pub fn without_trace_id(mut problem: Value) -> Value {
    if let Some(obj) = problem.as_object_mut() {
        obj.remove("trace_id");
    }
    problem
}
