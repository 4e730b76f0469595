use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

use crate::auth::identity::Identity;
use crate::logging::pii::Redacted;
use crate::trace_ctx::TraceId;

/// One `request_completed` line per request, levelled by status class.
/// Authenticated requests also carry the redacted token subject.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

struct Completion<'a> {
    method: &'a str,
    path: &'a str,
    trace_id: &'a str,
    subject: Option<String>,
    started: Instant,
}

fn log_completion(c: &Completion<'_>, status: StatusCode) {
    let status_code = status.as_u16();
    let duration_us = c.started.elapsed().as_micros() as u64;
    let subject = c.subject.as_deref().map(Redacted);

    if status.is_server_error() {
        error!(http.method = %c.method, url.path = %c.path, http.status_code = status_code, duration_us, trace_id = %c.trace_id, subject = subject.map(tracing::field::display), message = "request_completed");
    } else if status.is_client_error() {
        warn!(http.method = %c.method, url.path = %c.path, http.status_code = status_code, duration_us, trace_id = %c.trace_id, subject = subject.map(tracing::field::display), message = "request_completed");
    } else {
        info!(http.method = %c.method, url.path = %c.path, http.status_code = status_code, duration_us, trace_id = %c.trace_id, subject = subject.map(tracing::field::display), message = "request_completed");
    }
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|t| t.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;
            let (status, subject) = match &result {
                Ok(res) => (
                    res.status(),
                    res.request()
                        .extensions()
                        .get::<Identity>()
                        .map(|identity| identity.subject.clone()),
                ),
                Err(err) => (err.as_response_error().status_code(), None),
            };
            log_completion(
                &Completion {
                    method: &method,
                    path: &path,
                    trace_id: &trace_id,
                    subject,
                    started,
                },
                status,
            );
            result
        })
    }
}
