//! Bearer-token gate in front of every route.
//!
//! Paths not on the public allow-list require a valid access token. A
//! verified token attaches an [`Identity`] to request extensions; in gateway
//! mode the same identity is also re-emitted as `X-User-*` request headers for
//! handlers that only look at headers. No database access happens here.

use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use actix_web::http::Method;
use actix_web::{Error, HttpMessage};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, Span};

use crate::auth::identity::Identity;
use crate::auth::jwt::{bearer_token, verify_access_token};
use crate::error::AppError;
use crate::logging::pii::Redacted;
use crate::state::security_config::SecurityConfig;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    Exact(&'static str),
    /// Matches the prefix itself and anything below it on a `/` boundary
    Prefix(&'static str),
}

impl PathRule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(p) => path == *p,
            PathRule::Prefix(p) => match path.strip_prefix(p) {
                Some(rest) => rest.is_empty() || rest.starts_with('/') || p.ends_with('/'),
                None => false,
            },
        }
    }
}

/// Allow-list of routes served without a token. Anything else is protected.
#[derive(Debug, Clone)]
pub struct PublicPaths {
    rules: Vec<PathRule>,
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self {
            rules: vec![
                PathRule::Prefix("/api/auth/register"),
                PathRule::Prefix("/api/auth/login"),
                // Reserved for unauthenticated endpoints: anything mounted
                // under it skips the token check
                PathRule::Prefix("/api/public"),
                PathRule::Prefix("/swagger-ui"),
                PathRule::Prefix("/v3/api-docs"),
                PathRule::Exact("/actuator/health"),
                PathRule::Exact("/actuator/info"),
            ],
        }
    }
}

impl PublicPaths {
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: PathRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }
}

struct GateConfig {
    security: SecurityConfig,
    public: PublicPaths,
    gateway_mode: bool,
}

pub struct AuthGate {
    config: Rc<GateConfig>,
}

impl AuthGate {
    pub fn new(security: SecurityConfig) -> Self {
        Self {
            config: Rc::new(GateConfig {
                security,
                public: PublicPaths::default(),
                gateway_mode: false,
            }),
        }
    }

    pub fn with_public_paths(self, public: PublicPaths) -> Self {
        Self {
            config: Rc::new(GateConfig {
                security: self.config.security.clone(),
                public,
                gateway_mode: self.config.gateway_mode,
            }),
        }
    }

    pub fn gateway_mode(self, enabled: bool) -> Self {
        Self {
            config: Rc::new(GateConfig {
                security: self.config.security.clone(),
                public: self.config.public.clone(),
                gateway_mode: enabled,
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service,
            config: Rc::clone(&self.config),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    config: Rc<GateConfig>,
}

/// Identity headers are only trusted when this gate wrote them.
fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [USER_ID_HEADER, USER_EMAIL_HEADER, USER_ROLES_HEADER] {
        headers.remove(name);
    }
}

fn set_identity_headers(headers: &mut HeaderMap, identity: &Identity) {
    let values = [
        (USER_ID_HEADER, identity.subject.clone()),
        (USER_EMAIL_HEADER, identity.subject.clone()),
        (USER_ROLES_HEADER, identity.roles.join(",")),
    ];
    for (name, value) in values {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}

fn authenticate(req: &ServiceRequest, security: &SecurityConfig) -> Result<Identity, AppError> {
    let raw = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(AppError::missing_token)?;
    let token = raw
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(AppError::missing_token)?;

    verify_access_token(token, security)
        .map(Identity::from)
        .map_err(|reason| {
            debug!(%reason, path = %req.path(), "bearer token rejected");
            AppError::invalid_token()
        })
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        strip_identity_headers(req.headers_mut());

        let is_public =
            req.method() == Method::OPTIONS || self.config.public.is_public(req.path());

        if !is_public {
            match authenticate(&req, &self.config.security) {
                Ok(identity) => {
                    Span::current().record(
                        "subject",
                        tracing::field::display(Redacted(&identity.subject)),
                    );
                    if self.config.gateway_mode {
                        set_identity_headers(req.headers_mut(), &identity);
                    }
                    req.extensions_mut().insert(identity);
                }
                Err(err) => {
                    // Rendered inside the future so the trace id scope applies
                    return Box::pin(async move {
                        Ok(req.error_response(err).map_into_right_body())
                    });
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
