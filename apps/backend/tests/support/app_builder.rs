use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use backend::middleware::{AuthGate, PublicPaths, RequestTrace, StructuredLogger, TraceSpan};
use backend::routes;
use backend::state::app_state::AppState;
use backend::AppError;

/// Type alias for route configuration functions
type RouteConfigFn = Box<dyn Fn(&mut web::ServiceConfig) + Send + Sync>;

/// Builder for test Actix services wired like `main.rs`: the auth gate and
/// the tracing middleware around every production route.
pub struct TestAppBuilder {
    state: AppState,
    gateway_mode: bool,
    public_paths: PublicPaths,
    extra_routes: Option<RouteConfigFn>,
}

impl TestAppBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            gateway_mode: false,
            public_paths: PublicPaths::default(),
            extra_routes: None,
        }
    }

    pub fn with_gateway_mode(mut self) -> Self {
        self.gateway_mode = true;
        self
    }

    pub fn with_public_paths(mut self, public_paths: PublicPaths) -> Self {
        self.public_paths = public_paths;
        self
    }

    /// Extra routes registered next to the production ones
    pub fn with_routes<F>(mut self, config_fn: F) -> Self
    where
        F: Fn(&mut web::ServiceConfig) + Send + Sync + 'static,
    {
        self.extra_routes = Some(Box::new(config_fn) as RouteConfigFn);
        self
    }

    pub async fn build(
        self,
    ) -> Result<
        impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
        AppError,
    > {
        let gate = AuthGate::new(self.state.security.clone())
            .with_public_paths(self.public_paths)
            .gateway_mode(self.gateway_mode);
        let extra_routes = self.extra_routes;

        // Wrap AppState with web::Data at the boundary
        let data = web::Data::new(self.state);

        let service = test::init_service(
            App::new()
                .wrap(gate)
                .wrap(StructuredLogger)
                .wrap(TraceSpan)
                .wrap(RequestTrace)
                .app_data(data)
                .configure(routes::configure)
                .configure(move |cfg| {
                    if let Some(config_fn) = &extra_routes {
                        config_fn(cfg);
                    }
                }),
        )
        .await;

        Ok(service)
    }
}

pub fn create_test_app(state: AppState) -> TestAppBuilder {
    TestAppBuilder::new(state)
}
