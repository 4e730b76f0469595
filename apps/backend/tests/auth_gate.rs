mod common;
mod support;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use actix_web::http::header::{self, HeaderName};
use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, HttpRequest, HttpResponse};
use backend::auth::jwt::mint_access_token;
use backend::middleware::auth_gate::{
    PathRule, USER_EMAIL_HEADER, USER_ID_HEADER, USER_ROLES_HEADER,
};
use backend::middleware::PublicPaths;
use backend::state::security_config::SecurityConfig;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::json_ok;
use serde_json::json;
use support::auth::bearer_for;
use support::{build_test_state, create_test_app, FakeSource};

/// Echoes the identity headers a handler would see.
async fn echo_identity_headers(req: HttpRequest) -> HttpResponse {
    let get = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    HttpResponse::Ok().json(json!({
        "userId": get(USER_ID_HEADER),
        "userEmail": get(USER_EMAIL_HEADER),
        "userRoles": get(USER_ROLES_HEADER),
    }))
}

fn probe_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/probe/identity", web::get().to(echo_identity_headers))
        .route("/api/public/identity", web::get().to(echo_identity_headers));
}

#[actix_web::test]
async fn public_routes_need_no_token() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    for uri in ["/actuator/health", "/actuator/info"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri} should be public");
    }
    Ok(())
}

#[actix_web::test]
async fn protected_routes_reject_missing_or_malformed_headers(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    for uri in ["/api/crypto/list", "/api/cache/info", "/api/auth/me", "/api/not-a-route"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert_problem_details_from_service_response(
            resp,
            "UNAUTHORIZED",
            StatusCode::UNAUTHORIZED,
            None,
        )
        .await;
    }

    for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer    ", "bearer abc"] {
        let req = test::TestRequest::get()
            .uri("/api/crypto/list")
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header {value:?}");
    }
    Ok(())
}

#[actix_web::test]
async fn forged_expired_and_foreign_tokens_are_rejected() -> Result<(), Box<dyn std::error::Error>>
{
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let security = state.security.clone();
    let app = create_test_app(state).build().await?;

    // Payload swapped for another subject; signature no longer matches
    let genuine = mint_access_token("user@test.com", SystemTime::now(), &security)?;
    let parts: Vec<_> = genuine.split('.').collect();
    let forged_payload = URL_SAFE_NO_PAD.encode(
        json!({"sub": "admin@test.com", "iat": 0, "exp": 4_102_444_800u64}).to_string(),
    );
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    // Issued 25 hours ago with the default 24 hour lifetime
    let expired = mint_access_token(
        "user@test.com",
        SystemTime::now() - Duration::from_secs(25 * 60 * 60),
        &security,
    )?;

    let other = SecurityConfig::try_new("some-other-service-secret-entirely")?;
    let foreign = mint_access_token("user@test.com", SystemTime::now(), &other)?;

    for (label, token) in [
        ("forged", forged),
        ("expired", expired),
        ("foreign", foreign),
        ("garbage", "not.a.jwt".to_string()),
    ] {
        let req = test::TestRequest::get()
            .uri("/api/crypto/stats")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{label} token");
    }

    let req = test::TestRequest::get()
        .uri("/api/crypto/stats")
        .insert_header((header::AUTHORIZATION, format!("Bearer {genuine}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn gateway_mode_forwards_identity_headers() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let bearer = bearer_for("juan@test.com", &state.security);
    let app = create_test_app(state)
        .with_gateway_mode()
        .with_routes(probe_routes)
        .build()
        .await?;

    let req = test::TestRequest::get()
        .uri("/api/probe/identity")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert_eq!(body["userId"], "juan@test.com");
    assert_eq!(body["userEmail"], "juan@test.com");
    assert_eq!(body["userRoles"], "ROLE_USER");
    Ok(())
}

#[actix_web::test]
async fn client_supplied_identity_headers_are_dropped() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let bearer = bearer_for("juan@test.com", &state.security);
    let app = create_test_app(state).with_routes(probe_routes).build().await?;

    let spoof = |req: test::TestRequest| {
        req.insert_header((HeaderName::from_static(USER_ID_HEADER), "admin"))
            .insert_header((HeaderName::from_static(USER_ROLES_HEADER), "ROLE_ADMIN"))
    };

    // Authenticated, gateway mode off: nothing re-emitted, spoof removed
    let req = spoof(test::TestRequest::get().uri("/api/probe/identity"))
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert!(body["userId"].is_null());
    assert!(body["userRoles"].is_null());

    // Public path: still removed
    let req = spoof(test::TestRequest::get().uri("/api/public/identity")).to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert!(body["userId"].is_null());
    Ok(())
}

#[actix_web::test]
async fn preflight_requests_skip_authentication() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/crypto/list")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_ne!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[actix_web::test]
async fn allow_list_is_configurable() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state)
        .with_public_paths(PublicPaths::none().with_rule(PathRule::Exact("/api/crypto/stats")))
        .build()
        .await?;

    let req = test::TestRequest::get().uri("/api/crypto/stats").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Health is no longer on the list
    let req = test::TestRequest::get().uri("/actuator/health").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    Ok(())
}
