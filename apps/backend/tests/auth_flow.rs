mod common;
mod support;

use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_email;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::{json_ok, without_trace_id};
use serde_json::{json, Value};
use support::{build_test_state, create_test_app, FakeSource};

fn juan() -> Value {
    json!({
        "firstName": "Juan",
        "lastName": "Perez",
        "email": "juan@test.com",
        "password": "password123"
    })
}

#[actix_web::test]
async fn register_login_and_duplicate_email() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    // First registration succeeds and never echoes the password
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(juan())
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["firstName"], "Juan");
    assert_eq!(body["lastName"], "Perez");
    assert_eq!(body["email"], "juan@test.com");
    let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    assert!(
        keys.iter().all(|k| !k.to_lowercase().contains("password")),
        "public identity leaked a password field: {keys:?}"
    );

    // Same email again is a conflict naming the email
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(juan())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "EMAIL_ALREADY_REGISTERED",
        StatusCode::CONFLICT,
        Some("juan@test.com"),
    )
    .await;

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "juan@test.com", "password": "wrongpass"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let problem = assert_problem_details_from_service_response(
        resp,
        "INVALID_CREDENTIALS",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;
    assert_eq!(problem.detail, "Credenciales inválidas");

    // Correct password yields a three-segment token for the email
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "juan@test.com", "password": "password123"}))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    let token = body["token"].as_str().expect("token should be a string");
    let segments: Vec<_> = token.split('.').collect();
    assert_eq!(segments.len(), 3);

    let payload = URL_SAFE_NO_PAD.decode(segments[1])?;
    let claims: Value = serde_json::from_slice(&payload)?;
    assert_eq!(claims["sub"], "juan@test.com");
    let iat = claims["iat"].as_i64().unwrap();
    let exp = claims["exp"].as_i64().unwrap();
    assert_eq!(exp - iat, 24 * 60 * 60);

    Ok(())
}

#[actix_web::test]
async fn unknown_email_and_wrong_password_look_identical() -> Result<(), Box<dyn std::error::Error>>
{
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    let email = unique_email("login");
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "firstName": "Ana",
            "lastName": "Gomez",
            "email": email,
            "password": "correct-horse"
        }))
        .to_request();
    json_ok(test::call_service(&app, req).await).await;

    let mut bodies = Vec::new();
    for (email, password) in [
        (email.as_str(), "not-the-password"),
        ("nobody@example.test", "correct-horse"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        bodies.push(without_trace_id(body));
    }

    assert_eq!(bodies[0], bodies[1]);
    Ok(())
}

#[actix_web::test]
async fn registration_reports_each_invalid_field() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "firstName": "  ",
            "lastName": "Perez",
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let problem = assert_problem_details_from_service_response(
        resp,
        "VALIDATION_ERROR",
        StatusCode::BAD_REQUEST,
        None,
    )
    .await;

    let fields: Vec<_> = problem
        .field_errors
        .iter()
        .map(|e| e.field.as_str())
        .collect();
    assert_eq!(fields, ["firstName", "email", "password"]);
    let email_error = &problem.field_errors[1];
    assert_eq!(email_error.rejected_value, Some(json!("not-an-email")));

    Ok(())
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "BAD_REQUEST", StatusCode::BAD_REQUEST, None)
        .await;

    Ok(())
}

#[actix_web::test]
async fn me_returns_the_token_subject() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let app = create_test_app(state).build().await?;

    let email = unique_email("me");
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "firstName": "Luis",
            "lastName": "Diaz",
            "email": email,
            "password": "password123"
        }))
        .to_request();
    json_ok(test::call_service(&app, req).await).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": email, "password": "password123"}))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["firstName"], "Luis");

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "UNAUTHORIZED", StatusCode::UNAUTHORIZED, None)
        .await;

    Ok(())
}

#[actix_web::test]
async fn valid_token_for_missing_user_is_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let bearer = support::auth::bearer_for("ghost@example.test", &state.security);
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "UNAUTHORIZED", StatusCode::UNAUTHORIZED, None)
        .await;

    Ok(())
}
