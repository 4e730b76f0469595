mod common;
mod support;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use backend::sync::SyncOutcome;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use common::json_ok;
use support::auth::bearer_for;
use support::fake_source::three_page_source;
use support::{build_test_state, create_test_app, FakeSource};

const USER: &str = "tester@test.com";

#[actix_web::test]
async fn sync_then_browse_the_catalogue() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(three_page_source())).await?;
    let bearer = bearer_for(USER, &state.security);
    let app = create_test_app(state).build().await?;
    let get = |uri: &str| {
        test::TestRequest::get()
            .uri(uri)
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request()
    };

    let req = test::TestRequest::post()
        .uri("/api/crypto/sync")
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["synced"], 6);
    assert_eq!(body["fetched"], 6);
    assert_eq!(body["failedPages"], 0);

    // Default ordering is by rank
    let body = json_ok(test::call_service(&app, get("/api/crypto/list?size=2")).await).await;
    assert_eq!(body["totalElements"], 6);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["content"].as_array().unwrap().len(), 2);
    assert_eq!(body["content"][0]["coinId"], "bitcoin");

    let body = json_ok(
        test::call_service(&app, get("/api/crypto/list?sortBy=currentPrice&dir=desc")).await,
    )
    .await;
    assert_eq!(body["content"][0]["coinId"], "bitcoin");
    assert_eq!(body["content"][5]["coinId"], "dogecoin");

    let body = json_ok(test::call_service(&app, get("/api/crypto/list?query=SOL")).await).await;
    assert_eq!(body["totalElements"], 1);
    assert_eq!(body["content"][0]["symbol"], "sol");

    let body = json_ok(test::call_service(&app, get("/api/crypto/ethereum")).await).await;
    assert_eq!(body["name"], "Ethereum");
    assert_eq!(body["marketCapRank"], 2);

    let body = json_ok(test::call_service(&app, get("/api/crypto/stats")).await).await;
    assert_eq!(body["total"], 6);
    assert_eq!(body["hasSyncedData"], true);
    assert!(body["lastUpdated"].is_string());

    Ok(())
}

#[actix_web::test]
async fn bad_listing_parameters_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let bearer = bearer_for(USER, &state.security);
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::get()
        .uri("/api/crypto/list?sortBy=passwordHash")
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_SORT_FIELD",
        StatusCode::BAD_REQUEST,
        Some("passwordHash"),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/crypto/list?page=first")
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/crypto/list?page=1000000000000000000")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "BAD_REQUEST",
        StatusCode::BAD_REQUEST,
        Some("1000000000000000000"),
    )
    .await;

    Ok(())
}

#[actix_web::test]
async fn unknown_coin_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(FakeSource::new())).await?;
    let bearer = bearer_for(USER, &state.security);
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::get()
        .uri("/api/crypto/not-a-coin")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "CRYPTO_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("not-a-coin"),
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn sync_with_no_reachable_page_is_a_bad_gateway() -> Result<(), Box<dyn std::error::Error>> {
    let source = FakeSource::new()
        .failing_page(1)
        .failing_page(2)
        .failing_page(3);
    let state = build_test_state(Arc::new(source)).await?;
    let bearer = bearer_for(USER, &state.security);
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::post()
        .uri("/api/crypto/sync")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "EXTERNAL_SERVICE_ERROR",
        StatusCode::BAD_GATEWAY,
        Some("upstream server error"),
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn manual_sync_during_a_run_is_a_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let source = three_page_source().with_latency(Duration::from_millis(30));
    let state = build_test_state(Arc::new(source)).await?;
    let bearer = bearer_for(USER, &state.security);
    let worker = state.sync.clone().expect("state has a sync worker");
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::post()
        .uri("/api/crypto/sync")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let (background, resp) = tokio::join!(worker.run_once(), test::call_service(&app, req));

    assert!(matches!(background?, SyncOutcome::Completed(_)));
    assert_problem_details_from_service_response(
        resp,
        "SYNC_IN_PROGRESS",
        StatusCode::CONFLICT,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn scheduler_status_reports_schedule_and_store() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state(Arc::new(three_page_source())).await?;
    let bearer = bearer_for(USER, &state.security);
    state.require_sync()?.run_once().await?;
    let app = create_test_app(state).build().await?;

    let req = test::TestRequest::get()
        .uri("/api/crypto/scheduler/status")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let body = json_ok(test::call_service(&app, req).await).await;

    assert_eq!(body["enabled"], false);
    assert_eq!(body["running"], false);
    assert_eq!(body["totalCryptos"], 6);
    assert_eq!(body["cronExpression"], "0 0 */6 * * *");
    assert!(body["nextSync"].is_string());
    let minutes = body["minutesUntilNext"].as_i64().unwrap();
    assert!((0..=360).contains(&minutes));
    let description = body["nextSyncDescription"].as_str().unwrap();
    assert!(description.ends_with("UTC (today)") || description.ends_with("UTC (tomorrow)"));
    Ok(())
}
