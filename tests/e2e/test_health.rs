use crate::e2e::helpers;

use axum::http::StatusCode;
use helpers::TestContext;

#[tokio::test]
async fn it_should_return_ok_for_health_check() {
    let ctx = TestContext::new();

    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(String::from_utf8(response.body_bytes.clone()).unwrap(), "OK");
}

#[tokio::test]
async fn it_should_report_the_cache_backend_when_ready() {
    let ctx = TestContext::new();

    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["cache"], "memory");
    assert_eq!(body["database"], "not_configured");
    assert_eq!(body["tts"], "available");
}

#[tokio::test]
async fn it_should_include_request_id_in_responses() {
    let ctx = TestContext::new();

    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/api/voices").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn it_should_echo_a_caller_supplied_request_id() {
    let ctx = TestContext::new();

    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "trace-abc-123")])
        .await
        .unwrap();

    assert_eq!(response.header("x-request-id"), Some("trace-abc-123"));
}
