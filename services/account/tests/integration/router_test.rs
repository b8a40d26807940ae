use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};

use passage_account::domain::types::CodePurpose;
use passage_account::router::build_router;
use passage_account::state::AppState;

use crate::helpers::{Harness, TEST_EMAIL, TEST_PASSWORD, totp_code};

fn server(harness: &Harness) -> TestServer {
    TestServer::new(build_router(AppState::new(harness.service()))).unwrap()
}

#[tokio::test]
async fn should_report_health_and_readiness() {
    let server = server(&Harness::new());

    server.get("/healthz").await.assert_status_ok();

    let ready = server.get("/readyz").await;
    ready.assert_status_ok();
    ready.assert_json(&json!({ "database": "ok", "redis": "ok" }));
}

#[tokio::test]
async fn should_echo_request_id() {
    let server = server(&Harness::new());

    let response = server.get("/healthz").await;

    let id = response.header("x-request-id");
    assert!(id.to_str().unwrap().parse::<uuid::Uuid>().is_ok());
}

#[tokio::test]
async fn should_keep_incoming_request_id() {
    let server = server(&Harness::new());

    let response = server
        .get("/healthz")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "req-42");
}

#[tokio::test]
async fn should_register_verify_login_and_load_profile() {
    let harness = Harness::new();
    let server = server(&harness);

    let registered = server
        .post("/auth/register")
        .json(&json!({ "email": TEST_EMAIL, "name": "Ann", "password": TEST_PASSWORD }))
        .await;
    registered.assert_status(StatusCode::CREATED);
    assert_eq!(registered.json::<Value>()["status"], "pending");

    let code = harness
        .codes
        .code(CodePurpose::EmailVerification, TEST_EMAIL)
        .unwrap();
    let verified = server
        .post("/auth/otp/verify")
        .json(&json!({ "email": TEST_EMAIL, "code": code }))
        .await;
    verified.assert_status_ok();
    assert_eq!(verified.json::<Value>()["status"], "active");

    let login = server
        .post("/auth/login")
        .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
        .await;
    login.assert_status_ok();
    let body = login.json::<Value>();
    assert_eq!(body["two_factor_required"], false);
    assert_eq!(body["token_type"], "Bearer");
    let access = body["access_token"].as_str().unwrap().to_owned();
    let refresh = body["refresh_token"].as_str().unwrap().to_owned();

    let me = server.get("/auth/me").authorization_bearer(&access).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["email"], TEST_EMAIL);

    let refreshed = server
        .post("/auth/token/refresh")
        .json(&json!({ "refresh_token": refresh }))
        .await;
    refreshed.assert_status_ok();
    assert!(refreshed.json::<Value>()["access_token"].is_string());
}

#[tokio::test]
async fn should_return_json_error_for_bad_credentials() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    let server = server(&harness);

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": TEST_EMAIL, "password": "Wrong12!@" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({
        "kind": "INCORRECT_CREDENTIALS",
        "message": "incorrect email or password",
    }));
}

#[tokio::test]
async fn should_list_invalid_fields() {
    let server = server(&Harness::new());

    let response = server
        .post("/auth/register")
        .json(&json!({ "email": "bad", "name": "Ann", "password": "short" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["kind"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["email", "password"]);
}

#[tokio::test]
async fn should_require_bearer_token_for_profile() {
    let server = server(&Harness::new());

    let missing = server.get("/auth/me").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["kind"], "INVALID_TOKEN");

    let garbage = server.get("/auth/me").authorization_bearer("nope").await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_accept_silent_requests_without_revealing_accounts() {
    let server = server(&Harness::new());

    server
        .post("/auth/otp/resend")
        .json(&json!({ "email": "ghost@example.com" }))
        .await
        .assert_status(StatusCode::ACCEPTED);
    server
        .post("/auth/password/forgot")
        .json(&json!({ "email": "ghost@example.com" }))
        .await
        .assert_status(StatusCode::ACCEPTED);
}

#[tokio::test]
async fn should_reset_password_with_code() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    let server = server(&harness);

    server
        .post("/auth/password/forgot")
        .json(&json!({ "email": TEST_EMAIL }))
        .await
        .assert_status(StatusCode::ACCEPTED);
    let code = harness
        .codes
        .code(CodePurpose::PasswordReset, TEST_EMAIL)
        .unwrap();

    server
        .post("/auth/password/reset")
        .json(&json!({ "email": TEST_EMAIL, "code": code, "new_password": "Wxyz98#$" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .post("/auth/login")
        .json(&json!({ "email": TEST_EMAIL, "password": "Wxyz98#$" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn should_run_two_factor_lifecycle() {
    let harness = Harness::new();
    harness.seed_active_user(TEST_EMAIL);
    let server = server(&harness);
    let login = |server: &TestServer| {
        server
            .post("/auth/login")
            .json(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }))
    };

    let body = login(&server).await.json::<Value>();
    let access = body["access_token"].as_str().unwrap().to_owned();

    let setup = server.post("/auth/2fa/setup").authorization_bearer(&access).await;
    setup.assert_status_ok();
    let secret = setup.json::<Value>()["secret"].as_str().unwrap().to_owned();

    server
        .post("/auth/2fa/verify")
        .authorization_bearer(&access)
        .json(&json!({ "code": totp_code(&secret) }))
        .await
        .assert_status_ok();

    let gated = login(&server).await.json::<Value>();
    assert_eq!(gated["two_factor_required"], true);
    assert!(gated.get("access_token").is_none());
    let challenge = gated["challenge_token"].as_str().unwrap().to_owned();

    // The challenge only opens the verification endpoint.
    server
        .get("/auth/me")
        .authorization_bearer(&challenge)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/auth/2fa/disable")
        .authorization_bearer(&access)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .post("/auth/2fa/disable")
        .authorization_bearer(&access)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
