//! Integration tests for the tokengate HTTP surface.
//!
//! The identity provider is a wiremock server; tokens are signed with the
//! keys in tests/fixtures/.

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use common::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tokengate::handlers::{AppState, create_router};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn create_test_server(provider: &MockServer) -> TestServer {
    let state = AppState {
        auth: Arc::new(authenticator(provider)),
    };

    TestServer::new(create_router(state)).unwrap()
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

#[tokio::test]
async fn test_service_info_is_public() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![], 0).await;
    let server = create_test_server(&provider);

    let response = server.get("/service-info").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["name"], "tokengate");
    assert_eq!(body["authentication"]["audience"], AUDIENCE);
    assert_eq!(body["authentication"]["issuer"], ISSUER);
    assert_eq!(body["authentication"]["algorithm"], "RS256");
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 1).await;
    let server = create_test_server(&provider);

    let (name, value) = bearer(&valid_token());
    let response = server.get("/token").add_header(name, value).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["kid"], KID);
    assert_eq!(body["sub"], "auth0|42");
    assert_eq!(body["iss"], ISSUER);
    assert_eq!(body["aud"], json!([AUDIENCE]));
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 0).await;
    let server = create_test_server(&provider);

    let response = server.get("/token").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");

    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_audience_rejected_without_key_set_request() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 0).await;
    let server = create_test_server(&provider);

    let token = sign(SIGNING_KEY, KID, &claims("other", ISSUER));
    let (name, value) = bearer(&token);
    let response = server.get("/token").add_header(name, value).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 1).await;
    let server = create_test_server(&provider);

    let token = sign(OTHER_KEY, KID, &claims(AUDIENCE, ISSUER));
    let (name, value) = bearer(&token);
    let response = server.get("/me").add_header(name, value).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_key_set_outage_rejects_and_keeps_serving() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded at db-7"))
        .up_to_n_times(1)
        .mount(&provider)
        .await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 1).await;
    let server = create_test_server(&provider);
    let token = valid_token();

    let (name, value) = bearer(&token);
    let response = server.get("/token").add_header(name, value).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(!response.text().contains("db-7"));

    let (name, value) = bearer(&token);
    let response = server.get("/token").add_header(name, value).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_me_returns_cached_profile() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 2).await;

    let token = valid_token();
    mount_userinfo(
        &provider,
        &token,
        json!({ "sub": "auth0|42", "name": "Ada", "nickname": "ada" }),
        1,
    )
    .await;
    let server = create_test_server(&provider);

    for _ in 0..2 {
        let (name, value) = bearer(&token);
        let response = server.get("/me").add_header(name, value).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["sub"], "auth0|42");
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["profile"]["nickname"], "ada");
    }
}

#[tokio::test]
async fn test_me_profile_failure_is_bad_gateway() {
    let provider = MockServer::start().await;
    mount_jwks(&provider, vec![jwk(KID, SIGNING_CERT)], 1).await;
    Mock::given(method("GET"))
        .and(path(USERINFO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&provider)
        .await;
    let server = create_test_server(&provider);

    let (name, value) = bearer(&valid_token());
    let response = server.get("/me").add_header(name, value).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(!response.text().contains("not json"));
}
