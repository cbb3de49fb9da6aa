//! Shared fixtures: signing keys, a mock identity provider, token minting.

#![allow(dead_code)]

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokengate::{Authenticator, TenantConfig};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const SIGNING_CERT: &str = include_str!("../fixtures/signing_cert.pem");
pub const OTHER_KEY: &str = include_str!("../fixtures/other_key.pem");
pub const OTHER_CERT: &str = include_str!("../fixtures/other_cert.pem");

pub const AUDIENCE: &str = "api1";
pub const ISSUER: &str = "https://ex.example/";
pub const KID: &str = "K1";

pub const JWKS_PATH: &str = "/.well-known/jwks.json";
pub const USERINFO_PATH: &str = "/userinfo";

/// Base64 DER body of a PEM certificate, as published in `x5c`.
pub fn x5c(cert_pem: &str) -> String {
    cert_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

pub fn jwk(kid: &str, cert_pem: &str) -> Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "n": "unused",
        "e": "AQAB",
        "x5c": [x5c(cert_pem)]
    })
}

pub fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

pub fn claims(aud: &str, iss: &str) -> Value {
    json!({ "sub": "auth0|42", "aud": aud, "iss": iss, "exp": now() + 600 })
}

pub fn sign(private_pem: &str, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// A valid token for the default audience and issuer.
pub fn valid_token() -> String {
    sign(SIGNING_KEY, KID, &claims(AUDIENCE, ISSUER))
}

/// Tenant URL of the mock provider, with trailing slash.
pub fn tenant(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

pub fn tenant_config(server: &MockServer, profile_max_age: Duration) -> TenantConfig {
    TenantConfig::new(&tenant(server), AUDIENCE, profile_max_age)
        .unwrap()
        .with_issuer(ISSUER)
        .with_http_timeout(Duration::from_secs(5))
}

pub fn authenticator(server: &MockServer) -> Authenticator {
    Authenticator::new(tenant_config(server, Duration::from_secs(60))).unwrap()
}

/// Serve `keys` from the JWKS endpoint, expecting `calls` requests.
pub async fn mount_jwks(server: &MockServer, keys: Vec<Value>, calls: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Serve `profile` to requests bearing `token`, expecting `calls` requests.
pub async fn mount_userinfo(server: &MockServer, token: &str, profile: Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(USERINFO_PATH))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .expect(calls)
        .mount(server)
        .await;
}
