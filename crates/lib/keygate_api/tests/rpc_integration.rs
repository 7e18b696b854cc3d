//! Integration tests: build the router over an in-memory store and a stub
//! identity oracle, then drive it with Connect-style JSON calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use keygate_api::config::ApiConfig;
use keygate_api::{AppState, routes};
use keygate_core::auth::AuthError;
use keygate_core::auth::identity::{ClaimMap, IdentityOracle};
use keygate_core::store::MemoryCredentialStore;
use serde_json::{Value, json};
use tower::ServiceExt;

const CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

/// Accepts a fixed set of raw tokens, each mapped to its claim set.
#[derive(Default)]
struct StubOracle {
    tokens: HashMap<String, ClaimMap>,
}

impl StubOracle {
    fn with(mut self, raw: &str, sub: &str, name: &str, verified: bool) -> Self {
        let claims = json!({
            "iss": "https://accounts.google.com",
            "aud": CLIENT_ID,
            "sub": sub,
            "email": format!("{sub}@example.com"),
            "name": name,
            "email_verified": verified,
        });
        if let Value::Object(map) = claims {
            self.tokens.insert(raw.to_string(), map);
        }
        self
    }
}

#[async_trait]
impl IdentityOracle for StubOracle {
    async fn verify(&self, raw_token: &str, _audience: &str) -> Result<ClaimMap, AuthError> {
        self.tokens
            .get(raw_token)
            .cloned()
            .ok_or_else(|| AuthError::IdentityTokenInvalid("signature check failed".into()))
    }
}

fn oracle() -> StubOracle {
    StubOracle::default()
        .with("alice-token", "alice", "Alice", true)
        .with("alice-renamed-token", "alice", "Alice Liddell", true)
        .with("bob-token", "bob", "Bob", true)
        .with("unverified-token", "eve", "Eve", false)
}

fn app() -> (Router, AppState) {
    let config = ApiConfig::new("127.0.0.1:0", CLIENT_ID, None, None).expect("config");
    let state = AppState::new(
        config,
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(oracle()),
    );
    (keygate_api::router(state.clone()), state)
}

async fn call(app: &Router, method: &str, auth: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method("POST")
        .uri(method)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

async fn login(app: &Router, raw: &str) -> (String, Value) {
    let (status, body) = call(app, routes::AUTH_LOGIN, None, json!({"googleIdToken": raw})).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let jwt = body["jwt"].as_str().expect("jwt").to_string();
    (format!("Bearer {jwt}"), body["user"].clone())
}

#[tokio::test]
async fn say_hello_is_public() {
    let (app, _) = app();
    let (status, body) = call(&app, routes::GREETER_SAY_HELLO, None, json!({"name": "Ada"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello, Ada!");
}

#[tokio::test]
async fn login_creates_user_and_session_resolves_it() {
    let (app, _) = app();
    let (auth, user) = login(&app, "alice-token").await;
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["googleId"], "alice");
    assert_eq!(user["name"], "Alice");

    let (status, body) = call(&app, routes::AUTH_GET_CURRENT_USER, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], user);
}

#[tokio::test]
async fn repeat_login_refreshes_display_name() {
    let (app, _) = app();
    let (_, first) = login(&app, "alice-token").await;
    let (_, second) = login(&app, "alice-renamed-token").await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["name"], "Alice Liddell");
}

#[tokio::test]
async fn concurrent_first_logins_resolve_to_one_user() {
    let (app, _) = app();
    let (a, b) = tokio::join!(login(&app, "bob-token"), login(&app, "bob-token"));
    assert_eq!(a.1["id"], b.1["id"]);
}

#[tokio::test]
async fn unverified_email_is_permission_denied() {
    let (app, _) = app();
    let (status, body) = call(
        &app,
        routes::AUTH_LOGIN,
        None,
        json!({"googleIdToken": "unverified-token"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");
}

#[tokio::test]
async fn bad_identity_token_is_unauthenticated() {
    let (app, _) = app();
    for raw in ["forged-token", ""] {
        let (status, body) =
            call(&app, routes::AUTH_LOGIN, None, json!({"googleIdToken": raw})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthenticated");
    }
}

#[tokio::test]
async fn protected_method_requires_header() {
    let (app, _) = app();
    let (status, body) = call(&app, routes::API_KEY_LIST, None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
    assert_eq!(body["message"], "missing token");
}

#[tokio::test]
async fn protected_method_rejects_non_bearer_scheme() {
    let (app, _) = app();
    let (status, body) = call(&app, routes::API_KEY_LIST, Some("Basic xyz"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let (app, state) = app();
    let (_, user) = login(&app, "alice-token").await;
    let token = state
        .sessions
        .issue_with_ttl(
            user["id"].as_i64().unwrap(),
            "alice@example.com",
            Duration::seconds(-1),
        )
        .unwrap();
    let (status, _) = call(
        &app,
        routes::AUTH_GET_CURRENT_USER,
        Some(&format!("Bearer {token}")),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_for_deleted_or_unknown_user_is_not_found() {
    let (app, state) = app();
    let token = state.sessions.issue(4242, "ghost@example.com").unwrap();
    let (status, body) = call(
        &app,
        routes::AUTH_GET_CURRENT_USER,
        Some(&format!("Bearer {token}")),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn logout_succeeds_for_authenticated_caller() {
    let (app, _) = app();
    let (auth, _) = login(&app, "alice-token").await;
    let (status, body) = call(&app, routes::AUTH_LOGOUT, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = call(&app, routes::AUTH_LOGOUT, None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_key_lifecycle() {
    let (app, _) = app();
    let (auth, _) = login(&app, "alice-token").await;

    let (status, created) =
        call(&app, routes::API_KEY_CREATE, Some(&auth), json!({"name": "ci"})).await;
    assert_eq!(status, StatusCode::OK);
    let key = created["key"].as_str().unwrap().to_string();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(key.starts_with("gsk_"));
    assert_eq!(created["name"], "ci");

    let (status, listed) = call(&app, routes::API_KEY_LIST, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let keys = listed["apiKeys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["id"], id.as_str());
    assert_eq!(
        keys[0]["keyMasked"],
        format!("gsk_****...****{}", &key[key.len() - 4..])
    );
    assert!(!listed.to_string().contains(&key));

    let (status, updated) = call(
        &app,
        routes::API_KEY_UPDATE,
        Some(&auth),
        json!({"id": id, "name": "deploy"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["apiKey"]["name"], "deploy");
    assert_eq!(updated["apiKey"]["keyMasked"], keys[0]["keyMasked"]);

    let (status, deleted) =
        call(&app, routes::API_KEY_DELETE, Some(&auth), json!({"id": id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (_, listed) = call(&app, routes::API_KEY_LIST, Some(&auth), json!({})).await;
    assert!(listed["apiKeys"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_api_key_requires_name() {
    let (app, _) = app();
    let (auth, _) = login(&app, "alice-token").await;
    let (status, body) = call(&app, routes::API_KEY_CREATE, Some(&auth), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}

#[tokio::test]
async fn other_users_key_is_not_found() {
    let (app, _) = app();
    let (alice, _) = login(&app, "alice-token").await;
    let (bob, _) = login(&app, "bob-token").await;

    let (_, created) =
        call(&app, routes::API_KEY_CREATE, Some(&alice), json!({"name": "ci"})).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = call(&app, routes::API_KEY_DELETE, Some(&bob), json!({"id": id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = call(
        &app,
        routes::API_KEY_UPDATE,
        Some(&bob),
        json!({"id": id, "name": "mine"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = call(&app, routes::API_KEY_LIST, Some(&alice), json!({})).await;
    assert_eq!(listed["apiKeys"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn api_key_is_not_a_session_credential() {
    let (app, _) = app();
    let (auth, _) = login(&app, "alice-token").await;
    let (_, created) = call(&app, routes::API_KEY_CREATE, Some(&auth), json!({"name": "ci"})).await;
    let key = created["key"].as_str().unwrap();

    let (status, body) = call(
        &app,
        routes::API_KEY_LIST,
        Some(&format!("Bearer {key}")),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

async fn call_raw(
    app: &Router,
    method: &str,
    auth: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri(method);
    if let Some(content_type) = content_type {
        req = req.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("parse JSON"))
}

#[tokio::test]
async fn malformed_bodies_are_invalid_argument() {
    let (app, _) = app();
    let (auth, _) = login(&app, "alice-token").await;

    for (content_type, body) in [
        (Some("application/json"), r#"{"name": 5}"#),
        (Some("application/json"), "not json"),
        (None, r#"{"name": "ci"}"#),
    ] {
        let (status, resp) =
            call_raw(&app, routes::API_KEY_CREATE, Some(&auth), content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}: {resp}");
        assert_eq!(resp["code"], "invalid_argument");
        assert!(resp["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn malformed_login_body_is_invalid_argument() {
    let (app, _) = app();
    let (status, resp) = call_raw(&app, routes::AUTH_LOGIN, None, None, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["code"], "invalid_argument");
}

#[tokio::test]
async fn unknown_method_is_not_found_without_token() {
    let (app, _) = app();
    let (status, body) = call(&app, "/api.v1.Nope/X", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}
