//! Common test utilities

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use data_clash::api::{self, AppState};
use data_clash::events::EventBus;
use data_clash::identity::StaticIdentity;
use data_clash::store::MemoryStore;

pub const API_KEY: &str = "test_key_123";

pub const ADMIN_PLAYER: i64 = 99;
pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;

/// Users known to the test identity oracle
pub struct TestUsers {
    pub admin: Uuid,
    pub alice: Uuid,
    pub bob: Uuid,
}

/// Router backed by an in-memory store, plus the users it knows about
pub fn setup_app() -> (Router, TestUsers) {
    let users = TestUsers {
        admin: Uuid::new_v4(),
        alice: Uuid::new_v4(),
        bob: Uuid::new_v4(),
    };

    let identity = StaticIdentity::new()
        .with_api_key(API_KEY)
        .with_administrator(users.admin)
        .with_player(users.admin, ADMIN_PLAYER)
        .with_player(users.alice, ALICE)
        .with_player(users.bob, BOB);

    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(identity),
        Arc::new(EventBus::default()),
    );

    (api::build_router(state), users)
}

/// Authenticated request as `user`, with an optional JSON body
pub fn request(method: &str, uri: &str, user: Uuid, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", API_KEY)
        .header("X-Request-User-Id", user.to_string());

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
