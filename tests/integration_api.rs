//! API Integration Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use uuid::Uuid;

use data_clash::aggregate::MAX_DURATION_SECS;

mod common;

use common::{body_json, request, send, setup_app, ALICE, API_KEY, BOB};

fn war_body() -> Value {
    json!({ "begin_day": "2024-03-01T12:00:00Z", "duration_secs": 86400 })
}

#[tokio::test]
async fn test_health_needs_no_api_key() {
    let (app, _) = setup_app();

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_rejections() {
    let (app, users) = setup_app();

    // No key at all
    let req = Request::builder()
        .uri("/api/v1/clans")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error_code"], "unauthorized");

    // Unknown key
    let req = Request::builder()
        .uri("/api/v1/clans")
        .header("X-API-Key", "wrong_key")
        .header("X-Request-User-Id", users.alice.to_string())
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error_code"], "invalid_api_key");

    // Valid key, malformed user id
    let req = Request::builder()
        .uri("/api/v1/clans")
        .header("X-API-Key", API_KEY)
        .header("X-Request-User-Id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let (app, users) = setup_app();
    let correlation_id = Uuid::new_v4();

    let mut req = request("GET", "/api/v1/clans", users.alice, None);
    req.headers_mut().insert(
        "x-correlation-id",
        correlation_id.to_string().parse().unwrap(),
    );
    let response = send(&app, req).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-correlation-id"].to_str().unwrap(),
        correlation_id.to_string()
    );
}

#[tokio::test]
async fn test_war_lifecycle_e2e() {
    let (app, users) = setup_app();

    // 1. Only administrators create wars
    let response = send(
        &app,
        request("POST", "/api/v1/wars", users.alice, Some(war_body())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error_code"], "forbidden_access");

    let response = send(
        &app,
        request("POST", "/api/v1/wars", users.admin, Some(war_body())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "War creation failed");
    let war_id = body_json(response).await.as_i64().unwrap();
    assert_eq!(war_id, 1);

    // 2. Alice signs herself up
    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/wars/player",
            users.alice,
            Some(json!({ "war_id": war_id, "player_id": ALICE })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // 3. Bob cannot remove Alice, but anyone can read the roster
    let response = send(
        &app,
        request(
            "DELETE",
            "/api/v1/wars/player",
            users.bob,
            Some(json!({ "war_id": war_id, "player_id": ALICE })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let req = request("GET", &format!("/api/v1/wars/{}/players", war_id), users.bob, None);
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    let players = body_json(response).await;
    assert_eq!(players.as_array().unwrap().len(), 1);
    assert_eq!(players[0]["player_id"], ALICE);
    assert_eq!(players[0]["won_trophies"], 0);

    // 4. Alice withdraws
    let response = send(
        &app,
        request(
            "DELETE",
            "/api/v1/wars/player",
            users.alice,
            Some(json!({ "war_id": war_id, "player_id": ALICE })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // 5. Update with a mismatched body id is rejected before anything runs
    let mut body = war_body();
    body["id"] = json!(war_id + 1);
    let req = request("PUT", &format!("/api/v1/wars/{}", war_id), users.admin, Some(body));
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "invalid_request");

    let mut body = json!({ "begin_day": "2024-04-01T00:00:00Z", "duration_secs": 3600 });
    body["id"] = json!(war_id);
    let req = request("PUT", &format!("/api/v1/wars/{}", war_id), users.admin, Some(body));
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // 6. Delete, then it is gone
    let req = request("DELETE", &format!("/api/v1/wars/{}", war_id), users.admin, None);
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let req = request("GET", &format!("/api/v1/wars/{}", war_id), users.admin, None);
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error_code"], "not_found");
}

#[tokio::test]
async fn test_clan_single_chief_over_http() {
    let (app, users) = setup_app();

    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/clans",
            users.alice,
            Some(json!({ "name": "Vikings", "type": "invite_only" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let clan_id = body_json(response).await.as_i64().unwrap();

    // Administrator appoints Alice as chief
    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/clans/player",
            users.admin,
            Some(json!({ "clan_id": clan_id, "player_id": ALICE, "role": "chief" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // A second chief is refused
    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/clans/player",
            users.alice,
            Some(json!({ "clan_id": clan_id, "player_id": BOB, "role": "chief" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error_code"],
        "application_constraint"
    );

    // Bob joins as a plain member
    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/clans/player",
            users.alice,
            Some(json!({ "clan_id": clan_id, "player_id": BOB })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let req = request("GET", &format!("/api/v1/clans/{}/players", clan_id), users.bob, None);
    let players = body_json(send(&app, req).await).await;
    let roles: Vec<&str> = players
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles.len(), 2);
    assert!(roles.contains(&"chief"));
    assert!(roles.contains(&"member"));

    let req = request("GET", &format!("/api/v1/clans/{}", clan_id), users.bob, None);
    let clan = body_json(send(&app, req).await).await;
    assert_eq!(clan["name"], "Vikings");
    assert_eq!(clan["type"], "invite_only");
}

#[tokio::test]
async fn test_clan_list_pagination() {
    let (app, users) = setup_app();

    for name in ["Alpha", "Bravo", "Charlie"] {
        let response = send(
            &app,
            request("POST", "/api/v1/clans", users.bob, Some(json!({ "name": name }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let req = request(
        "GET",
        "/api/v1/clans?page_number=2&page_size=2",
        users.bob,
        None,
    );
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["page_number"], 2);
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["has_previous_page"], true);
    assert_eq!(page["has_next_page"], false);

    // Defaults apply without query parameters
    let req = request("GET", "/api/v1/clans", users.bob, None);
    let page = body_json(send(&app, req).await).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
    assert_eq!(page["page_number"], 1);
}

#[tokio::test]
async fn test_invalid_fields_are_bad_request() {
    let (app, users) = setup_app();

    let response = send(
        &app,
        request(
            "POST",
            "/api/v1/wars",
            users.admin,
            Some(json!({ "begin_day": "2024-03-01T12:00:00Z", "duration_secs": 0 })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "validation_error");
}

#[tokio::test]
async fn test_duration_bounds_over_http() {
    let (app, users) = setup_app();

    for uri in ["/api/v1/wars", "/api/v1/challenges"] {
        let body = json!({ "begin_day": "2024-03-01T12:00:00Z", "duration_secs": MAX_DURATION_SECS });
        let response = send(&app, request("POST", uri, users.admin, Some(body))).await;
        assert_eq!(response.status(), StatusCode::CREATED, "{} at the bound", uri);

        for duration in [MAX_DURATION_SECS + 1, 10_000_000_000_000_i64] {
            let body = json!({ "begin_day": "2024-03-01T12:00:00Z", "duration_secs": duration });
            let response = send(&app, request("POST", uri, users.admin, Some(body))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} past the bound", uri);
            assert_eq!(body_json(response).await["error_code"], "validation_error");
        }
    }

    // Listings still render after the largest accepted window
    let req = request("GET", "/api/v1/wars", users.bob, None);
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["items"][0]["end_day"], "2025-03-02T12:00:00Z");

    let req = request("GET", "/api/v1/challenges", users.bob, None);
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total_count"], 1);
}
