//! Integration tests for badge catalog management.

mod common;

use axum::http::{Method, StatusCode};
use common::{build_test_app, create_badge, send, student, teacher, As};
use serde_json::json;
use uuid::Uuid;

fn badge_body(requirement_type: &str, value: i64, icon_url: &str) -> serde_json::Value {
    json!({
        "name": "Marathon",
        "icon_url": icon_url,
        "requirement_type": requirement_type,
        "requirement_value": value,
    })
}

#[tokio::test]
async fn students_cannot_manage_badges() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/badges",
        student(Uuid::new_v4()),
        Some(badge_body("XP_REACHED", 10, "https://cdn.example.com/m.png")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/badges",
        None,
        Some(badge_body("XP_REACHED", 10, "https://cdn.example.com/m.png")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_lifecycle() {
    let app = build_test_app();
    let first = create_badge(&app, "XP_REACHED", 500).await;
    let second = create_badge(&app, "STREAK_REACHED", 7).await;
    let id = first["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/v1/badges", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([first.clone(), second]));

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/badges/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], first);

    let admin = Some(As {
        learner_id: Uuid::new_v4(),
        role: "ADMIN",
    });
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/badges/{id}"),
        admin,
        Some(badge_body("XP_REACHED", 1000, "https://cdn.example.com/m.png")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], first["id"]);
    assert_eq!(body["data"]["requirement_value"], 1000);
    assert_eq!(body["data"]["name"], "Marathon");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/badges/{id}"),
        teacher(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/badges/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/badges/{id}"),
        teacher(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_badge_definitions_are_rejected() {
    let app = build_test_app();
    let cases = [
        badge_body("XP_REACHED", -5, "https://cdn.example.com/m.png"),
        badge_body("FASTEST_FINGER", 5, "https://cdn.example.com/m.png"),
        badge_body("XP_REACHED", 5, "not a url"),
        badge_body("XP_REACHED", 5, "https://%zz%"),
        badge_body("XP_REACHED", 5, "http://<script>"),
        badge_body("XP_REACHED", 5, "https:///"),
        json!({ "name": "  ", "icon_url": "https://x.io/a.png", "requirement_type": "XP_REACHED", "requirement_value": 1 }),
        json!({ "name": "No value", "icon_url": "https://x.io/a.png", "requirement_type": "XP_REACHED" }),
    ];
    for payload in cases {
        let (status, body) =
            send(&app, Method::POST, "/api/v1/badges", teacher(), Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload} -> {body}");
    }

    let (_, body) = send(&app, Method::GET, "/api/v1/badges", None, None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn updating_a_missing_badge_is_not_found() {
    let app = build_test_app();
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/badges/{}", Uuid::new_v4()),
        teacher(),
        Some(badge_body("XP_REACHED", 1, "https://cdn.example.com/m.png")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_badge_ids_get_the_error_envelope() {
    let app = build_test_app();
    let (status, body) = send(&app, Method::GET, "/api/v1/badges/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    for method in [Method::PUT, Method::DELETE] {
        let payload = (method == Method::PUT)
            .then(|| badge_body("XP_REACHED", 1, "https://cdn.example.com/m.png"));
        let (status, body) =
            send(&app, method, "/api/v1/badges/not-a-uuid", teacher(), payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = build_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/gamification/update-progress"].is_object());
}
