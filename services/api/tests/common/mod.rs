#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api_lib::adapters::MemoryStore;
use api_lib::config::{Config, Storage};
use api_lib::web::{build_router, state::AppState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use progress_core::ports::Clock;
use serde_json::Value;
use tower::ServiceExt;
use tracing::Level;
use uuid::Uuid;

/// A clock the tests move forward by whole days.
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.0.lock().unwrap();
        *now = *now + Duration::days(days as i64);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<TestClock>,
}

/// Build a test `Config` with safe defaults.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        storage: Storage::Memory,
        db_max_connections: 1,
        log_level: Level::INFO,
        leaderboard_size: 10,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

/// Build the full application router over a fresh in-memory store.
pub fn build_test_app() -> TestApp {
    let clock = Arc::new(TestClock::starting_at(
        Utc.with_ymd_and_hms(2024, 9, 2, 8, 15, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::new(test_config()),
        store.clone(),
        store,
        clock.clone(),
    );
    let router = build_router(Arc::new(state)).unwrap();
    TestApp { router, clock }
}

/// Identity headers as the upstream gateway would set them.
pub struct As {
    pub learner_id: Uuid,
    pub role: &'static str,
}

pub fn student(learner_id: Uuid) -> Option<As> {
    Some(As {
        learner_id,
        role: "STUDENT",
    })
}

pub fn teacher() -> Option<As> {
    Some(As {
        learner_id: Uuid::new_v4(),
        role: "TEACHER",
    })
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    who: Option<As>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(who) = who {
        builder = builder
            .header("x-learner-id", who.learner_id.to_string())
            .header("x-learner-role", who.role);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Registers a learner and returns their id.
pub async fn register(app: &TestApp, display_name: &str) -> Uuid {
    let learner_id = Uuid::new_v4();
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/learners",
        None,
        Some(serde_json::json!({ "learner_id": learner_id, "display_name": display_name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    learner_id
}

pub async fn award(app: &TestApp, learner_id: Uuid, xp: i64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/gamification/update-progress",
        student(learner_id),
        Some(serde_json::json!({ "xp_earned": xp })),
    )
    .await
}

pub async fn create_badge(app: &TestApp, requirement_type: &str, value: i64) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/badges",
        teacher(),
        Some(serde_json::json!({
            "name": format!("{} {}", requirement_type, value),
            "icon_url": "https://cdn.example.com/badge.png",
            "requirement_type": requirement_type,
            "requirement_value": value,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}
