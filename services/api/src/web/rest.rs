//! services/api/src/web/rest.rs
//!
//! Shared REST response types, the health endpoint, and the master definition
//! for the OpenAPI specification.

use axum::{response::IntoResponse, Json};
use progress_core::domain::Badge;
use serde::Serialize;
use serde_json::json;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{badges, gamification, learners};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        gamification::update_progress_handler,
        gamification::progress_handler,
        gamification::leaderboard_handler,
        badges::list_badges_handler,
        badges::get_badge_handler,
        badges::create_badge_handler,
        badges::update_badge_handler,
        badges::delete_badge_handler,
        learners::register_learner_handler,
    ),
    components(
        schemas(
            BadgeResponse,
            gamification::UpdateProgressRequest,
            gamification::ProgressResponse,
            gamification::EarnedBadgeResponse,
            gamification::LeaderboardRow,
            badges::BadgeRequest,
            learners::RegisterLearnerRequest,
        )
    ),
    tags(
        (name = "Progress API", description = "XP, study streaks, badges and the leaderboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The envelope every successful response is wrapped in.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BadgeResponse {
    pub id: Uuid,
    pub name: String,
    pub icon_url: String,
    pub requirement_type: String,
    pub requirement_value: u64,
}

impl From<Badge> for BadgeResponse {
    fn from(badge: Badge) -> Self {
        Self {
            id: badge.id,
            name: badge.name,
            icon_url: badge.icon_url,
            requirement_type: badge.requirement_type.as_str().to_string(),
            requirement_value: badge.requirement_value,
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
