//! services/api/src/web/gamification.rs
//!
//! Handlers for XP awards, the learner's own progress, and the public leaderboard.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use progress_core::domain::{Badge, EarnedBadge, LeaderboardEntry, LearnerProgress};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::config::MAX_LEADERBOARD_SIZE;
use crate::error::{ApiError, ApiResult};
use crate::web::middleware::Identity;
use crate::web::rest::{ApiResponse, BadgeResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    /// XP to add. Must be a non-negative integer.
    pub xp_earned: i64,
}

#[derive(Serialize, ToSchema)]
pub struct EarnedBadgeResponse {
    pub badge_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
}

impl From<EarnedBadge> for EarnedBadgeResponse {
    fn from(eb: EarnedBadge) -> Self {
        Self {
            badge_id: eb.badge_id,
            unlocked_at: eb.unlocked_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub learner_id: Uuid,
    pub total_xp: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
    pub earned_badges: Vec<EarnedBadgeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_unlocked_badges: Option<Vec<BadgeResponse>>,
}

impl ProgressResponse {
    pub fn new(progress: LearnerProgress, newly_unlocked: Option<Vec<Badge>>) -> Self {
        Self {
            learner_id: progress.learner_id,
            total_xp: progress.total_xp,
            current_streak: progress.current_streak,
            longest_streak: progress.longest_streak,
            last_study_date: progress.last_study_date,
            earned_badges: progress.earned_badges.into_iter().map(Into::into).collect(),
            newly_unlocked_badges: newly_unlocked
                .map(|badges| badges.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of entries to return; defaults to the configured size, capped at 100.
    pub limit: Option<usize>,
}

/// A public leaderboard row. Learner ids are deliberately not exposed.
#[derive(Serialize, ToSchema)]
pub struct LeaderboardRow {
    pub display_name: String,
    pub total_xp: u64,
}

impl From<LeaderboardEntry> for LeaderboardRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            display_name: entry.display_name,
            total_xp: entry.total_xp,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /gamification/update-progress - Award XP, advance the streak, unlock badges
#[utoipa::path(
    post,
    path = "/api/v1/gamification/update-progress",
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = ProgressResponse),
        (status = 400, description = "xp_earned missing or negative"),
        (status = 401, description = "No learner identity"),
        (status = 404, description = "Learner has no progress record"),
        (status = 409, description = "Concurrent update lost the race"),
    ),
    params(
        ("x-learner-id" = Uuid, Header, description = "The resolved learner id.")
    )
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<UpdateProgressRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .progress
        .apply_progress(identity.learner_id, req.xp_earned)
        .await?;

    let data = ProgressResponse::new(outcome.progress, Some(outcome.newly_unlocked));
    Ok(Json(ApiResponse::with_message(
        data,
        "Progress and badges updated",
    )))
}

/// GET /gamification/progress - The acting learner's current progress
#[utoipa::path(
    get,
    path = "/api/v1/gamification/progress",
    responses(
        (status = 200, description = "Current progress", body = ProgressResponse),
        (status = 401, description = "No learner identity"),
        (status = 404, description = "Learner has no progress record"),
    ),
    params(
        ("x-learner-id" = Uuid, Header, description = "The resolved learner id.")
    )
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let progress = state.progress.progress(identity.learner_id).await?;
    Ok(Json(ApiResponse::new(ProgressResponse::new(progress, None))))
}

/// GET /gamification/leaderboard - Top learners by XP
#[utoipa::path(
    get,
    path = "/api/v1/gamification/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Learners ordered by XP", body = [LeaderboardRow]),
    )
)]
pub async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard_size)
        .min(MAX_LEADERBOARD_SIZE);
    let rows: Vec<LeaderboardRow> = state
        .progress
        .top_learners(limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::new(rows)))
}
