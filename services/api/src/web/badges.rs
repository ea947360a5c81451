//! services/api/src/web/badges.rs
//!
//! Badge catalog management. Reads are public; writes need a TEACHER or ADMIN role.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use progress_core::domain::{BadgeDraft, RequirementType};
use progress_core::ports::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::middleware::Identity;
use crate::web::rest::{ApiResponse, BadgeResponse};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct BadgeRequest {
    pub name: String,
    pub icon_url: String,
    /// One of `XP_REACHED`, `STREAK_REACHED`, `PERFECT_SCORE`.
    pub requirement_type: String,
    pub requirement_value: i64,
}

impl BadgeRequest {
    fn into_draft(self) -> Result<BadgeDraft, PortError> {
        let requirement_type = self.requirement_type.parse::<RequirementType>()?;
        let requirement_value = u64::try_from(self.requirement_value).map_err(|_| {
            PortError::InvalidArgument(format!(
                "requirement_value must be >= 0, got {}",
                self.requirement_value
            ))
        })?;
        Ok(BadgeDraft {
            name: self.name.trim().to_string(),
            icon_url: self.icon_url.trim().to_string(),
            requirement_type,
            requirement_value,
        })
    }
}

fn require_staff(identity: &Identity) -> Result<(), ApiError> {
    if identity.can_manage_badges() {
        Ok(())
    } else {
        Err(PortError::Forbidden(format!(
            "Role {:?} may not manage badges",
            identity.role
        ))
        .into())
    }
}

fn parse_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    let Path(id) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(id)
}

fn parse_body(payload: Result<Json<BadgeRequest>, JsonRejection>) -> ApiResult<BadgeDraft> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(req.into_draft()?)
}

/// GET /badges - The full catalog in catalog order
#[utoipa::path(
    get,
    path = "/api/v1/badges",
    responses((status = 200, description = "All badges", body = [BadgeResponse]))
)]
pub async fn list_badges_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let badges: Vec<BadgeResponse> = state
        .badges
        .list_badges()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::new(badges)))
}

/// GET /badges/{id}
#[utoipa::path(
    get,
    path = "/api/v1/badges/{id}",
    params(("id" = Uuid, Path, description = "Badge id")),
    responses(
        (status = 200, description = "The badge", body = BadgeResponse),
        (status = 404, description = "No such badge"),
    )
)]
pub async fn get_badge_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(path)?;
    let badge = state.badges.get_badge(id).await?;
    Ok(Json(ApiResponse::new(BadgeResponse::from(badge))))
}

/// POST /badges
#[utoipa::path(
    post,
    path = "/api/v1/badges",
    request_body = BadgeRequest,
    responses(
        (status = 201, description = "Badge created", body = BadgeResponse),
        (status = 400, description = "Invalid badge definition"),
        (status = 403, description = "Role may not manage badges"),
    )
)]
pub async fn create_badge_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<BadgeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    require_staff(&identity)?;
    let draft = parse_body(payload)?;
    let badge = state.badges.create_badge(draft).await?;
    info!(badge_id = %badge.id, by = %identity.learner_id, "Badge created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            BadgeResponse::from(badge),
            "Badge created",
        )),
    ))
}

/// PUT /badges/{id}
#[utoipa::path(
    put,
    path = "/api/v1/badges/{id}",
    params(("id" = Uuid, Path, description = "Badge id")),
    request_body = BadgeRequest,
    responses(
        (status = 200, description = "Badge updated", body = BadgeResponse),
        (status = 400, description = "Invalid badge definition"),
        (status = 403, description = "Role may not manage badges"),
        (status = 404, description = "No such badge"),
    )
)]
pub async fn update_badge_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<BadgeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    require_staff(&identity)?;
    let id = parse_id(path)?;
    let draft = parse_body(payload)?;
    let badge = state.badges.update_badge(id, draft).await?;
    info!(badge_id = %badge.id, by = %identity.learner_id, "Badge updated");
    Ok(Json(ApiResponse::with_message(
        BadgeResponse::from(badge),
        "Badge updated",
    )))
}

/// DELETE /badges/{id}
///
/// Learners who already earned the badge keep it.
#[utoipa::path(
    delete,
    path = "/api/v1/badges/{id}",
    params(("id" = Uuid, Path, description = "Badge id")),
    responses(
        (status = 200, description = "Badge deleted"),
        (status = 403, description = "Role may not manage badges"),
        (status = 404, description = "No such badge"),
    )
)]
pub async fn delete_badge_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    require_staff(&identity)?;
    let id = parse_id(path)?;
    state.badges.delete_badge(id).await?;
    info!(badge_id = %id, by = %identity.learner_id, "Badge deleted");
    Ok(Json(ApiResponse::message_only("Badge deleted")))
}
