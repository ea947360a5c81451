//! services/api/src/web/learners.rs
//!
//! Provisioning hook called by the account subsystem when a learner account is
//! created. It only creates the zero-valued progress record.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::gamification::ProgressResponse;
use crate::web::rest::ApiResponse;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct RegisterLearnerRequest {
    pub learner_id: Uuid,
    pub display_name: String,
}

/// POST /learners - Create the progress record for a new account
#[utoipa::path(
    post,
    path = "/api/v1/learners",
    request_body = RegisterLearnerRequest,
    responses(
        (status = 201, description = "Progress record created", body = ProgressResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Learner already has a record"),
    )
)]
pub async fn register_learner_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterLearnerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let record = state
        .progress
        .register_learner(req.learner_id, &req.display_name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ProgressResponse::new(record, None))),
    ))
}
