//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.
//!
//! Authentication happens upstream. The gateway forwards the resolved learner
//! in `x-learner-id` and their role in `x-learner-role`.

use axum::{extract::Request, middleware::Next, response::Response};
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

pub const LEARNER_ID_HEADER: &str = "x-learner-id";
pub const LEARNER_ROLE_HEADER: &str = "x-learner-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "TEACHER" => Ok(Role::Teacher),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ApiError::Unauthorized(format!("Unknown role '{}'", other))),
        }
    }
}

/// The acting learner, as resolved by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub learner_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn can_manage_badges(&self) -> bool {
        matches!(self.role, Role::Teacher | Role::Admin)
    }
}

/// Middleware that reads the resolved identity headers.
///
/// If valid, inserts an `Identity` into request extensions for handlers to use.
/// If missing or malformed, returns 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let headers = req.headers();

    let learner_id = headers
        .get(LEARNER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing learner identity".to_string()))
        .and_then(|raw| {
            Uuid::parse_str(raw.trim()).map_err(|_| {
                warn!("Rejected malformed {} header", LEARNER_ID_HEADER);
                ApiError::Unauthorized("Malformed learner identity".to_string())
            })
        })?;

    let role = match headers.get(LEARNER_ROLE_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Malformed role".to_string()))?
            .parse::<Role>()?,
        None => Role::Student,
    };

    req.extensions_mut().insert(Identity { learner_id, role });
    Ok(next.run(req).await)
}
