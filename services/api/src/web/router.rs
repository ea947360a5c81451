//! services/api/src/web/router.rs
//!
//! Builds the complete HTTP router. Shared by the binary and the integration tests.

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::web::{
    badges::{
        create_badge_handler, delete_badge_handler, get_badge_handler, list_badges_handler,
        update_badge_handler,
    },
    gamification::{leaderboard_handler, progress_handler, update_progress_handler},
    learners::register_learner_handler,
    middleware::{require_identity, LEARNER_ID_HEADER, LEARNER_ROLE_HEADER},
    rest::{health_handler, ApiDoc},
    state::AppState,
};

pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(LEARNER_ID_HEADER),
            HeaderName::from_static(LEARNER_ROLE_HEADER),
        ]);

    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/gamification/leaderboard", get(leaderboard_handler))
        .route("/badges", get(list_badges_handler))
        .route("/badges/{id}", get(get_badge_handler))
        .route("/learners", post(register_learner_handler));

    // Routes acting on behalf of a resolved learner
    let protected_routes = Router::new()
        .route("/gamification/update-progress", post(update_progress_handler))
        .route("/gamification/progress", get(progress_handler))
        .route("/badges", post(create_badge_handler))
        .route(
            "/badges/{id}",
            axum::routing::put(update_badge_handler).delete(delete_badge_handler),
        )
        .layer(axum_middleware::from_fn(require_identity));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes);

    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Ok(app)
}
