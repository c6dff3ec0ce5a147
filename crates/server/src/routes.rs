pub mod auth;
pub mod feedbacks;
pub mod issues;
pub mod projects;
pub mod tenants;

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::ServiceError;

use crate::errors::{error_envelope, ApiError};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::web;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

async fn api_not_found() -> ApiError {
    ApiError(ServiceError::NotFound("Cannot find route".into()))
}

/// REST API, mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        .route("/tenants", post(tenants::create))
        .route("/tenants/:tenantId", get(tenants::get).put(tenants::update))
        .route("/tenants/:tenantId/feedback-count", get(tenants::feedback_count))
        .route("/projects", post(projects::create))
        .route("/projects/:projectId", get(projects::get))
        .route("/projects/:projectId/api-keys", post(projects::create_api_key))
        .route("/projects/:projectId/api-keys/:apiKeyId", axum::routing::delete(projects::revoke_api_key))
        .route("/projects/:projectId/channels", post(projects::create_channel))
        .route("/projects/:projectId/channels/:channelId", get(projects::get_channel))
        .route("/projects/:projectId/issue-count", get(issues::count))
        .route("/projects/:projectId/issues", post(issues::create).delete(issues::delete_many))
        .route("/projects/:projectId/issues/search", post(issues::search))
        .route(
            "/projects/:projectId/issues/:issueId",
            get(issues::get).put(issues::update).delete(issues::delete),
        )
        .route(
            "/projects/:projectId/channels/:channelId/feedbacks",
            post(feedbacks::create).delete(feedbacks::delete_many),
        )
        .route("/projects/:projectId/channels/:channelId/feedbacks/search", post(feedbacks::search))
        .route("/projects/:projectId/channels/:channelId/feedbacks/export", post(feedbacks::export))
        .route("/projects/:projectId/channels/:channelId/feedbacks/:feedbackId", put(feedbacks::update))
        .route(
            "/projects/:projectId/channels/:channelId/feedbacks/:feedbackId/issue/:issueId",
            post(feedbacks::add_issue).delete(feedbacks::remove_issue),
        )
        .fallback(api_not_found)
        .layer(middleware::from_fn(error_envelope))
}

/// Full application: API, health, Swagger UI and the gated frontend.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router())
        .fallback(web::frontend)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
