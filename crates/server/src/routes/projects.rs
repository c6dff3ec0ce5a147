//! Projects with their channels and API keys.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use models::role::Permission;
use models::{api_key, project};
use service::channel_service::{self, ChannelDetail, CreateChannel};
use service::permission::{require_member, require_super_of};
use service::project_service::{self, CreateProject};
use service::{api_key_service, ServiceError};

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/projects", tag = "project", request_body = crate::openapi::CreateProjectRequest, responses((status = 200, description = "Project created"), (status = 400, description = "Name duplicated"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateProject>,
) -> Result<Json<project::Model>, ApiError> {
    require_super_of(&user.principal, input.tenant_id)?;
    let created = project_service::create(&state.db, user.id(), input).await?;
    info!(project_id = created.id, "project created");
    Ok(Json(created))
}

#[utoipa::path(get, path = "/api/projects/{projectId}", tag = "project", params(("projectId" = i32, Path, description = "Project id")), responses((status = 200, description = "Project"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
) -> Result<Json<project::Model>, ApiError> {
    Ok(Json(require_member(&state.db, &user.principal, project_id).await?))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/channels", tag = "channel", params(("projectId" = i32, Path, description = "Project id")), request_body = crate::openapi::CreateChannelRequest, responses((status = 200, description = "Channel created"), (status = 400, description = "Invalid fields")))]
pub async fn create_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
    Json(input): Json<CreateChannel>,
) -> Result<Json<ChannelDetail>, ApiError> {
    user.require(&state, project_id, Permission::ChannelCreate).await?;
    Ok(Json(channel_service::create(&state.db, project_id, input).await?))
}

#[utoipa::path(get, path = "/api/projects/{projectId}/channels/{channelId}", tag = "channel", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id")), responses((status = 200, description = "Channel with fields"), (status = 404, description = "Not Found")))]
pub async fn get_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id)): Path<(i32, i32)>,
) -> Result<Json<ChannelDetail>, ApiError> {
    user.require(&state, project_id, Permission::ChannelRead).await?;
    let detail = channel_service::find_by_id(&state.db, channel_id).await?;
    if detail.project.id != project_id {
        return Err(ServiceError::not_found("Channel").into());
    }
    Ok(Json(detail))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/api-keys", tag = "project", params(("projectId" = i32, Path, description = "Project id")), responses((status = 200, description = "API key issued")))]
pub async fn create_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
) -> Result<Json<api_key::Model>, ApiError> {
    user.require(&state, project_id, Permission::ApikeyCreate).await?;
    Ok(Json(api_key_service::create(&state.db, project_id).await?))
}

#[utoipa::path(delete, path = "/api/projects/{projectId}/api-keys/{apiKeyId}", tag = "project", params(("projectId" = i32, Path, description = "Project id"), ("apiKeyId" = i32, Path, description = "API key id")), responses((status = 204, description = "API key revoked"), (status = 404, description = "Not Found")))]
pub async fn revoke_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, api_key_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    user.require(&state, project_id, Permission::ApikeyCreate).await?;
    api_key_service::revoke(&state.db, project_id, api_key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
