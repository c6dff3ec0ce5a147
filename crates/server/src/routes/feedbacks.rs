//! Feedback of a channel. Intake is authenticated by project API key, every
//! other operation by the signed-in user's project role.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use models::history::{EntityName, HistoryAction};
use models::role::Permission;
use service::channel_service::{self, ChannelDetail};
use service::export::ExportRequest;
use service::feedback::{self, IssueLink, SearchFeedbacks};
use service::history_service::{self, CreateHistory};
use service::pagination::Page;
use service::ServiceError;

use crate::errors::ApiError;
use crate::extract::{CurrentUser, ProjectApiKey};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFeedbacks {
    pub feedback_ids: Vec<i32>,
}

async fn channel_in_project(state: &AppState, project_id: i32, channel_id: i32) -> Result<ChannelDetail, ApiError> {
    let channel = channel_service::find_by_id(&state.db, channel_id).await?;
    if channel.project.id != project_id {
        return Err(ServiceError::bad_request("Invalid channel id").into());
    }
    Ok(channel)
}

#[utoipa::path(post, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id"), ("x-api-key" = String, Header, description = "Project API key")), responses((status = 200, description = "Feedback created"), (status = 400, description = "Invalid channel id or payload"), (status = 401, description = "Invalid API key")))]
pub async fn create(
    State(state): State<AppState>,
    ProjectApiKey(key): ProjectApiKey,
    Path((project_id, channel_id)): Path<(i32, i32)>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Created>, ApiError> {
    let created = feedback::create(&state.db, project_id, channel_id, body).await?;
    info!(feedback_id = created.id, api_key_id = key.id, "feedback received");
    Ok(Json(Created { id: created.id }))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks/search", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id")), request_body = crate::openapi::SearchRequest, responses((status = 200, description = "Paginated feedback"), (status = 400, description = "Invalid query")))]
pub async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id)): Path<(i32, i32)>,
    Json(input): Json<SearchFeedbacks>,
) -> Result<Json<Page<Map<String, Value>>>, ApiError> {
    user.require(&state, project_id, Permission::FeedbackRead).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    Ok(Json(feedback::search(&state.db, channel_id, input).await?))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks/{feedbackId}/issue/{issueId}", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id"), ("feedbackId" = i32, Path, description = "Feedback id"), ("issueId" = i32, Path, description = "Issue id")), responses((status = 200, description = "Issue linked"), (status = 404, description = "Not Found")))]
pub async fn add_issue(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id, feedback_id, issue_id)): Path<(i32, i32, i32, i32)>,
) -> Result<Json<IssueLink>, ApiError> {
    user.require(&state, project_id, Permission::FeedbackIssueUpdate).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    Ok(Json(feedback::add_issue(&state.db, channel_id, feedback_id, issue_id).await?))
}

#[utoipa::path(delete, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks/{feedbackId}/issue/{issueId}", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id"), ("feedbackId" = i32, Path, description = "Feedback id"), ("issueId" = i32, Path, description = "Issue id")), responses((status = 200, description = "Issue unlinked"), (status = 404, description = "Not Found")))]
pub async fn remove_issue(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id, feedback_id, issue_id)): Path<(i32, i32, i32, i32)>,
) -> Result<Json<IssueLink>, ApiError> {
    user.require(&state, project_id, Permission::FeedbackIssueUpdate).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    Ok(Json(feedback::remove_issue(&state.db, channel_id, feedback_id, issue_id).await?))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks/export", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id")), request_body = crate::openapi::ExportRequestDoc, responses((status = 200, description = "Spreadsheet attachment"), (status = 400, description = "Invalid query")))]
pub async fn export(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id)): Path<(i32, i32)>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    user.require(&state, project_id, Permission::FeedbackDownloadRead).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    let file = service::export::export(&state.db, channel_id, &req).await?;

    history_service::spawn_create(
        state.db.clone(),
        CreateHistory {
            user_id: Some(user.id()),
            entity_name: EntityName::Channel,
            entity_id: channel_id,
            action: HistoryAction::Download,
            entity: json!({ "feedbackIds": file.feedback_ids }),
        },
    );

    let disposition = HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", file.filename).as_bytes())
        .map_err(|e| ServiceError::Export(e.to_string()))?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, file.bytes).into_response())
}

#[utoipa::path(put, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks/{feedbackId}", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id"), ("feedbackId" = i32, Path, description = "Feedback id")), responses((status = 200, description = "Feedback updated"), (status = 400, description = "Only ADMIN fields can be updated"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id, feedback_id)): Path<(i32, i32, i32)>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    user.require(&state, project_id, Permission::FeedbackUpdate).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    feedback::update(&state.db, channel_id, feedback_id, patch).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(delete, path = "/api/projects/{projectId}/channels/{channelId}/feedbacks", tag = "feedback", params(("projectId" = i32, Path, description = "Project id"), ("channelId" = i32, Path, description = "Channel id")), request_body = crate::openapi::DeleteFeedbacksRequest, responses((status = 200, description = "Feedback deleted")))]
pub async fn delete_many(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, channel_id)): Path<(i32, i32)>,
    Json(input): Json<DeleteFeedbacks>,
) -> Result<StatusCode, ApiError> {
    user.require(&state, project_id, Permission::FeedbackDelete).await?;
    channel_in_project(&state, project_id, channel_id).await?;
    let deleted = feedback::delete_by_ids(&state.db, channel_id, &input.feedback_ids).await?;
    info!(channel_id, deleted, "feedback deleted");
    Ok(StatusCode::OK)
}
