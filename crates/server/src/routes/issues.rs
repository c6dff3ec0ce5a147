use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use models::issue;
use models::role::Permission;
use service::issue_service::{self, CreateIssue, SearchIssues, UpdateIssue};
use service::pagination::Page;
use service::tenant_service::Count;
use service::ServiceError;

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIssues {
    pub issue_ids: Vec<i32>,
}

/// Issue of the project; issues of other projects are reported as missing.
async fn issue_in_project(state: &AppState, project_id: i32, issue_id: i32) -> Result<issue::Model, ApiError> {
    let found = issue_service::find_by_id(&state.db, issue_id).await?;
    if found.project_id != project_id {
        return Err(ServiceError::not_found("Issue").into());
    }
    Ok(found)
}

#[utoipa::path(post, path = "/api/projects/{projectId}/issues", tag = "issue", params(("projectId" = i32, Path, description = "Project id")), request_body = crate::openapi::CreateIssueRequest, responses((status = 200, description = "Issue created"), (status = 400, description = "Issue name is duplicated")))]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
    Json(input): Json<CreateIssue>,
) -> Result<Json<issue::Model>, ApiError> {
    user.require(&state, project_id, Permission::IssueCreate).await?;
    Ok(Json(issue_service::create(&state.db, project_id, input).await?))
}

#[utoipa::path(post, path = "/api/projects/{projectId}/issues/search", tag = "issue", params(("projectId" = i32, Path, description = "Project id")), request_body = crate::openapi::SearchRequest, responses((status = 200, description = "Paginated issues"), (status = 400, description = "Unknown query column")))]
pub async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
    Json(input): Json<SearchIssues>,
) -> Result<Json<Page<issue::Model>>, ApiError> {
    user.require(&state, project_id, Permission::IssueRead).await?;
    Ok(Json(issue_service::search(&state.db, project_id, input).await?))
}

#[utoipa::path(get, path = "/api/projects/{projectId}/issues/{issueId}", tag = "issue", params(("projectId" = i32, Path, description = "Project id"), ("issueId" = i32, Path, description = "Issue id")), responses((status = 200, description = "Issue"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, issue_id)): Path<(i32, i32)>,
) -> Result<Json<issue::Model>, ApiError> {
    user.require(&state, project_id, Permission::IssueRead).await?;
    Ok(Json(issue_in_project(&state, project_id, issue_id).await?))
}

#[utoipa::path(put, path = "/api/projects/{projectId}/issues/{issueId}", tag = "issue", params(("projectId" = i32, Path, description = "Project id"), ("issueId" = i32, Path, description = "Issue id")), request_body = crate::openapi::UpdateIssueRequest, responses((status = 200, description = "Issue updated"), (status = 400, description = "Duplicated name"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, issue_id)): Path<(i32, i32)>,
    Json(input): Json<UpdateIssue>,
) -> Result<Json<issue::Model>, ApiError> {
    user.require(&state, project_id, Permission::IssueUpdate).await?;
    issue_in_project(&state, project_id, issue_id).await?;
    Ok(Json(issue_service::update(&state.db, issue_id, input).await?))
}

#[utoipa::path(delete, path = "/api/projects/{projectId}/issues/{issueId}", tag = "issue", params(("projectId" = i32, Path, description = "Project id"), ("issueId" = i32, Path, description = "Issue id")), responses((status = 204, description = "Issue deleted"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, issue_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    user.require(&state, project_id, Permission::IssueDelete).await?;
    issue_in_project(&state, project_id, issue_id).await?;
    issue_service::delete_by_id(&state.db, issue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/projects/{projectId}/issues", tag = "issue", params(("projectId" = i32, Path, description = "Project id")), request_body = crate::openapi::DeleteIssuesRequest, responses((status = 204, description = "Issues deleted")))]
pub async fn delete_many(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
    Json(input): Json<DeleteIssues>,
) -> Result<StatusCode, ApiError> {
    user.require(&state, project_id, Permission::IssueDelete).await?;
    let deleted = issue_service::delete_by_ids(&state.db, project_id, &input.issue_ids).await?;
    info!(project_id, deleted, "issues deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/projects/{projectId}/issue-count", tag = "issue", params(("projectId" = i32, Path, description = "Project id")), responses((status = 200, description = "Issue count", body = crate::openapi::CountResponse)))]
pub async fn count(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i32>,
) -> Result<Json<Count>, ApiError> {
    user.require(&state, project_id, Permission::IssueRead).await?;
    Ok(Json(issue_service::count_by_project(&state.db, project_id).await?))
}
