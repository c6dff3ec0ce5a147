use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use models::tenant;
use service::permission::require_super_of;
use service::tenant_service::{self, Count, SetupTenant, UpdateTenant};

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/tenants", tag = "tenant", request_body = crate::openapi::SetupTenantRequest, responses((status = 200, description = "Tenant created"), (status = 400, description = "Tenant already exists")))]
pub async fn create(State(state): State<AppState>, Json(input): Json<SetupTenant>) -> Result<Json<tenant::Model>, ApiError> {
    let created = tenant_service::create(&state.db, input).await?;
    info!(tenant_id = created.id, "tenant set up");
    Ok(Json(created))
}

#[utoipa::path(get, path = "/api/tenants/{tenantId}", tag = "tenant", params(("tenantId" = i32, Path, description = "Tenant id")), responses((status = 200, description = "Tenant"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(tenant_id): Path<i32>,
) -> Result<Json<tenant::Model>, ApiError> {
    let found = tenant_service::find_by_id(&state.db, tenant_id).await?;
    let is_admin = user.is_some_and(|u| require_super_of(&u.principal, tenant_id).is_ok());
    Ok(Json(if is_admin { found } else { found.without_secrets() }))
}

#[utoipa::path(put, path = "/api/tenants/{tenantId}", tag = "tenant", params(("tenantId" = i32, Path, description = "Tenant id")), request_body = crate::openapi::UpdateTenantRequest, responses((status = 200, description = "Tenant updated"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tenant_id): Path<i32>,
    Json(input): Json<UpdateTenant>,
) -> Result<Json<tenant::Model>, ApiError> {
    require_super_of(&user.principal, tenant_id)?;
    Ok(Json(tenant_service::update(&state.db, tenant_id, input).await?))
}

#[utoipa::path(get, path = "/api/tenants/{tenantId}/feedback-count", tag = "tenant", params(("tenantId" = i32, Path, description = "Tenant id")), responses((status = 200, description = "Feedback count", body = crate::openapi::CountResponse)))]
pub async fn feedback_count(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tenant_id): Path<i32>,
) -> Result<Json<Count>, ApiError> {
    require_super_of(&user.principal, tenant_id)?;
    Ok(Json(tenant_service::count_feedbacks(&state.db, tenant_id).await?))
}
