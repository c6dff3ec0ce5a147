use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub version: String }

#[derive(ToSchema)]
pub struct SignInRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct SignInResponse { pub access_token: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct SetupTenantRequest { pub site_name: String, pub email: String, pub password: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub site_name: String,
    pub use_email: bool,
    pub is_private: bool,
    pub is_restrict_domain: bool,
    pub allow_domains: Vec<String>,
    #[schema(rename = "useOAuth")]
    pub use_oauth: bool,
    #[schema(rename = "oauthConfig", value_type = Option<Object>)]
    pub oauth_config: Option<serde_json::Value>,
}

#[derive(ToSchema)]
pub struct CountResponse { pub total: u64 }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateProjectRequest { pub tenant_id: i32, pub name: String, pub description: Option<String> }

#[derive(ToSchema)]
pub struct CreateFieldRequest {
    pub key: String,
    pub name: String,
    /// text | keyword | number | boolean | select | multiSelect | date
    pub format: String,
    /// API | ADMIN
    #[schema(rename = "type")]
    pub field_type: String,
    pub options: Option<Vec<String>>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateChannelRequest { pub name: String, pub description: Option<String>, pub fields: Vec<CreateFieldRequest> }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub name: String,
    pub description: Option<String>,
    /// INIT | ON_REVIEW | IN_PROGRESS | RESOLVED | PENDING
    pub status: Option<String>,
    pub external_issue_id: Option<String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateIssueRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub external_issue_id: Option<String>,
}

/// Body of issue and feedback searches.
#[derive(ToSchema)]
pub struct SearchRequest {
    #[schema(value_type = Object)]
    pub query: serde_json::Value,
    #[schema(value_type = Object)]
    pub sort: serde_json::Value,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(ToSchema)]
pub struct ExportRequestDoc {
    /// xlsx | csv
    #[schema(rename = "type")]
    pub export_type: String,
    #[schema(value_type = Object)]
    pub query: serde_json::Value,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct DeleteIssuesRequest { pub issue_ids: Vec<i32> }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct DeleteFeedbacksRequest { pub feedback_ids: Vec<i32> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::auth::me,
        crate::routes::tenants::create,
        crate::routes::tenants::get,
        crate::routes::tenants::update,
        crate::routes::tenants::feedback_count,
        crate::routes::projects::create,
        crate::routes::projects::get,
        crate::routes::projects::create_channel,
        crate::routes::projects::get_channel,
        crate::routes::projects::create_api_key,
        crate::routes::projects::revoke_api_key,
        crate::routes::issues::create,
        crate::routes::issues::search,
        crate::routes::issues::get,
        crate::routes::issues::update,
        crate::routes::issues::delete,
        crate::routes::issues::delete_many,
        crate::routes::issues::count,
        crate::routes::feedbacks::create,
        crate::routes::feedbacks::search,
        crate::routes::feedbacks::add_issue,
        crate::routes::feedbacks::remove_issue,
        crate::routes::feedbacks::export,
        crate::routes::feedbacks::update,
        crate::routes::feedbacks::delete_many,
    ),
    components(
        schemas(
            HealthResponse,
            SignInRequest,
            SignInResponse,
            SetupTenantRequest,
            UpdateTenantRequest,
            CountResponse,
            CreateProjectRequest,
            CreateFieldRequest,
            CreateChannelRequest,
            CreateIssueRequest,
            UpdateIssueRequest,
            SearchRequest,
            ExportRequestDoc,
            DeleteIssuesRequest,
            DeleteFeedbacksRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "tenant"),
        (name = "project"),
        (name = "channel"),
        (name = "issue"),
        (name = "feedback")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parameters_are_documented() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let params = &doc["paths"]["/api/tenants/{tenantId}"]["get"]["parameters"];
        assert_eq!(params[0]["name"], "tenantId");
        assert_eq!(params[0]["description"], "Tenant id");

        let link = &doc["paths"]["/api/projects/{projectId}/channels/{channelId}/feedbacks/{feedbackId}/issue/{issueId}"];
        let names: Vec<&str> = link["post"]["parameters"]
            .as_array()
            .map(|ps| ps.iter().filter_map(|p| p["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["projectId", "channelId", "feedbackId", "issueId"]);
    }
}
