//! Typed HTTP client for the web frontend's data hooks.
//!
//! Wraps the feedback search endpoint: bearer auth, JSON body in, typed
//! page out. Non-success responses surface the status code together with
//! the server's error envelope.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        envelope: Option<ErrorEnvelope>,
        body: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Error body written by the API for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub error: String,
    pub status_code: u16,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchBody {
    pub query: Map<String, Value>,
    pub sort: Map<String, Value>,
    pub page: u64,
    pub limit: u64,
}

impl SearchBody {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit, ..Default::default() }
    }

    pub fn filter(mut self, key: &str, value: Value) -> Self {
        self.query.insert(key.to_string(), value);
        self
    }

    pub fn sort_by(mut self, key: &str, direction: &str) -> Self {
        self.sort.insert(key.to_string(), Value::String(direction.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub item_count: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

/// One page of feedback; each item is the flattened feedback data with
/// `id`, `createdAt`, `updatedAt` and `issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackPage {
    pub items: Vec<Map<String, Value>>,
    pub meta: PageMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn search_url(&self, project_id: i32, channel_id: i32) -> String {
        format!("{}/api/projects/{project_id}/channels/{channel_id}/feedbacks/search", self.base_url)
    }

    /// Exchange credentials for an access token and keep it for later calls.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/auth/sign-in", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: SignInResponse = check(resp).await?.json().await?;
        self.token = Some(body.access_token);
        Ok(())
    }

    pub async fn search_feedbacks(
        &self,
        project_id: i32,
        channel_id: i32,
        body: &SearchBody,
    ) -> Result<FeedbackPage, ClientError> {
        let url = self.search_url(project_id, channel_id);
        debug!(%url, page = body.page, limit = body.limit, "search feedbacks");
        let mut req = self.http.post(&url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = check(req.send().await?).await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status: StatusCode = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
    Err(ClientError::Status { status: status.as_u16(), envelope, body })
}
