use axum::body::{to_bytes, Body};
use axum::extract::{OriginalUri, Request};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::auth::errors::AuthError;
use service::ServiceError;
use thiserror::Error;
use tracing::error;

/// Largest error body the envelope middleware will read back.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// `message` + `error` pair carried by every failed API response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AlreadyExists(_)
            | ServiceError::NameDuplicated(_)
            | ServiceError::InvalidName(_)
            | ServiceError::BadRequest(_)
            | ServiceError::Model(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Db(_) | ServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            ServiceError::Db(_) | ServiceError::Export(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let details = ErrorDetails { message, error: self.0.kind().to_string() };
        let mut res = (status, Json(details.clone())).into_response();
        res.extensions_mut().insert(details);
        res.extensions_mut().insert(ErrorSource(self.0.to_string()));
        res
    }
}

/// Full error text kept for logging when the response message is redacted.
#[derive(Debug, Clone)]
struct ErrorSource(String);

/// Rewrite every 4xx/5xx body as `{ message, error, statusCode, path }` and
/// log the request alongside the failure.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|u| u.0.to_string())
        .unwrap_or_else(|| req.uri().to_string());

    let res = next.run(req).await;
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let source = parts.extensions.remove::<ErrorSource>().map(|s| s.0);
    let details = match parts.extensions.remove::<ErrorDetails>() {
        Some(d) => d,
        None => {
            // Framework rejections (bad JSON, bad path params) carry plain text.
            let text = to_bytes(body, MAX_ERROR_BODY)
                .await
                .map(|b| String::from_utf8_lossy(&b).trim().to_string())
                .unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("Error").to_string();
            ErrorDetails { message: if text.is_empty() { reason.clone() } else { text }, error: reason }
        }
    };

    let exception = source.unwrap_or_else(|| details.message.clone());
    let log = serde_json::json!({
        "request": { "method": method.as_str(), "url": path },
        "exception": { "status": status.as_u16(), "message": exception },
    });
    error!(target: "server::errors", "{}", log);

    let envelope = serde_json::json!({
        "message": details.message,
        "error": details.error,
        "statusCode": status.as_u16(),
        "path": path,
    });
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(envelope.to_string()))
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
