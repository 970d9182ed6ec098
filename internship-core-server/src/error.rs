//! Mapping of service errors onto HTTP responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use internship_core_api::{CoreError, ErrorKind, FieldError};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing authorization header")]
    MissingAuthorization,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        let ApiError::Core(error) = self else {
            return StatusCode::UNAUTHORIZED;
        };
        match error {
            CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            error => match error.kind() {
                ErrorKind::Input => StatusCode::BAD_REQUEST,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::State | ErrorKind::Integrity => StatusCode::CONFLICT,
                ErrorKind::Infra => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::MissingAuthorization => "missing_authorization",
            ApiError::Core(error) => error.code(),
        }
    }

    /// Message safe to show a client. Infra details stay in the log.
    fn user_message(&self) -> String {
        match self {
            ApiError::Core(error) if error.kind() == ErrorKind::Infra => match error {
                CoreError::DeadlineExceeded => "request timed out".to_string(),
                _ => "internal server error".to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Core(CoreError::MalformedRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Core(CoreError::MalformedRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Core(CoreError::MalformedRequest(rejection.body_text()))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: u16,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = self.reason();
        if status.is_server_error() {
            tracing::error!(error = %self, reason, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, reason, status = %status, "Request rejected");
        }

        let fields = match &self {
            ApiError::Core(CoreError::ValidationFailed(fields)) => fields.clone(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            success: false,
            error: self.user_message(),
            code: status.as_u16(),
            reason,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
