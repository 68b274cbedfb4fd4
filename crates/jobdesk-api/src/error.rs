use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jobdesk_types::models::{LOGIN_PATH, RESUME_UPLOAD_PATH};
use jobdesk_types::status::TransitionError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Per-field validation messages, keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Every failure a handler can report. Implements `IntoResponse` so
/// handlers can return `Result<T, ApiError>`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Authentication required.")]
    Unauthenticated,

    #[error("Permission denied.")]
    PermissionDenied { redirect: &'static str },

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("Please correct the errors below.")]
    Validation(FieldErrors),

    #[error("{0}")]
    StateGuard(#[from] TransitionError),

    #[error("You have already applied for this job.")]
    AlreadyApplied,

    #[error("Please upload your resume first to apply for: {job_title}.")]
    ResumeRequired { job_title: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn field(name: &'static str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name, message.into());
        Self::Validation(fields)
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::StateGuard(_) | Self::AlreadyApplied | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ResumeRequired { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateGuard(_) => "INVALID_STATE",
            Self::AlreadyApplied => "ALREADY_APPLIED",
            Self::ResumeRequired { .. } => "RESUME_REQUIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Page the client should go to after seeing the message, if any.
    fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some(LOGIN_PATH),
            Self::PermissionDenied { redirect } => Some(redirect),
            Self::ResumeRequired { .. } => Some(RESUME_UPLOAD_PATH),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "code": self.code(),
            "message": message,
        });
        if let Some(redirect) = self.redirect() {
            body["redirect"] = json!(redirect);
        }
        if let Self::Validation(fields) = &self {
            body["fields"] = json!(fields);
        }

        (self.status(), Json(json!({ "error": body }))).into_response()
    }
}
