use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::{
    authoring_service::AuthoringError, catalog_service::CatalogError,
    kidemia_client::UpstreamError,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(String),
    Import(String),
    NotFound(String),
    Conflict(String),
    Upstream(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation",
            ApiError::Import(_) => "import",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Upstream(_) => "upstream",
        }
    }
}

impl From<AuthoringError> for ApiError {
    fn from(err: AuthoringError) -> Self {
        let message = err.to_string();
        match err {
            AuthoringError::SessionNotFound
            | AuthoringError::QuestionNotFound
            | AuthoringError::OptionOutOfRange { .. } => ApiError::NotFound(message),
            AuthoringError::LastQuestion | AuthoringError::SubmitInProgress => {
                ApiError::Conflict(message)
            }
            AuthoringError::FixedOptions | AuthoringError::NotTrueFalse => {
                ApiError::BadRequest(message)
            }
            AuthoringError::Import(_) => ApiError::Import(message),
            AuthoringError::Validation(_) => ApiError::Validation(message),
            AuthoringError::Upstream(err) => err.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::Validation(_) => ApiError::Validation(message),
            CatalogError::Upstream(err) => err.into(),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::InvalidIdentifier(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match self {
            ApiError::BadRequest(message)
            | ApiError::Validation(message)
            | ApiError::Import(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
