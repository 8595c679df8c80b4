use axum::http::StatusCode;
use axum::response::IntoResponse;
use sqlx::Error;
use thiserror::Error;

use crate::chart::timeutil::TimeError;
use crate::external::bar_provider::BarProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("Annotation is locked")]
    Locked,
    #[error("External error: {0}")]
    External(String),
    #[error("Upstream response could not be decoded: {0}")]
    UpstreamDecode(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Locked => {
                (StatusCode::CONFLICT, "Annotation is locked").into_response()
            }
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::UpstreamDecode(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Malformed upstream response: {}", msg))
                    .into_response()
            }
            AppError::Db(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: Error) -> Self {
        AppError::Db(value)
    }
}

impl From<TimeError> for AppError {
    fn from(value: TimeError) -> Self {
        AppError::Validation(value.to_string())
    }
}

impl From<BarProviderError> for AppError {
    fn from(value: BarProviderError) -> Self {
        match value {
            BarProviderError::Parse(msg) => AppError::UpstreamDecode(msg),
            other => AppError::External(other.to_string()),
        }
    }
}
