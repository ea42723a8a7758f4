use std::fmt;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

pub type Result<T> = core::result::Result<T, Error>;

/// Which half of the publish sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    /// Storing the bytes or fetching their locator.
    Upload,
    /// Building or writing the post record.
    Write,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resource not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error")]
    InternalServerError,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("preview decoding failed: {0}")]
    Decode(String),
    #[error("object storage error: {0}")]
    Storage(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    DatabaseError(sqlx::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{stage} stage failed: {source}")]
    Publish {
        stage: PublishStage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn at_stage(self, stage: PublishStage) -> Self {
        Self::Publish {
            stage,
            source: Box::new(self),
        }
    }

    pub fn stage(&self) -> Option<PublishStage> {
        match self {
            Self::Publish { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::InternalServerError | Self::Config(_) | Self::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::BadRequest(msg) | Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Decode(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Could not decode image".to_string(),
            ),
            Self::Storage(_) => (StatusCode::BAD_GATEWAY, "Object storage error".to_string()),
            Self::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            Self::Publish { stage, source } => match *source {
                Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    match stage {
                        PublishStage::Upload => "Error loading post".to_string(),
                        PublishStage::Write => "Post loading error".to_string(),
                    },
                ),
            },
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {:?}", err);
        Self::DatabaseError(err)
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        error!("Migration error: {:?}", err);
        Self::DatabaseError(err.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}
