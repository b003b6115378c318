use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Superhero not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UploadRejected(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbErr> for ServerError {
    fn from(e: DbErr) -> Self {
        ServerError::Persistence(e.to_string())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::UploadRejected(_) => StatusCode::BAD_REQUEST,
            ServerError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::NotFound(id) => {
                tracing::debug!("Superhero not found: {}", id);
                self.to_string()
            }
            ServerError::Validation(_) | ServerError::UploadRejected(_) => self.to_string(),
            ServerError::Storage(StorageError::NotFound(key)) => {
                tracing::debug!("Blob not found: {}", key);
                "Image not found".to_string()
            }
            _ => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
        };

        let body = serde_json::json!({
            "statusCode": status.as_u16(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
