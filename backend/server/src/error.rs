use axum::{
    extract::rejection::{BytesRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::response::GlobalResponse;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("cannot encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error parsing json")]
    MalformedPayload,

    #[error("Invalid query parameter {param}: {reason}")]
    InvalidQuery { param: &'static str, reason: String },

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Influencer not found")]
    NotFound,

    #[error("Request timed out")]
    Timeout,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload | AppError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Timeout | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidQuery {
            param: "query",
            reason: rejection.body_text(),
        }
    }
}

/// An id that cannot even be extracted is treated like one that does not parse.
impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::NotFound
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedPayload
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        GlobalResponse::new(status, "error", Some(json!({ "error": self.to_string() })))
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MalformedPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidQuery {
                param: "limit",
                reason: "nope".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(AppError::Timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::from(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_status() {
        let response = AppError::MalformedPayload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
