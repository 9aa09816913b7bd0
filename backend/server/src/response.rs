use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// `{status, message, data}`, shared by every success and error body.
#[derive(Debug, Serialize)]
pub struct GlobalResponse {
    pub status: u16,
    pub message: String,
    pub data: Option<Value>,
}

impl GlobalResponse {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }
}

impl IntoResponse for GlobalResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}
