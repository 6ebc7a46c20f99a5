use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const NO_FILE_PART: &str = "No file part in the request";
pub const NO_SELECTED_FILE: &str = "No selected file";
pub const INVALID_FORMAT: &str = "Invalid file format. Only PDF files are allowed.";
pub const UPLOAD_TOO_LARGE: &str = "File exceeds upload limit";
pub const INVALID_SESSION: &str = "Invalid session id";
pub const QUESTION_MISSING: &str = "Question not provided";
pub const NO_TEXT: &str = "No text extracted from PDF. Please upload a PDF first.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: &str) -> Self {
        ApiError::BadRequest(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(MessageBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
