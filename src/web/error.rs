//! HTTP error mapping

use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, info};

pub const GENERATION_FAILED: &str = "An error occurred while generating the image.";

/// Errors a route handler can surface to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request body.
    BadRequest(String),
    /// Anything that went wrong after the request was accepted. Details stay in the logs.
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                info!("Bad request received: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(err) => {
                // Already logged where it happened.
                debug!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": GENERATION_FAILED })),
                )
                    .into_response()
            }
        }
    }
}
