//! HTTP error bodies and status codes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::{ErrorKind, IncidentError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error_type: "ValidationFailed",
                errors: Some(vec![message.clone()]),
                message,
            },
        }
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            body: ErrorBody {
                error_type: "UnsupportedMediaType",
                message: message.into(),
                errors: None,
            },
        }
    }
}

/// Bodies that are not JSON, or JSON of the wrong shape, are validation
/// failures like any other bad field.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationFailed | ErrorKind::TransitionRejected => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::MalformedInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StorageFailure | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_type(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ValidationFailed => "ValidationFailed",
        ErrorKind::TransitionRejected => "TransitionRejected",
        ErrorKind::NotFound => "NotFound",
        ErrorKind::StorageFailure => "StorageFailure",
        ErrorKind::MalformedInput => "MalformedInput",
        ErrorKind::Config => "Config",
    }
}

impl From<IncidentError> for ApiError {
    fn from(err: IncidentError) -> Self {
        let kind = err.kind();
        let status = status_for(kind);

        // Storage details stay in the log, not in the response.
        let message = if status.is_server_error() {
            error!(error = %err, "request failed");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let errors = match err {
            IncidentError::ValidationFailed(errors) => Some(errors),
            IncidentError::TransitionRejected(reason) => Some(vec![reason]),
            _ => None,
        };

        Self {
            status,
            body: ErrorBody {
                error_type: error_type(kind),
                message,
                errors,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
