//! HTTP rendering of [`EcommerceError`].
//!
//! Every failure is a JSON object with a human readable `message`; validation
//! failures add an `errors` map of field → messages.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{EcommerceError, FieldErrors};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::CategoryMismatch
            | Self::NotFound(_)
            | Self::QuantityExceedsStock { .. }
            | Self::QuantityTooLow => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DuplicateEmail | Self::InsufficientStock { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Validation { message, errors } => ErrorResponse {
                message,
                errors: (!errors.is_empty()).then_some(errors),
            },
            Self::Database(err) => {
                tracing::error!("Database error: {}", err);
                ErrorResponse { message: "Server Error".to_string(), errors: None }
            }
            Self::Internal(err) => {
                tracing::error!("Internal error: {}", err);
                ErrorResponse { message: "Server Error".to_string(), errors: None }
            }
            other => ErrorResponse { message: other.to_string(), errors: None },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for EcommerceError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => err.body_text(),
            JsonRejection::JsonSyntaxError(_) => "The request body must be valid JSON.".to_string(),
            JsonRejection::MissingJsonContentType(_) => "The request body must be JSON.".to_string(),
            other => other.body_text(),
        };
        Self::validation_field("body", message)
    }
}

impl From<PathRejection> for EcommerceError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => Self::validation_field("id", "The id must be an integer."),
            other => Self::Internal(other.body_text()),
        }
    }
}
