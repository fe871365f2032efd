use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use signup_types::api::{MessageResponse, ValidationErrorResponse, ValidationErrors};

use crate::registration::RegistrationError;
use crate::validation::{EMAIL_IN_USE, Field, LookupError};

#[derive(Debug)]
pub enum ApiError {
    /// One or more fields failed validation. 400.
    Validation(ValidationErrors),
    /// Body was not a JSON object of string/null fields. 400.
    MalformedBody(String),
    /// Anything the client cannot fix. Details are logged, not returned.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(validation_errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorResponse { validation_errors }),
            )
                .into_response(),
            ApiError::MalformedBody(message) => {
                (StatusCode::BAD_REQUEST, Json(MessageResponse::new(message))).into_response()
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("Internal server error")),
            )
                .into_response(),
        }
    }
}

/// Only a genuine unique-constraint conflict becomes "Email in use"; every
/// other persistence failure is a 500.
impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::DuplicateEmail => {
                warn!("Email taken between validation and insert");
                ApiError::Validation(ValidationErrors::single(Field::Email.as_str(), EMAIL_IN_USE))
            }
            other => {
                error!("Registration failed: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        error!("Email lookup failed: {}", err);
        ApiError::Internal
    }
}
