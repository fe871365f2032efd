use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use signup_types::api::{MessageResponse, RegisterRequest};

use crate::error::ApiError;
use crate::registration::NewUser;
use crate::state::AppState;

/// POST /api/1.0/users: validate, then persist.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    let req = parse_request(body)?;

    let errors = state.validator.validate(&req, &state.db).await?;
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Validation guarantees all three fields are present and non-empty
    let user = NewUser {
        username: req.username.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
        password: req.password.unwrap_or_default(),
    };
    state.registration.register(user).await?;

    Ok(Json(MessageResponse::new("User created")))
}

/// Only a JSON object is a registration; arrays would otherwise fill the
/// fields positionally.
fn parse_request(body: Value) -> Result<RegisterRequest, ApiError> {
    if !body.is_object() {
        return Err(ApiError::MalformedBody(
            "Request body must be a JSON object".into(),
        ));
    }
    serde_json::from_value(body)
        .map_err(|e| ApiError::MalformedBody(format!("Invalid request body: {}", e)))
}
