//! HTTP surface of the signup service: request validation, registration and
//! the axum router that ties them together.

pub mod error;
pub mod password;
pub mod registration;
pub mod state;
pub mod users;
pub mod validation;

use axum::{
    Router,
    routing::{get, post},
};

pub use state::{AppState, AppStateInner};

/// Builds the application router. Layers (tracing, etc.) are added by the
/// binary so tests can drive the bare router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/1.0/users", post(users::register))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
