//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::notify::PushError;

// Errors

#[derive(Debug)]
pub struct ApiError(anyhow::Error);

/// Convert `ApiError` into an Axum compatible response.
///
/// Validation failures become a 400 with the validation message. Every
/// other error is a 500 with a generic message so storage details are
/// not leaked to callers.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(PushError::Validation(msg)) = self.0.downcast_ref::<PushError>() {
            tracing::warn!("Rejected request: {}", msg);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "success": false, "error": msg })),
            )
                .into_response();
        }

        // Always log the error
        tracing::error!("{}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": "Something went wrong" })),
        )
            .into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod health {
    pub use crate::api::routes::health::public::*;
}

pub mod push {
    pub use crate::api::routes::push::public::*;
}
