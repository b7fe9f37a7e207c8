//! # Result Responses
//!
//! Turns a [`BisResult`] into an HTTP response.
//!
//! | Outcome              | Status | Body |
//! |----------------------|--------|------|
//! | success              | 200    | [`SuccessResponse`] |
//! | `NotFound`           | 404    | empty |
//! | any other error type | 400    | [`ErrorResponse`](bisace_core::ErrorResponse) |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bisace_core::{BisResult, ErrorType};
use serde::Serialize;

/// Response wrapper for a [`BisResult`].
#[derive(Debug)]
pub struct BisResponse<T>(pub BisResult<T>);

impl<T> From<BisResult<T>> for BisResponse<T> {
    fn from(result: BisResult<T>) -> Self {
        Self(result)
    }
}

impl<T: Serialize> IntoResponse for BisResponse<T> {
    fn into_response(self) -> Response {
        let result = self.0;

        let Some(error) = result.error_response() else {
            return (StatusCode::OK, Json(result.success_body())).into_response();
        };

        tracing::debug!(
            error_type = %result.error_type(),
            message = result.error_message(),
            extra = ?result.error_messages(),
            "request failed"
        );

        if result.error_type() == ErrorType::NotFound {
            return StatusCode::NOT_FOUND.into_response();
        }
        (StatusCode::BAD_REQUEST, Json(error)).into_response()
    }
}
