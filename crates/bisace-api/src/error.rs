//! # API Error Types
//!
//! Failures that are not domain outcomes. Vendor refusals travel as
//! [`BisResult`](bisace_core::BisResult) values and are rendered by
//! [`crate::response`]; this type covers the rest: the engine gateway being
//! unreachable or answering garbage, and broken request plumbing.
//!
//! Every variant maps to a 5xx status. Details are logged and never
//! returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bisace_engine::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body of a 5xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code, e.g. "ENGINE_ERROR".
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error implementing [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// The engine could not be reached or returned an unusable answer (500).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Engine(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Engine(_) => tracing::error!(error = %self, "access engine call failed"),
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: "An internal error occurred".to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
