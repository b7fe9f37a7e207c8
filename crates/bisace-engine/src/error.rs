//! Engine error types and vendor return codes.

use serde::{Deserialize, Serialize};

/// Return codes reported by the access engine.
///
/// Only [`ReturnCode::Success`] means the call took effect. Codes this
/// client does not know deserialize as [`ReturnCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnCode {
    #[serde(rename = "API_SUCCESS_CS")]
    Success,
    #[serde(rename = "API_LOGIN_FAILED_CS")]
    LoginFailed,
    #[serde(rename = "API_NOT_LOGGED_IN_CS")]
    NotLoggedIn,
    #[serde(rename = "API_RECORD_NOT_FOUND_CS")]
    RecordNotFound,
    #[serde(rename = "API_INVALID_PARAMETER_CS")]
    InvalidParameter,
    #[serde(rename = "API_DUPLICATE_RECORD_CS")]
    DuplicateRecord,
    #[serde(rename = "API_PERS_INVALID_CUSTOM_FIELD_NAME")]
    InvalidCustomFieldName,
    #[serde(rename = "API_QUERY_FAILED_CS")]
    QueryFailed,
    #[serde(rename = "API_NO_RIGHTS_CS")]
    NoRights,
    #[serde(other)]
    Unknown,
}

impl ReturnCode {
    /// Whether the call took effect.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Errors from engine calls.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine processed the call and refused it.
    #[error("{operation} was rejected by the access engine: {code:?}")]
    Rejected {
        operation: String,
        code: ReturnCode,
    },
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The gateway answered with a non-2xx status and no return code.
    #[error("engine gateway {endpoint} returned {status}: {body}")]
    Gateway {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl EngineError {
    pub(crate) fn rejected(operation: impl Into<String>, code: ReturnCode) -> Self {
        Self::Rejected {
            operation: operation.into(),
            code,
        }
    }

    /// The vendor return code, if the engine rejected the call.
    pub fn return_code(&self) -> Option<ReturnCode> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Separates vendor rejections from infrastructure failures.
pub trait EngineResultExt<T> {
    /// `Ok(Ok(value))` on success, `Ok(Err(code))` when the engine rejected
    /// the call, and `Err(_)` when it could not be reached.
    fn vendor(self) -> Result<Result<T, ReturnCode>, EngineError>;
}

impl<T> EngineResultExt<T> for Result<T, EngineError> {
    fn vendor(self) -> Result<Result<T, ReturnCode>, EngineError> {
        match self {
            Ok(value) => Ok(Ok(value)),
            Err(EngineError::Rejected { code, .. }) => Ok(Err(code)),
            Err(other) => Err(other),
        }
    }
}
