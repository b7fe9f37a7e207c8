//! # Error Classification
//!
//! Every vendor return code, validation failure and lookup miss is folded
//! into one of six [`ErrorType`] values. The HTTP layer only needs to know
//! the classification, never the originating vendor code.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome classification carried by a [`BisResult`](crate::BisResult).
///
/// The numeric codes are stable and match the values reported to API
/// clients by earlier releases of the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
pub enum ErrorType {
    /// No error.
    #[default]
    None,
    /// Unclassified failure.
    Other,
    /// The request was missing data or carried malformed data.
    InvalidInput,
    /// The service or tenant configuration is incomplete.
    Configuration,
    /// Login against the access engine failed.
    #[serde(rename = "Unauthorised")]
    Unauthorized,
    /// The requested record does not exist.
    NotFound,
}

impl ErrorType {
    /// Stable numeric code for this classification.
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Other => 1,
            Self::InvalidInput => 2,
            Self::Configuration => 3,
            Self::Unauthorized => 4,
            Self::NotFound => 5,
        }
    }

    /// Client-facing description, as written into error response bodies.
    pub fn description(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Other => "Other",
            Self::InvalidInput => "InvalidInput",
            Self::Configuration => "Configuration",
            Self::Unauthorized => "Unauthorised",
            Self::NotFound => "NotFound",
        }
    }

    /// Look up a classification by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Other),
            2 => Some(Self::InvalidInput),
            3 => Some(Self::Configuration),
            4 => Some(Self::Unauthorized),
            5 => Some(Self::NotFound),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
