#![deny(missing_docs)]

//! # bisace-core: Foundational Types for the BIS ACE Façade
//!
//! Types shared by every crate in the workspace. No internal crate
//! dependencies; only `serde`, `thiserror`, `quick-xml` and `utoipa` from the
//! external ecosystem.
//!
//! ## Contents
//!
//! - [`BisResult`]: the uniform success/error/resource container returned
//!   by every orchestration operation, and its [`ErrorType`] classification.
//! - [`models`]: wire models (`Card`, `CardAuthorization`, ...) exchanged
//!   with API clients.
//! - [`messages`]: the fixed client-facing error messages.
//! - [`card_number`]: card number normalization and code data encoding.
//! - [`connection`]: `key=value;` connection string parsing and rewriting.
//! - [`options`]: per-tenant XML option files merged into one document
//!   and deserialized into typed option sections.

pub mod card_number;
pub mod connection;
pub mod error_type;
pub mod messages;
pub mod models;
pub mod options;
pub mod result;

pub use card_number::{card_code_data, pad_card_number, DEFAULT_CARD_NUMBER_LENGTH};
pub use connection::{ConnectionString, ConnectionStringError};
pub use error_type::ErrorType;
pub use models::{AccessGroup, AccessGroupKind, Authorization, Card, CardAuthorization};
pub use options::{CardOptions, OptionsBuilder, OptionsDocument, OptionsError, OptionsSection};
pub use result::{BisResult, ErrorResponse, SuccessResponse};
