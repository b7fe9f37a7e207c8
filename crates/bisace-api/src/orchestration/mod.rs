//! # Record Orchestration
//!
//! Short sequences of engine calls behind each API operation: look up an id,
//! fetch the record, validate, write related records, return.
//!
//! ## Two Error Channels
//!
//! Every operation returns [`Outcome<T>`]:
//!
//! - `Ok(BisResult)` carries the domain outcome. Vendor refusals (unknown
//!   card, failed update, ...) become failed results with a client-facing
//!   message and classification.
//! - `Err(EngineError)` means the engine could not be reached or answered
//!   garbage. Handlers turn it into a 500 through
//!   [`AppError`](crate::error::AppError).
//!
//! [`EngineResultExt::vendor`](bisace_engine::EngineResultExt::vendor)
//! separates the two at each call site.
//!
//! | Module             | Operations |
//! |--------------------|------------|
//! | [`cards`]          | validate, populate, create, update, delete, card name |
//! | [`persons`]        | get, update from card |
//! | [`authorizations`] | per person, all active cards |
//! | [`access_groups`]  | door and lift groups |

pub mod access_groups;
pub mod authorizations;
pub mod cards;
pub mod persons;

use bisace_core::BisResult;
use bisace_engine::EngineError;

/// Domain result, or an infrastructure failure.
pub type Outcome<T> = Result<BisResult<T>, EngineError>;
