//! # bisace-engine -- Typed access to the BIS ACE access-control engine
//!
//! The access engine owns cards, persons, authorizations and door/lift
//! access groups. Every interaction starts with a login that yields an
//! [`EngineSession`]; the session then runs record lookups, predicate
//! queries and mutations until it is dropped or logged out.
//!
//! ## Implementations
//!
//! - [`HttpAccessEngine`] talks to the engine's HTTP gateway
//!   (`{base_url}/api/v1/...`), retrying transport failures.
//! - [`InMemoryAccessEngine`] keeps the whole directory in process. It backs
//!   local development and the API test suites.
//!
//! ## Return codes
//!
//! The engine reports rejections as [`ReturnCode`]s. They surface as
//! [`EngineError::Rejected`]; transport and gateway failures are separate
//! variants so callers can tell "the engine said no" from "the engine could
//! not be reached". [`EngineResultExt::vendor`] splits the two.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod memory;
pub mod query;
pub mod records;
pub(crate) mod retry;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AccessEngine, Credentials, EngineSession};
pub use error::{EngineError, EngineResultExt, ReturnCode};
pub use http::HttpAccessEngine;
pub use memory::InMemoryAccessEngine;
pub use query::{Condition, Query, Row, Table};
pub use records::{
    AccessGroupRecord, AceDate, AuthorizationGrant, AuthorizationRecord, CardRecord, GroupKind,
    NewCard, PersonRecord,
};
