//! # API Route Modules
//!
//! Every handler runs inside the engine session opened by
//! [`session_middleware`](crate::session::session_middleware) and reads it
//! through the [`CallContext`](crate::session::CallContext) extractor.
//! Handlers return [`BisResponse`](crate::response::BisResponse) for domain
//! outcomes and [`AppError`](crate::error::AppError) when the engine could
//! not be reached.
//!
//! - `cards`: card lookup, create, update, delete, card name.
//! - `authorizations`: authorizations of every active card.
//! - `access_groups`: door and lift access groups.

pub mod access_groups;
pub mod authorizations;
pub mod cards;

use axum::Router;

use crate::state::AppState;

/// All `/api` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(cards::router())
        .merge(authorizations::router())
        .merge(access_groups::router())
}
