//! # bisace-api: REST Façade over the BIS ACE Access Engine
//!
//! Each `/api` call logs in to the access engine with the caller's
//! credentials, runs a short sequence of engine calls, folds the vendor
//! return codes into a [`BisResult`](bisace_core::BisResult) and renders
//! it as JSON.
//!
//! ## API Surface
//!
//! | Route                                    | Module                     |
//! |------------------------------------------|----------------------------|
//! | `GET /api/GetCard/{cardNumber}`          | [`routes::cards`]          |
//! | `POST /api/AddCard`                      | [`routes::cards`]          |
//! | `PUT /api/UpdateCard`                    | [`routes::cards`]          |
//! | `DELETE /api/DeleteCard/{cardNumber}`    | [`routes::cards`]          |
//! | `GET /api/GetDoorAccessGroups/{cardNumber}` | [`routes::cards`]       |
//! | `GET /api/GetAuthorizations`             | [`routes::authorizations`] |
//! | `GET /api/DoorAccessGroups`              | [`routes::access_groups`]  |
//! | `GET /api/LiftAccessGroups`              | [`routes::access_groups`]  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → ApiLog → Session (login, handler, logout) → Handler
//! ```
//!
//! Health probes and `/openapi.json` sit outside the stack and need no
//! credentials.

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod orchestration;
pub mod response;
pub mod routes;
pub mod session;
pub mod state;
pub mod tenants;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    // Session middleware only wraps matched routes, so unknown paths answer
    // 404 without an engine login.
    let api = routes::router()
        .route_layer(from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::api_log::api_log_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router())
        .with_state(state);

    Router::new().merge(public).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
