//! # API Call Log
//!
//! One `trace` event per request describing the full exchange: caller,
//! route, headers, bodies and timings. The `password` header is never
//! written.
//!
//! Buffering bodies costs a copy of each request and response, so when
//! `trace` is disabled for this module the middleware passes requests
//! straight through. Bodies of unknown size or over [`MAX_LOGGED_BODY`]
//! bytes are streamed through untouched and logged as a placeholder.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::body::{Body, HttpBody};
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Level;
use uuid::Uuid;

use crate::session::PASSWORD_HEADER;
use crate::state::AppState;

const REDACTED: &str = "[REDACTED]";
const NOT_CAPTURED: &str = "[body not captured]";

/// Largest request or response body copied into a log entry.
pub const MAX_LOGGED_BODY: usize = 64 * 1024;

/// A logged request/response pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLogEntry {
    pub id: Uuid,
    pub application: String,
    pub machine: String,
    pub remote_address: Option<String>,
    pub method: String,
    pub uri: String,
    /// Route template, e.g. `/api/GetCard/:card_number`.
    pub route: Option<String>,
    pub request_headers: BTreeMap<String, String>,
    pub request_content_type: Option<String>,
    pub request_body: String,
    pub requested_at: DateTime<Utc>,
    pub status: u16,
    pub response_content_type: Option<String>,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: String,
    pub responded_at: DateTime<Utc>,
}

/// Header map as text, with the password header redacted.
pub fn loggable_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = if name.as_str().eq_ignore_ascii_case(PASSWORD_HEADER) {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        match out.entry(name.as_str().to_string()) {
            Entry::Occupied(mut existing) => {
                let joined = existing.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    out
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn machine_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Buffer `body` when its size is known and within [`MAX_LOGGED_BODY`].
/// Returns the body to forward and its logged text.
async fn capture(body: Body) -> Result<(Body, String), axum::Error> {
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|n| n <= MAX_LOGGED_BODY as u64);
    if !fits {
        return Ok((body, NOT_CAPTURED.to_string()));
    }
    let bytes = axum::body::to_bytes(body, MAX_LOGGED_BODY).await?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok((Body::from(bytes), text))
}

/// Middleware writing an [`ApiLogEntry`] for every request.
pub async fn api_log_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !tracing::enabled!(Level::TRACE) {
        return next.run(request).await;
    }

    let requested_at = Utc::now();
    let remote_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());

    let (parts, body) = request.into_parts();
    let (request_body, request_text) = match capture(body).await {
        Ok(captured) => captured,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut entry = ApiLogEntry {
        id: Uuid::new_v4(),
        application: state.config.application.clone(),
        machine: machine_name(),
        remote_address,
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        route,
        request_headers: loggable_headers(&parts.headers),
        request_content_type: content_type(&parts.headers),
        request_body: request_text,
        requested_at,
        status: 0,
        response_content_type: None,
        response_headers: BTreeMap::new(),
        response_body: String::new(),
        responded_at: requested_at,
    };

    let response = next
        .run(Request::from_parts(parts, request_body))
        .await;

    let (parts, body) = response.into_parts();
    let (response_body, response_text) = match capture(body).await {
        Ok(captured) => captured,
        Err(e) => {
            tracing::debug!(error = %e, "failed to read response body");
            (Body::empty(), String::new())
        }
    };

    entry.status = parts.status.as_u16();
    entry.response_content_type = content_type(&parts.headers);
    entry.response_headers = loggable_headers(&parts.headers);
    entry.response_body = response_text;
    entry.responded_at = Utc::now();

    match serde_json::to_string(&entry) {
        Ok(json) => tracing::trace!(
            id = %entry.id,
            method = %entry.method,
            uri = %entry.uri,
            status = entry.status,
            api_log = %json,
            "api call"
        ),
        Err(e) => tracing::debug!(error = %e, "failed to serialize api log entry"),
    }

    Response::from_parts(parts, response_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::routing::post;
    use http_body_util::BodyExt;
    use axum::Router;
    use bisace_engine::InMemoryAccessEngine;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::tenants::Tenants;

    #[test]
    fn password_header_is_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("user", HeaderValue::from_static("operator"));
        headers.insert("password", HeaderValue::from_static("secret"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let logged = loggable_headers(&headers);
        assert_eq!(logged["user"], "operator");
        assert_eq!(logged["password"], REDACTED);
        assert_eq!(logged["accept"], "text/plain, application/json");
    }

    fn echo_app() -> Router {
        let state = AppState::new(Arc::new(InMemoryAccessEngine::new()), Tenants::default());
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                api_log_middleware,
            ))
            .with_state(state)
    }

    async fn echo_body(app: Router, body: impl Into<Body>) -> String {
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn echo(app: Router) -> String {
        echo_body(app, "card 1234").await
    }

    fn trace_subscriber() -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_test_writer()
            .finish()
    }

    #[tokio::test]
    async fn bodies_pass_through_when_logging() {
        let _guard = tracing::subscriber::set_default(trace_subscriber());
        assert_eq!(echo(echo_app()).await, "card 1234");
    }

    #[tokio::test]
    async fn oversized_bodies_are_forwarded_but_not_captured() {
        let big = "x".repeat(MAX_LOGGED_BODY + 1);
        let (body, text) = capture(Body::from(big.clone())).await.unwrap();
        assert_eq!(text, NOT_CAPTURED);
        let forwarded = body.collect().await.unwrap().to_bytes();
        assert_eq!(forwarded.len(), big.len());
    }

    #[tokio::test]
    async fn small_bodies_are_captured() {
        let (body, text) = capture(Body::from("card 1234")).await.unwrap();
        assert_eq!(text, "card 1234");
        assert_eq!(body.collect().await.unwrap().to_bytes(), "card 1234");
    }

    #[tokio::test]
    async fn oversized_bodies_pass_through_when_logging() {
        let _guard = tracing::subscriber::set_default(trace_subscriber());
        let big = "y".repeat(MAX_LOGGED_BODY * 2);
        assert_eq!(echo_body(echo_app(), big.clone()).await, big);
    }

    #[tokio::test]
    async fn bodies_pass_through_when_not_logging() {
        assert_eq!(echo(echo_app()).await, "card 1234");
    }
}
