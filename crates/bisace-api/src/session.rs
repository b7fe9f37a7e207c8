//! # Engine Sessions
//!
//! Every `/api` request runs inside its own engine session:
//!
//! 1. The tenant is chosen from the optional `system-id` header. Without the
//!    header the tenant with the lowest id is used.
//! 2. `user` and `password` headers are sent to the engine's login together
//!    with the tenant's server name. A missing header counts as empty.
//! 3. The handler reads the session through the [`CallContext`] extractor.
//! 4. The session is logged out once the handler has produced a response.
//!
//! A refused login answers `Unauthorised` / "Failed to login." and the
//! handler never runs. An unknown or malformed `system-id` answers
//! `Configuration` / "No Call Context Was Found For This Environment".

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bisace_core::{messages, BisResult, CardOptions, ErrorType};
use bisace_engine::{Credentials, EngineResultExt, EngineSession};

use crate::error::AppError;
use crate::response::BisResponse;
use crate::state::AppState;
use crate::tenants::{TenantConfig, Tenants};

pub const USER_HEADER: &str = "user";
pub const PASSWORD_HEADER: &str = "password";
pub const SYSTEM_ID_HEADER: &str = "system-id";

/// The tenant and open engine session of the current request.
#[derive(Clone)]
pub struct CallContext {
    tenant: Arc<TenantConfig>,
    session: Arc<dyn EngineSession>,
}

impl CallContext {
    pub fn new(tenant: Arc<TenantConfig>, session: Arc<dyn EngineSession>) -> Self {
        Self { tenant, session }
    }

    pub fn tenant(&self) -> &TenantConfig {
        &self.tenant
    }

    pub fn session(&self) -> &dyn EngineSession {
        self.session.as_ref()
    }

    pub fn card_options(&self) -> &CardOptions {
        &self.tenant.card_options
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("system_id", &self.tenant.system_id)
            .finish_non_exhaustive()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("no engine session on request".into()))
    }
}

/// First value of a header as text. Missing or non-UTF-8 headers are empty.
fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Pick the tenant named by the `system-id` header.
pub fn resolve_tenant(
    headers: &HeaderMap,
    tenants: &Tenants,
) -> Result<Arc<TenantConfig>, BisResult<()>> {
    let no_context = || BisResult::failure(ErrorType::Configuration, messages::NO_CALL_CONTEXT);

    match headers.get(SYSTEM_ID_HEADER) {
        None => tenants.default_tenant().ok_or_else(no_context),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(|id| tenants.get(id))
            .ok_or_else(no_context),
    }
}

/// Log in before the handler and log out after it.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let tenant = match resolve_tenant(request.headers(), &state.tenants) {
        Ok(tenant) => tenant,
        Err(result) => {
            tracing::warn!(
                system_id = ?request.headers().get(SYSTEM_ID_HEADER),
                "no tenant for request"
            );
            return BisResponse(result).into_response();
        }
    };

    let credentials = Credentials::new(
        header_text(request.headers(), USER_HEADER),
        header_text(request.headers(), PASSWORD_HEADER),
    );

    let session: Arc<dyn EngineSession> = match state
        .engine
        .login(&credentials, &tenant.server_name)
        .await
        .vendor()
    {
        Ok(Ok(session)) => Arc::from(session),
        Ok(Err(code)) => {
            tracing::info!(
                user = credentials.user(),
                system_id = tenant.system_id,
                ?code,
                "engine login refused"
            );
            let result = BisResult::<()>::failure(ErrorType::Unauthorized, messages::LOGIN_FAILED);
            return BisResponse(result).into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    request
        .extensions_mut()
        .insert(CallContext::new(tenant, Arc::clone(&session)));

    let response = next.run(request).await;

    if let Err(e) = session.logout().await {
        tracing::warn!(error = %e, "engine logout failed");
    }
    response
}
