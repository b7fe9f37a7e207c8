//! # Access Group API
//!
//! Routes:
//! - GET /api/DoorAccessGroups: door access groups
//! - GET /api/LiftAccessGroups: lift access groups

use axum::routing::get;
use axum::Router;
use bisace_core::{AccessGroup, AccessGroupKind};

use crate::error::AppError;
use crate::orchestration::access_groups::list_access_groups;
use crate::response::BisResponse;
use crate::session::CallContext;
use crate::state::AppState;

/// Build the access groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/DoorAccessGroups", get(door_access_groups))
        .route("/api/LiftAccessGroups", get(lift_access_groups))
}

/// GET /api/DoorAccessGroups
#[utoipa::path(
    get,
    path = "/api/DoorAccessGroups",
    responses(
        (status = 200, description = "Door access groups sorted by name", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login failure or listing refused", body = bisace_core::ErrorResponse),
    ),
    tag = "access_groups"
)]
pub(crate) async fn door_access_groups(
    ctx: CallContext,
) -> Result<BisResponse<Vec<AccessGroup>>, AppError> {
    Ok(list_access_groups(ctx.session(), AccessGroupKind::Door)
        .await?
        .into())
}

/// GET /api/LiftAccessGroups
#[utoipa::path(
    get,
    path = "/api/LiftAccessGroups",
    responses(
        (status = 200, description = "Lift access groups sorted by name", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login failure or listing refused", body = bisace_core::ErrorResponse),
    ),
    tag = "access_groups"
)]
pub(crate) async fn lift_access_groups(
    ctx: CallContext,
) -> Result<BisResponse<Vec<AccessGroup>>, AppError> {
    Ok(list_access_groups(ctx.session(), AccessGroupKind::Lift)
        .await?
        .into())
}
