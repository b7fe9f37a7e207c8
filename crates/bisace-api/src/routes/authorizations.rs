//! # Authorization API
//!
//! Routes:
//! - GET /api/GetAuthorizations: every active card with its holder's
//!   validity window and authorizations

use axum::routing::get;
use axum::Router;
use bisace_core::CardAuthorization;

use crate::error::AppError;
use crate::orchestration::authorizations::authorizations_for_active_cards;
use crate::response::BisResponse;
use crate::session::CallContext;
use crate::state::AppState;

/// Build the authorizations router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/GetAuthorizations", get(get_authorizations))
}

/// GET /api/GetAuthorizations: authorizations of every active card.
#[utoipa::path(
    get,
    path = "/api/GetAuthorizations",
    responses(
        (status = 200, description = "One entry per active card", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login failure or holder could not be loaded", body = bisace_core::ErrorResponse),
        (status = 404, description = "An active card disappeared while listing"),
    ),
    tag = "authorizations"
)]
pub(crate) async fn get_authorizations(
    ctx: CallContext,
) -> Result<BisResponse<Vec<CardAuthorization>>, AppError> {
    Ok(authorizations_for_active_cards(ctx.session(), ctx.card_options())
        .await?
        .into())
}
