//! # Card API
//!
//! Routes:
//! - GET    /api/GetCard/{cardNumber}: Card with holder and authorizations
//! - POST   /api/AddCard: Create a card for an existing person
//! - PUT    /api/UpdateCard: Rewrite a card and its holder
//! - DELETE /api/DeleteCard/{cardNumber}: Delete a card
//! - GET    /api/GetDoorAccessGroups/{cardNumber}: Card number and card name

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use bisace_core::Card;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::orchestration::cards as orchestrator;
use crate::response::BisResponse;
use crate::session::CallContext;
use crate::state::AppState;

/// Build the cards router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/GetCard/:card_number", get(get_card))
        .route("/api/AddCard", post(add_card))
        .route("/api/UpdateCard", put(update_card))
        .route("/api/DeleteCard/:card_number", delete(delete_card))
        .route("/api/GetDoorAccessGroups/:card_number", get(get_door_access_groups))
}

// ── Lookup ──────────────────────────────────────────────────────────

/// GET /api/GetCard/{cardNumber}: Card with holder and authorizations.
#[utoipa::path(
    get,
    path = "/api/GetCard/{cardNumber}",
    params(("cardNumber" = String, Path, description = "Card number, padded to the configured width")),
    responses(
        (status = 200, description = "Card found", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login or input failure", body = bisace_core::ErrorResponse),
        (status = 404, description = "No active card with this number"),
        (status = 500, description = "Engine unreachable", body = crate::error::ErrorBody),
    ),
    tag = "cards"
)]
pub(crate) async fn get_card(
    ctx: CallContext,
    Path(card_number): Path<String>,
) -> Result<BisResponse<Card>, AppError> {
    let session = ctx.session();
    let options = ctx.card_options();

    let record = match orchestrator::validate_card_exists(session, options, &card_number)
        .await?
        .into_outcome()
    {
        Ok(record) => record,
        Err(failed) => return Ok(failed.cast::<Card>().into()),
    };

    Ok(orchestrator::populate_card(session, options, &record).await?.into())
}

/// GET /api/GetDoorAccessGroups/{cardNumber}: Card number and card name.
#[utoipa::path(
    get,
    path = "/api/GetDoorAccessGroups/{cardNumber}",
    params(("cardNumber" = String, Path, description = "Card number")),
    responses(
        (status = 200, description = "Card number and holder's card name", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login or input failure", body = bisace_core::ErrorResponse),
        (status = 404, description = "Card or holder not found"),
    ),
    tag = "cards"
)]
pub(crate) async fn get_door_access_groups(
    ctx: CallContext,
    Path(card_number): Path<String>,
) -> Result<BisResponse<Card>, AppError> {
    Ok(orchestrator::card_name(ctx.session(), ctx.card_options(), &card_number)
        .await?
        .into())
}

// ── Writes ──────────────────────────────────────────────────────────

/// POST /api/AddCard: Create a card for an existing person.
#[utoipa::path(
    post,
    path = "/api/AddCard",
    request_body = Card,
    responses(
        (status = 200, description = "Card created", body = bisace_core::SuccessResponse),
        (status = 400, description = "Missing fields, duplicate card or refused by the engine", body = bisace_core::ErrorResponse),
        (status = 404, description = "Person not found"),
    ),
    tag = "cards"
)]
pub(crate) async fn add_card(
    ctx: CallContext,
    body: Result<Json<Card>, JsonRejection>,
) -> Result<BisResponse<Card>, AppError> {
    let card = match extract_json(body) {
        Ok(card) => card,
        Err(failed) => return Ok(failed.into()),
    };

    Ok(orchestrator::create_card(ctx.session(), ctx.card_options(), &card)
        .await?
        .into())
}

/// PUT /api/UpdateCard: Rewrite a card and its holder.
#[utoipa::path(
    put,
    path = "/api/UpdateCard",
    request_body = Card,
    responses(
        (status = 200, description = "Card updated", body = bisace_core::SuccessResponse),
        (status = 400, description = "Invalid input or refused by the engine", body = bisace_core::ErrorResponse),
        (status = 404, description = "Card or person not found"),
    ),
    tag = "cards"
)]
pub(crate) async fn update_card(
    ctx: CallContext,
    body: Result<Json<Card>, JsonRejection>,
) -> Result<BisResponse<Card>, AppError> {
    let card = match extract_json(body) {
        Ok(card) => card,
        Err(failed) => return Ok(failed.into()),
    };
    let session = ctx.session();
    let options = ctx.card_options();

    let existing = match orchestrator::validate_card_exists(session, options, &card.card_number)
        .await?
        .into_outcome()
    {
        Ok(record) => record,
        Err(failed) => return Ok(failed.cast::<Card>().into()),
    };

    Ok(orchestrator::update_card(session, options, existing, &card)
        .await?
        .into())
}

/// DELETE /api/DeleteCard/{cardNumber}: Delete a card.
#[utoipa::path(
    delete,
    path = "/api/DeleteCard/{cardNumber}",
    params(("cardNumber" = String, Path, description = "Card number")),
    responses(
        (status = 200, description = "Card deleted", body = bisace_core::SuccessResponse),
        (status = 400, description = "Login or input failure", body = bisace_core::ErrorResponse),
        (status = 404, description = "No active card with this number"),
    ),
    tag = "cards"
)]
pub(crate) async fn delete_card(
    ctx: CallContext,
    Path(card_number): Path<String>,
) -> Result<BisResponse<Card>, AppError> {
    Ok(orchestrator::delete_card(ctx.session(), ctx.card_options(), &card_number)
        .await?
        .into())
}
