//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented handlers into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// OpenAPI document for the whole `/api` surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BIS ACE Access-Control API",
        version = "0.1.0",
        description = "Cards, card holders, authorizations and access groups of a BIS ACE access-control engine. Every /api call authenticates with the `user` and `password` headers; `system-id` selects the tenant."
    ),
    paths(
        // Cards
        crate::routes::cards::get_card,
        crate::routes::cards::add_card,
        crate::routes::cards::update_card,
        crate::routes::cards::delete_card,
        crate::routes::cards::get_door_access_groups,
        // Authorizations
        crate::routes::authorizations::get_authorizations,
        // Access groups
        crate::routes::access_groups::door_access_groups,
        crate::routes::access_groups::lift_access_groups,
    ),
    components(schemas(
        bisace_core::Card,
        bisace_core::Authorization,
        bisace_core::CardAuthorization,
        bisace_core::AccessGroup,
        bisace_core::AccessGroupKind,
        bisace_core::ErrorType,
        bisace_core::ErrorResponse,
        bisace_core::SuccessResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "cards", description = "Card lookup and maintenance"),
        (name = "authorizations", description = "Authorizations of active cards"),
        (name = "access_groups", description = "Door and lift access groups"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_api_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/GetCard/{cardNumber}",
            "/api/AddCard",
            "/api/UpdateCard",
            "/api/DeleteCard/{cardNumber}",
            "/api/GetAuthorizations",
            "/api/GetDoorAccessGroups/{cardNumber}",
            "/api/DoorAccessGroups",
            "/api/LiftAccessGroups",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn registers_wire_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        for name in ["Card", "CardAuthorization", "AccessGroup", "ErrorResponse", "ErrorType"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
