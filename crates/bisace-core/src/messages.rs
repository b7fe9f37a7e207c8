//! Client-facing error messages.
//!
//! These strings are part of the API contract: existing integrations match
//! on them, so they must not be reworded.

/// The request carried no body, or a required identifier was empty.
pub const REQUEST_BODY_MUST_BE_PROVIDED: &str = "Request body must be provided!";

/// A card operation was requested without a card number.
pub const CARD_NUMBER_MUST_BE_PROVIDED: &str = "Card Number must be provided!";

/// The access engine rejected a record creation.
pub const BIS_API_CALL_FAILED: &str = "Failed to call BIS API.";

/// A person record could not be read or written.
pub const LOAD_OR_SAVE_PERSON_FAILED: &str = "Failed to load or save PERSON.";

/// A card record could not be created or updated.
pub const UNABLE_TO_CREATE_OR_UPDATE_CARD: &str = "Unable to create or update card.";

/// Login against the access engine failed.
pub const LOGIN_FAILED: &str = "Failed to login.";

/// No active card matches the requested number.
pub const CARD_NOT_FOUND: &str = "Card can not be found.";

/// No person matches the requested identifier.
pub const PERSON_NOT_FOUND: &str = "Person can not be found.";

/// Authorization assignment on a person failed.
pub const SET_AUTHORIZATIONS_FAILED: &str = "Failed to set person authorizations.";

/// The request addressed a tenant that is not configured.
pub const NO_CALL_CONTEXT: &str = "No Call Context Was Found For This Environment";
