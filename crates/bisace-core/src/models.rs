//! # Wire Models
//!
//! Request and response shapes exchanged with API clients. Field names are
//! PascalCase on the wire for compatibility with existing integrations.
//!
//! All fields default when absent so that incomplete request bodies reach
//! the orchestration layer and are rejected with a client-facing message
//! rather than a deserializer error.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A card, together with the person data and authorizations attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct Card {
    /// Card number. Required. Normalized to the configured width on output.
    pub card_number: String,
    /// Identifier of the person holding the card. Required for create.
    pub person_id: String,
    /// Holder's first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_first_name: Option<String>,
    /// Holder's last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_last_name: Option<String>,
    /// Start of the card's validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_start_valid_date: Option<String>,
    /// End of the card's validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_expiry_date: Option<String>,
    /// Authorizations granted to the holder.
    pub authorization_ids: Vec<String>,
    /// Authorization profile assigned to the holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_profile_id: Option<String>,
    /// Display name stored in the holder's custom card name field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
}

/// An access authorization (a set of doors/lifts and time windows).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct Authorization {
    /// Engine identifier of the authorization.
    pub auth_id: String,
    /// Short name.
    pub short_name: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Authorizations held through one active card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct CardAuthorization {
    /// Card number, normalized to the configured width.
    pub card_number: String,
    /// Start of the holder's authorization window.
    pub card_start_valid_date: Option<String>,
    /// End of the holder's authorization window.
    pub card_expiry_date: Option<String>,
    /// Authorizations granted to the holder.
    pub authorizations: Vec<Authorization>,
}

/// Kind of access group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AccessGroupKind {
    /// Group of doors.
    Door,
    /// Group of lift floors.
    Lift,
}

impl AccessGroupKind {
    /// Lowercase name, as used in engine query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Lift => "lift",
        }
    }
}

impl std::fmt::Display for AccessGroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A door or lift access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct AccessGroup {
    /// Engine identifier of the group.
    pub group_id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Door or lift.
    pub kind: AccessGroupKind,
}
