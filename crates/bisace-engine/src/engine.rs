//! Engine and session traits.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::EngineError;
use crate::query::{Query, Row};
use crate::records::{
    AccessGroupRecord, AuthorizationGrant, AuthorizationRecord, CardRecord, GroupKind, NewCard,
    PersonRecord,
};

/// Login credentials taken from a request.
///
/// Custom `Debug` implementation redacts the password.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Entry point to an access engine.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// request handlers behind an `Arc`. The trait is object-safe to support
/// runtime selection between the HTTP gateway and the in-memory engine.
#[async_trait]
pub trait AccessEngine: Send + Sync {
    /// Log in to `server` and open a session.
    ///
    /// A refused login is reported as [`EngineError::Rejected`] with
    /// [`ReturnCode::LoginFailed`](crate::ReturnCode::LoginFailed).
    async fn login(
        &self,
        credentials: &Credentials,
        server: &str,
    ) -> Result<Box<dyn EngineSession>, EngineError>;

    /// Human-readable name of the implementation, for logs.
    fn engine_name(&self) -> &str;
}

/// An authenticated engine session.
///
/// Every method reports vendor refusals as [`EngineError::Rejected`].
#[async_trait]
pub trait EngineSession: Send + Sync {
    /// Run a predicate query.
    async fn select(&self, query: &Query) -> Result<Vec<Row>, EngineError>;

    async fn get_card(&self, card_id: &str) -> Result<CardRecord, EngineError>;

    /// Create a card and return the stored record.
    async fn add_card(&self, card: &NewCard) -> Result<CardRecord, EngineError>;

    async fn update_card(&self, card: &CardRecord) -> Result<(), EngineError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), EngineError>;

    async fn get_person(&self, person_id: &str) -> Result<PersonRecord, EngineError>;

    /// Write a person record, including its custom fields.
    async fn update_person(&self, person: &PersonRecord) -> Result<(), EngineError>;

    /// Replace the authorizations directly assigned to a person.
    async fn set_authorizations(
        &self,
        person_id: &str,
        grants: &[AuthorizationGrant],
    ) -> Result<(), EngineError>;

    async fn get_authorization(&self, auth_id: &str) -> Result<AuthorizationRecord, EngineError>;

    async fn list_access_groups(&self, kind: GroupKind)
        -> Result<Vec<AccessGroupRecord>, EngineError>;

    /// Close the session. Further calls fail with `NotLoggedIn`.
    async fn logout(&self) -> Result<(), EngineError>;
}
