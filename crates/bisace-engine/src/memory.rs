//! # In-Memory Access Engine
//!
//! A complete engine held in process memory. Used for local development
//! (`BISACE_ENGINE=memory`) and as the backing engine of the API test
//! suites.
//!
//! ## Behaviour
//!
//! - Login succeeds only for registered accounts. When a server name has
//!   been pinned with [`InMemoryAccessEngine::with_server`], it must match.
//! - Queries evaluate [`Query`] conditions against the tables listed in
//!   [`Table`].
//! - Person updates reject custom fields outside the registered set
//!   (`CardName` by default) with `InvalidCustomFieldName`.
//! - [`InMemoryAccessEngine::fail_next`] makes the next call of a named
//!   operation return a chosen code, for exercising error paths.
//!   [`InMemoryAccessEngine::outage_next`] makes it fail the way an
//!   unreachable gateway does.
//!
//! ## Concurrency
//!
//! State lives behind `Arc<Inner>` with `parking_lot` locks; clones share
//! it. Locks are never held across `.await` points.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::engine::{AccessEngine, Credentials, EngineSession};
use crate::error::{EngineError, ReturnCode};
use crate::query::{Query, Row, Table};
use crate::records::{
    AccessGroupRecord, AuthorizationGrant, AuthorizationRecord, CardRecord, GroupKind, NewCard,
    PersonRecord,
};

#[derive(Debug, Default)]
struct Directory {
    cards: BTreeMap<String, CardRecord>,
    persons: BTreeMap<String, PersonRecord>,
    grants: BTreeMap<String, Vec<AuthorizationGrant>>,
    profiles: BTreeMap<String, Vec<String>>,
    authorizations: BTreeMap<String, AuthorizationRecord>,
    groups: Vec<AccessGroupRecord>,
}

impl Directory {
    fn rows(&self, table: Table) -> Vec<Row> {
        match table {
            Table::Cards => self
                .cards
                .values()
                .map(|c| {
                    Row::from_pairs([
                        ("cardid", serde_json::json!(c.card_id)),
                        ("cardno", serde_json::json!(c.card_no)),
                        ("persid", serde_json::json!(c.person_id)),
                        ("codedata", serde_json::json!(c.code_data)),
                        ("status", serde_json::json!(c.status)),
                    ])
                })
                .collect(),
            Table::Persons => self
                .persons
                .values()
                .map(|p| {
                    Row::from_pairs([
                        ("persid", serde_json::json!(p.person_id)),
                        ("firstname", serde_json::json!(p.first_name)),
                        ("lastname", serde_json::json!(p.last_name)),
                        ("authprofileid", serde_json::json!(p.auth_profile_id)),
                    ])
                })
                .collect(),
            Table::AuthPerPerson => self
                .grants
                .iter()
                .flat_map(|(person_id, grants)| {
                    grants.iter().map(move |g| {
                        Row::from_pairs([
                            ("persid", serde_json::json!(person_id)),
                            ("authid", serde_json::json!(g.auth_id)),
                        ])
                    })
                })
                .collect(),
            Table::AuthPerProfile => self
                .profiles
                .iter()
                .flat_map(|(profile_id, auth_ids)| {
                    auth_ids.iter().map(move |a| {
                        Row::from_pairs([
                            ("profileid", serde_json::json!(profile_id)),
                            ("authid", serde_json::json!(a)),
                        ])
                    })
                })
                .collect(),
            Table::Authorizations => self
                .authorizations
                .values()
                .map(|a| {
                    Row::from_pairs([
                        ("authid", serde_json::json!(a.auth_id)),
                        ("shortname", serde_json::json!(a.short_name)),
                        ("name", serde_json::json!(a.name)),
                    ])
                })
                .collect(),
        }
    }
}

/// A failure queued for the next call of an operation.
#[derive(Debug, Clone)]
enum Injected {
    Refusal(ReturnCode),
    Outage { status: u16, body: String },
}

#[derive(Debug)]
struct Inner {
    directory: RwLock<Directory>,
    accounts: RwLock<HashMap<String, String>>,
    server: RwLock<Option<String>>,
    custom_fields: RwLock<BTreeSet<String>>,
    failures: Mutex<HashMap<String, Injected>>,
    next_card: AtomicU64,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            accounts: RwLock::new(HashMap::new()),
            server: RwLock::new(None),
            custom_fields: RwLock::new(BTreeSet::from(["CardName".to_string()])),
            failures: Mutex::new(HashMap::new()),
            next_card: AtomicU64::new(1),
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        }
    }
}

impl Inner {
    /// Consume an injected failure for `operation`, if any.
    fn injected(&self, operation: &str) -> Result<(), EngineError> {
        match self.failures.lock().remove(operation) {
            Some(Injected::Refusal(code)) => Err(EngineError::rejected(operation, code)),
            Some(Injected::Outage { status, body }) => Err(EngineError::Gateway {
                endpoint: operation.to_string(),
                status,
                body,
            }),
            None => Ok(()),
        }
    }
}

/// Access engine backed by in-process state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessEngine {
    inner: Arc<Inner>,
}

impl InMemoryAccessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account that may log in.
    pub fn with_account(self, user: &str, password: &str) -> Self {
        self.inner
            .accounts
            .write()
            .insert(user.to_string(), password.to_string());
        self
    }

    /// Require logins to name this server.
    pub fn with_server(self, server: &str) -> Self {
        *self.inner.server.write() = Some(server.to_string());
        self
    }

    /// Allow an additional person custom field name.
    pub fn with_custom_field(self, name: &str) -> Self {
        self.inner.custom_fields.write().insert(name.to_string());
        self
    }

    pub fn insert_person(&self, person: PersonRecord) {
        self.inner
            .directory
            .write()
            .persons
            .insert(person.person_id.clone(), person);
    }

    pub fn insert_card(&self, card: CardRecord) {
        self.inner
            .directory
            .write()
            .cards
            .insert(card.card_id.clone(), card);
    }

    pub fn insert_authorization(&self, authorization: AuthorizationRecord) {
        self.inner
            .directory
            .write()
            .authorizations
            .insert(authorization.auth_id.clone(), authorization);
    }

    /// Define the authorizations granted through a profile.
    pub fn insert_profile(&self, profile_id: &str, auth_ids: &[&str]) {
        self.inner.directory.write().profiles.insert(
            profile_id.to_string(),
            auth_ids.iter().map(|a| a.to_string()).collect(),
        );
    }

    /// Assign authorizations directly to a person.
    pub fn insert_grants(&self, person_id: &str, grants: Vec<AuthorizationGrant>) {
        self.inner
            .directory
            .write()
            .grants
            .insert(person_id.to_string(), grants);
    }

    pub fn insert_access_group(&self, group: AccessGroupRecord) {
        self.inner.directory.write().groups.push(group);
    }

    /// Make the next call of `operation` (e.g. `"update person"`) fail with `code`.
    pub fn fail_next(&self, operation: &str, code: ReturnCode) {
        self.inner
            .failures
            .lock()
            .insert(operation.to_string(), Injected::Refusal(code));
    }

    /// Make the next call of `operation` fail as a gateway answering
    /// `status` with `body` and no return code.
    pub fn outage_next(&self, operation: &str, status: u16, body: &str) {
        self.inner.failures.lock().insert(
            operation.to_string(),
            Injected::Outage {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn card(&self, card_id: &str) -> Option<CardRecord> {
        self.inner.directory.read().cards.get(card_id).cloned()
    }

    pub fn cards(&self) -> Vec<CardRecord> {
        self.inner.directory.read().cards.values().cloned().collect()
    }

    pub fn person(&self, person_id: &str) -> Option<PersonRecord> {
        self.inner.directory.read().persons.get(person_id).cloned()
    }

    pub fn grants(&self, person_id: &str) -> Vec<AuthorizationGrant> {
        self.inner
            .directory
            .read()
            .grants
            .get(person_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful logins so far.
    pub fn login_count(&self) -> usize {
        self.inner.logins.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far.
    pub fn logout_count(&self) -> usize {
        self.inner.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessEngine for InMemoryAccessEngine {
    async fn login(
        &self,
        credentials: &Credentials,
        server: &str,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        self.inner.injected("login")?;

        let known = self
            .inner
            .accounts
            .read()
            .get(credentials.user())
            .is_some_and(|p| p == credentials.password());
        let server_ok = self
            .inner
            .server
            .read()
            .as_deref()
            .map_or(true, |expected| expected.eq_ignore_ascii_case(server));

        if !known || !server_ok {
            return Err(EngineError::rejected("login", ReturnCode::LoginFailed));
        }

        self.inner.logins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemorySession {
            inner: Arc::clone(&self.inner),
            open: AtomicBool::new(true),
        }))
    }

    fn engine_name(&self) -> &str {
        "InMemoryAccessEngine"
    }
}

struct InMemorySession {
    inner: Arc<Inner>,
    open: AtomicBool,
}

impl InMemorySession {
    fn check(&self, operation: &str) -> Result<(), EngineError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(EngineError::rejected(operation, ReturnCode::NotLoggedIn));
        }
        self.inner.injected(operation)
    }
}

fn not_found(operation: &str) -> EngineError {
    EngineError::rejected(operation, ReturnCode::RecordNotFound)
}

#[async_trait]
impl EngineSession for InMemorySession {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, EngineError> {
        self.check("query")?;
        let directory = self.inner.directory.read();
        Ok(directory
            .rows(query.table)
            .iter()
            .filter(|row| query.matches(row))
            .map(|row| query.project(row))
            .collect())
    }

    async fn get_card(&self, card_id: &str) -> Result<CardRecord, EngineError> {
        self.check("get card")?;
        self.inner
            .directory
            .read()
            .cards
            .get(card_id)
            .cloned()
            .ok_or_else(|| not_found("get card"))
    }

    async fn add_card(&self, card: &NewCard) -> Result<CardRecord, EngineError> {
        self.check("add card")?;
        let mut directory = self.inner.directory.write();

        if !directory.persons.contains_key(&card.person_id) {
            return Err(EngineError::rejected("add card", ReturnCode::InvalidParameter));
        }
        if directory
            .cards
            .values()
            .any(|c| c.is_active() && c.card_no == card.card_no)
        {
            return Err(EngineError::rejected("add card", ReturnCode::DuplicateRecord));
        }

        let id = self.inner.next_card.fetch_add(1, Ordering::SeqCst);
        let record = CardRecord {
            card_id: format!("C{id:015}"),
            card_no: card.card_no.clone(),
            person_id: card.person_id.clone(),
            code_data: card.code_data.clone(),
            status: 1,
        };
        directory.cards.insert(record.card_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_card(&self, card: &CardRecord) -> Result<(), EngineError> {
        self.check("update card")?;
        let mut directory = self.inner.directory.write();
        if !directory.persons.contains_key(&card.person_id) {
            return Err(EngineError::rejected("update card", ReturnCode::InvalidParameter));
        }
        match directory.cards.get_mut(&card.card_id) {
            Some(existing) => {
                *existing = card.clone();
                Ok(())
            }
            None => Err(not_found("update card")),
        }
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), EngineError> {
        self.check("delete card")?;
        self.inner
            .directory
            .write()
            .cards
            .remove(card_id)
            .map(|_| ())
            .ok_or_else(|| not_found("delete card"))
    }

    async fn get_person(&self, person_id: &str) -> Result<PersonRecord, EngineError> {
        self.check("get person")?;
        self.inner
            .directory
            .read()
            .persons
            .get(person_id)
            .cloned()
            .ok_or_else(|| not_found("get person"))
    }

    async fn update_person(&self, person: &PersonRecord) -> Result<(), EngineError> {
        self.check("update person")?;
        {
            let allowed = self.inner.custom_fields.read();
            if person.custom_fields.keys().any(|k| !allowed.contains(k)) {
                return Err(EngineError::rejected(
                    "update person",
                    ReturnCode::InvalidCustomFieldName,
                ));
            }
        }
        let mut directory = self.inner.directory.write();
        match directory.persons.get_mut(&person.person_id) {
            Some(existing) => {
                *existing = person.clone();
                Ok(())
            }
            None => Err(not_found("update person")),
        }
    }

    async fn set_authorizations(
        &self,
        person_id: &str,
        grants: &[AuthorizationGrant],
    ) -> Result<(), EngineError> {
        self.check("set authorizations")?;
        let mut directory = self.inner.directory.write();
        if !directory.persons.contains_key(person_id) {
            return Err(not_found("set authorizations"));
        }
        if grants
            .iter()
            .any(|g| !directory.authorizations.contains_key(&g.auth_id))
        {
            return Err(EngineError::rejected(
                "set authorizations",
                ReturnCode::InvalidParameter,
            ));
        }
        directory
            .grants
            .insert(person_id.to_string(), grants.to_vec());
        Ok(())
    }

    async fn get_authorization(&self, auth_id: &str) -> Result<AuthorizationRecord, EngineError> {
        self.check("get authorization")?;
        self.inner
            .directory
            .read()
            .authorizations
            .get(auth_id)
            .cloned()
            .ok_or_else(|| not_found("get authorization"))
    }

    async fn list_access_groups(
        &self,
        kind: GroupKind,
    ) -> Result<Vec<AccessGroupRecord>, EngineError> {
        self.check("list access groups")?;
        Ok(self
            .inner
            .directory
            .read()
            .groups
            .iter()
            .filter(|g| g.kind == kind)
            .cloned()
            .collect())
    }

    async fn logout(&self) -> Result<(), EngineError> {
        if self.open.swap(false, Ordering::SeqCst) {
            self.inner.logouts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
