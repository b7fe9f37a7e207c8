//! HTTP gateway client for the access engine.
//!
//! ## Gateway API
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api/v1/sessions` | Login |
//! | DELETE | `/api/v1/sessions` | Logout |
//! | POST   | `/api/v1/query` | Predicate query |
//! | GET    | `/api/v1/cards/{id}` | Get card |
//! | POST   | `/api/v1/cards` | Add card |
//! | PUT    | `/api/v1/cards/{id}` | Update card |
//! | DELETE | `/api/v1/cards/{id}` | Delete card |
//! | GET    | `/api/v1/persons/{id}` | Get person |
//! | PUT    | `/api/v1/persons/{id}` | Update person |
//! | PUT    | `/api/v1/persons/{id}/authorizations` | Assign authorizations |
//! | GET    | `/api/v1/authorizations/{id}` | Get authorization |
//! | GET    | `/api/v1/access-groups?kind={door,lift}` | List access groups |
//!
//! Session-scoped calls carry the session id in the `x-ace-session` header.
//! Refusals come back as non-2xx responses with a `{"code": "API_..._CS"}`
//! body and are surfaced as [`EngineError::Rejected`].
//!
//! Transport failures are retried for reads and updates only. Login, add
//! card and delete card are sent once.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::config::{ConfigError, EngineConfig};
use crate::engine::{AccessEngine, Credentials, EngineSession};
use crate::error::{EngineError, ReturnCode};
use crate::query::{Query, Row, SelectRequest};
use crate::records::{
    AccessGroupRecord, AuthorizationGrant, AuthorizationRecord, CardRecord, GroupKind, NewCard,
    PersonRecord,
};
use crate::retry::RetryPolicy;

/// Header carrying the session id on session-scoped calls.
pub const SESSION_HEADER: &str = "x-ace-session";

#[derive(Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    password: &'a str,
    server: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct CodeBody {
    code: ReturnCode,
}

#[derive(Deserialize)]
struct SelectResponse {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Deserialize)]
struct GroupsResponse {
    #[serde(default)]
    groups: Vec<AccessGroupRecord>,
}

#[derive(Serialize)]
struct GrantsRequest<'a> {
    grants: &'a [AuthorizationGrant],
}

#[derive(Debug, Clone)]
struct Gateway {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl Gateway {
    fn url(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ConfigError::InvalidUrl(self.base_url.to_string(), "cannot be a base URL".into())
            })?;
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        Ok(url)
    }

    /// Send a request, retrying transport failures, and turn non-2xx
    /// answers into errors.
    async fn call<F>(&self, operation: &str, endpoint: &str, build: F) -> Result<reqwest::Response, EngineError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let sent = self.retry.send(endpoint, || build().send()).await;
        Self::finish(operation, endpoint, sent).await
    }

    /// Send a request exactly once.
    ///
    /// For calls that change engine state when applied: a timed-out attempt
    /// may already have been applied, so it is not repeated.
    async fn call_once(
        &self,
        operation: &str,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, EngineError> {
        let sent = request.send().await;
        if let Err(e) = &sent {
            tracing::warn!(endpoint, "engine gateway request failed, not retried: {e}");
        }
        Self::finish(operation, endpoint, sent).await
    }

    async fn finish(
        operation: &str,
        endpoint: &str,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, EngineError> {
        let resp = sent.map_err(|e| EngineError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if let Ok(CodeBody { code }) = serde_json::from_str::<CodeBody>(&body) {
            return Err(EngineError::rejected(operation, code));
        }
        match status {
            reqwest::StatusCode::NOT_FOUND => {
                Err(EngineError::rejected(operation, ReturnCode::RecordNotFound))
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                Err(EngineError::rejected(operation, ReturnCode::NotLoggedIn))
            }
            _ => Err(EngineError::Gateway {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn json<T: DeserializeOwned>(resp: reqwest::Response, endpoint: &str) -> Result<T, EngineError> {
        resp.json().await.map_err(|e| EngineError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

/// Access engine reached through its HTTP gateway.
#[derive(Debug, Clone)]
pub struct HttpAccessEngine {
    gateway: Gateway,
}

impl HttpAccessEngine {
    /// Create a client from configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EngineError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            gateway: Gateway {
                http,
                retry: RetryPolicy::from(&config),
                base_url: config.base_url,
            },
        })
    }
}

#[async_trait]
impl AccessEngine for HttpAccessEngine {
    async fn login(
        &self,
        credentials: &Credentials,
        server: &str,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        let endpoint = "POST /sessions";
        let url = self.gateway.url(&["sessions"])?;
        let body = LoginRequest {
            user: credentials.user(),
            password: credentials.password(),
            server,
        };

        let resp = self
            .gateway
            .call_once("login", endpoint, self.gateway.http.post(url).json(&body))
            .await?;
        let login: LoginResponse = Gateway::json(resp, endpoint).await?;

        tracing::debug!(user = credentials.user(), server, "engine session opened");

        Ok(Box::new(HttpSession {
            gateway: self.gateway.clone(),
            session_id: Zeroizing::new(login.session_id),
        }))
    }

    fn engine_name(&self) -> &str {
        "HttpAccessEngine"
    }
}

/// A gateway session.
struct HttpSession {
    gateway: Gateway,
    session_id: Zeroizing<String>,
}

impl HttpSession {
    fn get(&self, url: &Url) -> reqwest::RequestBuilder {
        self.gateway
            .http
            .get(url.clone())
            .header(SESSION_HEADER, self.session_id.as_str())
    }

    fn post(&self, url: &Url) -> reqwest::RequestBuilder {
        self.gateway
            .http
            .post(url.clone())
            .header(SESSION_HEADER, self.session_id.as_str())
    }

    fn put(&self, url: &Url) -> reqwest::RequestBuilder {
        self.gateway
            .http
            .put(url.clone())
            .header(SESSION_HEADER, self.session_id.as_str())
    }

    fn delete(&self, url: &Url) -> reqwest::RequestBuilder {
        self.gateway
            .http
            .delete(url.clone())
            .header(SESSION_HEADER, self.session_id.as_str())
    }
}

#[async_trait]
impl EngineSession for HttpSession {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, EngineError> {
        let endpoint = "POST /query";
        let url = self.gateway.url(&["query"])?;
        let body = SelectRequest::from(query);
        tracing::trace!(columns = %body.columns, tables = %body.tables, predicate = %body.predicate, "engine query");

        let resp = self
            .gateway
            .call("query", endpoint, || self.post(&url).json(&body))
            .await?;
        let rows: SelectResponse = Gateway::json(resp, endpoint).await?;
        Ok(rows.rows)
    }

    async fn get_card(&self, card_id: &str) -> Result<CardRecord, EngineError> {
        let endpoint = format!("GET /cards/{card_id}");
        let url = self.gateway.url(&["cards", card_id])?;
        let resp = self
            .gateway
            .call("get card", &endpoint, || self.get(&url))
            .await?;
        Gateway::json(resp, &endpoint).await
    }

    async fn add_card(&self, card: &NewCard) -> Result<CardRecord, EngineError> {
        let endpoint = "POST /cards";
        let url = self.gateway.url(&["cards"])?;
        let resp = self
            .gateway
            .call_once("add card", endpoint, self.post(&url).json(card))
            .await?;
        Gateway::json(resp, endpoint).await
    }

    async fn update_card(&self, card: &CardRecord) -> Result<(), EngineError> {
        let endpoint = format!("PUT /cards/{}", card.card_id);
        let url = self.gateway.url(&["cards", &card.card_id])?;
        self.gateway
            .call("update card", &endpoint, || self.put(&url).json(card))
            .await?;
        Ok(())
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), EngineError> {
        let endpoint = format!("DELETE /cards/{card_id}");
        let url = self.gateway.url(&["cards", card_id])?;
        self.gateway
            .call_once("delete card", &endpoint, self.delete(&url))
            .await?;
        Ok(())
    }

    async fn get_person(&self, person_id: &str) -> Result<PersonRecord, EngineError> {
        let endpoint = format!("GET /persons/{person_id}");
        let url = self.gateway.url(&["persons", person_id])?;
        let resp = self
            .gateway
            .call("get person", &endpoint, || self.get(&url))
            .await?;
        Gateway::json(resp, &endpoint).await
    }

    async fn update_person(&self, person: &PersonRecord) -> Result<(), EngineError> {
        let endpoint = format!("PUT /persons/{}", person.person_id);
        let url = self.gateway.url(&["persons", &person.person_id])?;
        self.gateway
            .call("update person", &endpoint, || self.put(&url).json(person))
            .await?;
        Ok(())
    }

    async fn set_authorizations(
        &self,
        person_id: &str,
        grants: &[AuthorizationGrant],
    ) -> Result<(), EngineError> {
        let endpoint = format!("PUT /persons/{person_id}/authorizations");
        let url = self.gateway.url(&["persons", person_id, "authorizations"])?;
        let body = GrantsRequest { grants };
        self.gateway
            .call("set authorizations", &endpoint, || self.put(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn get_authorization(&self, auth_id: &str) -> Result<AuthorizationRecord, EngineError> {
        let endpoint = format!("GET /authorizations/{auth_id}");
        let url = self.gateway.url(&["authorizations", auth_id])?;
        let resp = self
            .gateway
            .call("get authorization", &endpoint, || self.get(&url))
            .await?;
        Gateway::json(resp, &endpoint).await
    }

    async fn list_access_groups(
        &self,
        kind: GroupKind,
    ) -> Result<Vec<AccessGroupRecord>, EngineError> {
        let endpoint = format!("GET /access-groups?kind={}", kind.as_str());
        let mut url = self.gateway.url(&["access-groups"])?;
        url.query_pairs_mut().append_pair("kind", kind.as_str());
        let resp = self
            .gateway
            .call("list access groups", &endpoint, || self.get(&url))
            .await?;
        let groups: GroupsResponse = Gateway::json(resp, &endpoint).await?;
        Ok(groups.groups)
    }

    async fn logout(&self) -> Result<(), EngineError> {
        let endpoint = "DELETE /sessions";
        let url = self.gateway.url(&["sessions"])?;
        self.gateway
            .call("logout", endpoint, || self.delete(&url))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(base: &str) -> HttpAccessEngine {
        HttpAccessEngine::new(EngineConfig::local(base).unwrap()).unwrap()
    }

    #[test]
    fn urls_are_built_from_segments() {
        let engine = engine("http://gateway:9000/ace/");
        let url = engine.gateway.url(&["cards", "C 1/2"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway:9000/ace/api/v1/cards/C%201%2F2");
    }

    #[test]
    fn urls_without_base_path() {
        let engine = engine("http://gateway:9000");
        let url = engine.gateway.url(&["sessions"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway:9000/api/v1/sessions");
    }

    #[test]
    fn engine_name() {
        assert_eq!(engine("http://gateway:9000").engine_name(), "HttpAccessEngine");
    }
}
