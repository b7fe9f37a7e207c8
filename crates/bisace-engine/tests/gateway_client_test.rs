//! Contract tests for HttpAccessEngine against the engine gateway API.
//!
//! wiremock stands in for the gateway. Every test checks the path, method,
//! session header and body shape the client sends, and how it maps the
//! gateway's answers.

use bisace_engine::{
    AccessEngine, AuthorizationGrant, Credentials, EngineConfig, EngineError, EngineSession,
    GroupKind, HttpAccessEngine, NewCard, PersonRecord, Query, ReturnCode, Table,
};
use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> HttpAccessEngine {
    HttpAccessEngine::new(EngineConfig::local(&server.uri()).unwrap()).unwrap()
}

/// Client with a one second timeout and three retries.
fn retrying_engine(server: &MockServer) -> HttpAccessEngine {
    let mut config = EngineConfig::local(&server.uri()).unwrap();
    config.timeout_secs = 1;
    config.max_retries = 3;
    config.retry_base_delay_ms = 1;
    HttpAccessEngine::new(config).unwrap()
}

async fn requests_to(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .count()
}

/// Mount the login endpoint and open a session with id `S-1`.
async fn session(server: &MockServer) -> Box<dyn EngineSession> {
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "S-1"
        })))
        .mount(server)
        .await;

    engine(server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await
        .unwrap()
}

// ── POST /api/v1/sessions ────────────────────────────────────────────

#[tokio::test]
async fn login_posts_credentials_and_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .and(body_json(serde_json::json!({
            "user": "operator",
            "password": "secret",
            "server": "BIS-SERVER"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "S-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = engine(&server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn login_refusal_maps_to_return_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "API_LOGIN_FAILED_CS"
        })))
        .mount(&server)
        .await;

    let err = engine(&server)
        .login(&Credentials::new("operator", "wrong"), "BIS-SERVER")
        .await
        .err()
        .unwrap();
    assert_eq!(err.return_code(), Some(ReturnCode::LoginFailed));
}

#[tokio::test]
async fn gateway_failure_without_code_is_not_a_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = engine(&server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await
        .err()
        .unwrap();
    match err {
        EngineError::Gateway { status, body, .. } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected Gateway, got: {other:?}"),
    }
}

// ── POST /api/v1/query ───────────────────────────────────────────────

#[tokio::test]
async fn select_posts_rendered_query_with_session_header() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/query"))
        .and(header("x-ace-session", "S-1"))
        .and(body_json(serde_json::json!({
            "columns": "cardid",
            "tables": "bsuser.cards",
            "where": "cardno='000000001234' and status>0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "rows": [{"CARDID": "C7"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = session
        .select(
            &Query::select(Table::Cards, &["cardid"])
                .eq("cardno", "000000001234")
                .gt("status", 0),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("cardid").as_deref(), Some("C7"));
}

// ── /api/v1/cards ────────────────────────────────────────────────────

#[tokio::test]
async fn get_card_deserializes_record() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cards/C7"))
        .and(header("x-ace-session", "S-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cardId": "C7",
            "cardNo": "000000001234",
            "personId": "P1",
            "codeData": "303030303030303031323334",
            "status": 1
        })))
        .mount(&server)
        .await;

    let card = session.get_card("C7").await.unwrap();
    assert_eq!(card.card_no, "000000001234");
    assert_eq!(card.person_id, "P1");
    assert!(card.is_active());
}

#[tokio::test]
async fn get_card_404_is_record_not_found() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/cards/C404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = session.get_card("C404").await.unwrap_err();
    assert_eq!(err.return_code(), Some(ReturnCode::RecordNotFound));
}

#[tokio::test]
async fn add_card_posts_new_card() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/cards"))
        .and(body_json(serde_json::json!({
            "cardNo": "000000000042",
            "personId": "P1",
            "codeData": "303030303030303030303432"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "cardId": "C42",
            "cardNo": "000000000042",
            "personId": "P1",
            "codeData": "303030303030303030303432",
            "status": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let card = session
        .add_card(&NewCard {
            card_no: "000000000042".into(),
            person_id: "P1".into(),
            code_data: "303030303030303030303432".into(),
        })
        .await
        .unwrap();
    assert_eq!(card.card_id, "C42");
}

#[tokio::test]
async fn add_card_duplicate_is_rejected() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/cards"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "API_DUPLICATE_RECORD_CS"
        })))
        .mount(&server)
        .await;

    let err = session
        .add_card(&NewCard {
            card_no: "000000000042".into(),
            person_id: "P1".into(),
            code_data: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.return_code(), Some(ReturnCode::DuplicateRecord));
}

#[tokio::test]
async fn add_card_is_not_resent_after_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "S-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cards"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_delay(Duration::from_millis(1500))
                .set_body_json(serde_json::json!({"cardId": "C42", "status": 1})),
        )
        .mount(&server)
        .await;

    let session = retrying_engine(&server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await
        .unwrap();
    let err = session
        .add_card(&NewCard {
            card_no: "000000000042".into(),
            person_id: "P1".into(),
            code_data: "303030303030303030303432".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Http { .. }), "got: {err:?}");
    assert_eq!(requests_to(&server, "POST", "/api/v1/cards").await, 1);
}

#[tokio::test]
async fn login_is_not_resent_after_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(1500))
                .set_body_json(serde_json::json!({"sessionId": "S-1"})),
        )
        .mount(&server)
        .await;

    let result = retrying_engine(&server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await;

    assert!(matches!(result, Err(EngineError::Http { .. })));
    assert_eq!(requests_to(&server, "POST", "/api/v1/sessions").await, 1);
}

#[tokio::test]
async fn get_card_is_retried_after_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "S-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cards/C7"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;

    let session = retrying_engine(&server)
        .login(&Credentials::new("operator", "secret"), "BIS-SERVER")
        .await
        .unwrap();
    assert!(session.get_card("C7").await.is_err());
    assert_eq!(requests_to(&server, "GET", "/api/v1/cards/C7").await, 4);
}

#[tokio::test]
async fn delete_card_calls_delete() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/cards/C7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    session.delete_card("C7").await.unwrap();
}

// ── /api/v1/persons ──────────────────────────────────────────────────

#[tokio::test]
async fn update_person_puts_record() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/persons/P1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut person = PersonRecord {
        person_id: "P1".into(),
        first_name: "Ada".into(),
        ..PersonRecord::default()
    };
    person.set_custom_field("CardName", "Main badge");
    session.update_person(&person).await.unwrap();
}

#[tokio::test]
async fn update_person_invalid_custom_field() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/persons/P1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "API_PERS_INVALID_CUSTOM_FIELD_NAME"
        })))
        .mount(&server)
        .await;

    let err = session
        .update_person(&PersonRecord {
            person_id: "P1".into(),
            ..PersonRecord::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.return_code(), Some(ReturnCode::InvalidCustomFieldName));
}

#[tokio::test]
async fn set_authorizations_puts_grants() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/persons/P1/authorizations"))
        .and(body_json(serde_json::json!({
            "grants": [{
                "authId": "A1",
                "validFrom": {"day": 1, "month": 2, "year": 2025},
                "validUntil": null
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    session
        .set_authorizations(
            "P1",
            &[AuthorizationGrant {
                auth_id: "A1".into(),
                valid_from: bisace_engine::AceDate::new(1, 2, 2025),
                valid_until: None,
            }],
        )
        .await
        .unwrap();
}

// ── /api/v1/access-groups ────────────────────────────────────────────

#[tokio::test]
async fn list_access_groups_filters_by_kind() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/access-groups"))
        .and(query_param("kind", "lift"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "groups": [{"groupId": "L1", "name": "Tower lifts", "kind": "lift"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let groups = session.list_access_groups(GroupKind::Lift).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Tower lifts");
    assert_eq!(groups[0].kind, GroupKind::Lift);
}

#[tokio::test]
async fn logout_deletes_session() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/sessions"))
        .and(header("x-ace-session", "S-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    session.logout().await.unwrap();
}

#[tokio::test]
async fn malformed_body_is_a_deserialization_error() {
    let server = MockServer::start().await;
    let session = session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/authorizations/A1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = session.get_authorization("A1").await.unwrap_err();
    assert!(matches!(err, EngineError::Deserialization { .. }));
}
