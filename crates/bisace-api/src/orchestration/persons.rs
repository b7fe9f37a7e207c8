//! Person lookups and the person half of card writes.

use bisace_core::{messages, BisResult, Card, CardOptions, ErrorType};
use bisace_engine::{AceDate, AuthorizationGrant, EngineResultExt, EngineSession, PersonRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::Outcome;

/// Fetch a person by id.
pub async fn get_person(session: &dyn EngineSession, person_id: &str) -> Outcome<PersonRecord> {
    if person_id.trim().is_empty() {
        tracing::debug!("{} [PersonId]", messages::REQUEST_BODY_MUST_BE_PROVIDED);
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::REQUEST_BODY_MUST_BE_PROVIDED,
        ));
    }

    Ok(match session.get_person(person_id).await.vendor()? {
        Ok(person) => BisResult::success(person),
        Err(code) => {
            tracing::debug!(person_id, ?code, "person lookup failed");
            BisResult::failure(ErrorType::NotFound, messages::PERSON_NOT_FOUND)
        }
    })
}

/// Accepted validity date layouts, tried in order after RFC 3339.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Parse a client-supplied validity date. Only the calendar date is kept.
pub fn parse_validity_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        })
}

/// Empty or unparseable means no bound on that side.
fn validity_bound(raw: Option<&str>, side: &str) -> Option<AceDate> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    let bound = parse_validity_date(raw).and_then(|d| AceDate::try_from(d).ok());
    if bound.is_none() {
        tracing::warn!(side, value = raw, "unparseable validity date, assigning without this bound");
    }
    bound
}

/// Copy card holder details onto the person and assign the card's
/// authorizations.
///
/// Names, auth profile and card name are only written when the card
/// carries them. When `AuthorizationIds` is non-empty every id is assigned
/// with the card's validity window.
pub async fn update_person_from_card(
    session: &dyn EngineSession,
    options: &CardOptions,
    card: &Card,
    mut person: PersonRecord,
) -> Outcome<PersonRecord> {
    if let Some(first) = card.person_first_name.as_deref() {
        person.first_name = first.to_string();
    }
    if let Some(last) = card.person_last_name.as_deref() {
        person.last_name = last.to_string();
    }
    if let Some(profile) = card.auth_profile_id.as_deref() {
        person.auth_profile_id = Some(profile.to_string());
    }
    if let Some(name) = card.card_name.as_deref() {
        person.set_custom_field(options.card_name_field.as_str(), name);
    }

    if let Err(code) = session.update_person(&person).await.vendor()? {
        tracing::error!(person_id = %person.person_id, ?code, "{}", messages::LOAD_OR_SAVE_PERSON_FAILED);
        return Ok(BisResult::failure(
            ErrorType::Other,
            messages::LOAD_OR_SAVE_PERSON_FAILED,
        ));
    }

    if !card.authorization_ids.is_empty() {
        let valid_from = validity_bound(card.card_start_valid_date.as_deref(), "start");
        let valid_until = validity_bound(card.card_expiry_date.as_deref(), "expiry");
        let grants: Vec<AuthorizationGrant> = card
            .authorization_ids
            .iter()
            .map(|auth_id| AuthorizationGrant {
                auth_id: auth_id.clone(),
                valid_from,
                valid_until,
            })
            .collect();

        if let Err(code) = session
            .set_authorizations(&person.person_id, &grants)
            .await
            .vendor()?
        {
            tracing::error!(person_id = %person.person_id, ?code, "{}", messages::SET_AUTHORIZATIONS_FAILED);
            return Ok(BisResult::failure(
                ErrorType::Other,
                messages::SET_AUTHORIZATIONS_FAILED,
            ));
        }
    }

    Ok(BisResult::success(person))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::fixtures;
    use bisace_engine::ReturnCode;

    #[test]
    fn parses_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        for raw in [
            "2025-03-14",
            "2025-03-14T08:30:00",
            "2025-03-14T08:30:00+02:00",
            "03/14/2025",
            "14.03.2025",
        ] {
            assert_eq!(parse_validity_date(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_validity_date("next tuesday"), None);
        assert_eq!(parse_validity_date("2025-02-30"), None);
    }

    #[tokio::test]
    async fn get_person_requires_id() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let result = get_person(session.as_ref(), " ").await.unwrap();
        assert_eq!(result.error_type(), ErrorType::InvalidInput);
        assert_eq!(result.error_message(), messages::REQUEST_BODY_MUST_BE_PROVIDED);
    }

    #[tokio::test]
    async fn get_person_not_found() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let result = get_person(session.as_ref(), "P404").await.unwrap();
        assert_eq!(result.error_type(), ErrorType::NotFound);
        assert_eq!(result.error_message(), messages::PERSON_NOT_FOUND);
    }

    #[tokio::test]
    async fn update_writes_names_card_name_and_grants() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let person = engine.person("P1").unwrap();
        let card = Card {
            card_number: "1234".into(),
            person_id: "P1".into(),
            person_first_name: Some("Augusta".into()),
            card_name: Some("Night shift".into()),
            card_start_valid_date: Some("2025-03-01".into()),
            authorization_ids: vec!["A2".into(), "A3".into()],
            ..Card::default()
        };

        let result = update_person_from_card(session.as_ref(), &CardOptions::default(), &card, person)
            .await
            .unwrap();
        assert!(result.is_succeeded());

        let stored = engine.person("P1").unwrap();
        assert_eq!(stored.first_name, "Augusta");
        assert_eq!(stored.last_name, "Lovelace");
        assert_eq!(stored.custom_field("CardName"), Some("Night shift"));

        let grants = engine.grants("P1");
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].valid_from, AceDate::new(1, 3, 2025));
        assert_eq!(grants[0].valid_until, None);
    }

    #[tokio::test]
    async fn update_without_authorization_ids_keeps_grants() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let person = engine.person("P1").unwrap();
        let card = Card {
            person_id: "P1".into(),
            card_start_valid_date: Some("garbage".into()),
            ..Card::default()
        };

        let result = update_person_from_card(session.as_ref(), &CardOptions::default(), &card, person)
            .await
            .unwrap();
        assert!(result.is_succeeded());
        assert_eq!(engine.grants("P1").len(), 1);
    }

    #[tokio::test]
    async fn unparseable_dates_leave_that_bound_open() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let person = engine.person("P1").unwrap();
        let card = Card {
            person_id: "P1".into(),
            person_first_name: Some("Changed".into()),
            card_start_valid_date: Some("2025-03-01".into()),
            card_expiry_date: Some("31/31/2025".into()),
            authorization_ids: vec!["A1".into()],
            ..Card::default()
        };

        let result = update_person_from_card(session.as_ref(), &CardOptions::default(), &card, person)
            .await
            .unwrap();
        assert!(result.is_succeeded());
        assert_eq!(engine.person("P1").unwrap().first_name, "Changed");

        let grants = engine.grants("P1");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].auth_id, "A1");
        assert_eq!(grants[0].valid_from, AceDate::new(1, 3, 2025));
        assert_eq!(grants[0].valid_until, None);
    }

    #[tokio::test]
    async fn update_failure_is_reported() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        engine.fail_next("update person", ReturnCode::NoRights);
        let person = engine.person("P1").unwrap();

        let result = update_person_from_card(
            session.as_ref(),
            &CardOptions::default(),
            &Card::default(),
            person,
        )
        .await
        .unwrap();
        assert_eq!(result.error_type(), ErrorType::Other);
        assert_eq!(result.error_message(), messages::LOAD_OR_SAVE_PERSON_FAILED);
    }

    #[tokio::test]
    async fn unknown_authorization_fails_assignment() {
        let engine = fixtures::engine();
        let session = fixtures::session(&engine).await;
        let person = engine.person("P1").unwrap();
        let card = Card {
            authorization_ids: vec!["A404".into()],
            ..Card::default()
        };

        let result = update_person_from_card(session.as_ref(), &CardOptions::default(), &card, person)
            .await
            .unwrap();
        assert_eq!(result.error_type(), ErrorType::Other);
        assert_eq!(result.error_message(), messages::SET_AUTHORIZATIONS_FAILED);
    }

    #[tokio::test]
    async fn card_name_field_follows_options() {
        let engine = fixtures::engine().with_custom_field("BadgeName");
        let session = fixtures::session(&engine).await;
        let person = engine.person("P1").unwrap();
        let options = CardOptions {
            card_name_field: "BadgeName".into(),
            ..CardOptions::default()
        };
        let card = Card {
            card_name: Some("Visitor".into()),
            ..Card::default()
        };

        let result = update_person_from_card(session.as_ref(), &options, &card, person)
            .await
            .unwrap();
        assert!(result.is_succeeded());
        assert_eq!(engine.person("P1").unwrap().custom_field("BadgeName"), Some("Visitor"));
    }
}
