//! Authorization lookups.
//!
//! A person's authorizations come from their authorization profile when
//! they have one, otherwise from the authorizations assigned to them
//! directly. Ids the engine cannot resolve are dropped.

use bisace_core::{
    messages, pad_card_number, Authorization, BisResult, CardAuthorization, CardOptions, ErrorType,
};
use bisace_engine::{
    AuthorizationRecord, EngineError, EngineResultExt, EngineSession, Query, Row, Table,
};

use super::persons::get_person;
use super::Outcome;

/// Values of `column` in the rows of `query`. A refused query yields none.
pub(crate) async fn column_values(
    session: &dyn EngineSession,
    query: &Query,
    column: &str,
) -> Result<Vec<String>, EngineError> {
    Ok(match session.select(query).await.vendor()? {
        Ok(rows) => rows.iter().filter_map(|row: &Row| row.get(column)).collect(),
        Err(code) => {
            tracing::debug!(table = query.table.name(), ?code, "engine query refused");
            Vec::new()
        }
    })
}

async fn ids_via_profile(
    session: &dyn EngineSession,
    person_id: &str,
) -> Result<Vec<String>, EngineError> {
    let profiles = column_values(
        session,
        &Query::select(Table::Persons, &["authprofileid"]).eq("persid", person_id),
        "authprofileid",
    )
    .await?;

    let Some(profile_id) = profiles.into_iter().find(|p| !p.is_empty()) else {
        return Ok(Vec::new());
    };

    column_values(
        session,
        &Query::select(Table::AuthPerProfile, &["authid"]).eq("profileid", profile_id),
        "authid",
    )
    .await
}

async fn ids_per_person(
    session: &dyn EngineSession,
    person_id: &str,
) -> Result<Vec<String>, EngineError> {
    column_values(
        session,
        &Query::select(Table::AuthPerPerson, &["authid"]).eq("persid", person_id),
        "authid",
    )
    .await
}

async fn fetch_all(
    session: &dyn EngineSession,
    ids: &[String],
) -> Result<Vec<AuthorizationRecord>, EngineError> {
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        match session.get_authorization(id).await.vendor()? {
            Ok(record) => found.push(record),
            Err(code) => tracing::debug!(auth_id = %id, ?code, "authorization skipped"),
        }
    }
    Ok(found)
}

/// Authorizations of a person, via profile first and direct assignment
/// second.
pub async fn authorizations_for_person(
    session: &dyn EngineSession,
    person_id: &str,
) -> Result<Vec<AuthorizationRecord>, EngineError> {
    let via_profile = fetch_all(session, &ids_via_profile(session, person_id).await?).await?;
    if !via_profile.is_empty() {
        return Ok(via_profile);
    }
    fetch_all(session, &ids_per_person(session, person_id).await?).await
}

fn to_wire(record: AuthorizationRecord) -> Authorization {
    Authorization {
        auth_id: record.auth_id,
        short_name: record.short_name,
        name: record.name,
        description: record.description,
    }
}

/// One entry per active card with its holder's window and authorizations.
pub async fn authorizations_for_active_cards(
    session: &dyn EngineSession,
    options: &CardOptions,
) -> Outcome<Vec<CardAuthorization>> {
    let card_ids = column_values(
        session,
        &Query::select(Table::Cards, &["cardid", "persid"]).gt("status", 0),
        "cardid",
    )
    .await?;

    let mut entries = Vec::with_capacity(card_ids.len());
    for card_id in &card_ids {
        let card = match session.get_card(card_id).await.vendor()? {
            Ok(card) => card,
            Err(code) => {
                tracing::debug!(card_id = %card_id, ?code, "active card vanished");
                return Ok(BisResult::failure(ErrorType::NotFound, messages::CARD_NOT_FOUND));
            }
        };

        let person = match get_person(session, &card.person_id).await?.into_outcome() {
            Ok(person) => person,
            Err(_) => {
                tracing::error!(card_id = %card_id, person_id = %card.person_id, "{}", messages::LOAD_OR_SAVE_PERSON_FAILED);
                return Ok(BisResult::failure(
                    ErrorType::Other,
                    messages::LOAD_OR_SAVE_PERSON_FAILED,
                ));
            }
        };

        let authorizations = authorizations_for_person(session, &person.person_id)
            .await?
            .into_iter()
            .map(to_wire)
            .collect();

        entries.push(CardAuthorization {
            card_number: pad_card_number(&card.card_no, options.card_number_length),
            card_start_valid_date: person.auth_from.map(|d| d.to_string()),
            card_expiry_date: person.auth_until.map(|d| d.to_string()),
            authorizations,
        });
    }

    Ok(BisResult::success(entries))
}
