//! # Card Orchestration
//!
//! Card numbers arrive in whatever form the client sends them and are
//! left-padded with `0` to the tenant's configured width before every
//! lookup. Only active cards (`status > 0`) are visible.
//!
//! | Operation               | Failure                                            |
//! |-------------------------|----------------------------------------------------|
//! | [`validate_card_exists`]| InvalidInput (no number), NotFound                 |
//! | [`populate_card`]       | NotFound (person)                                  |
//! | [`create_card`]         | InvalidInput (missing fields, duplicate, refused)  |
//! | [`update_card`]         | NotFound (new person), Other (refused)             |
//! | [`delete_card`]         | NotFound                                           |
//! | [`card_name`]           | NotFound (card or person)                          |

use bisace_core::{
    card_code_data, messages, pad_card_number, BisResult, Card, CardOptions, ErrorType,
};
use bisace_engine::{CardRecord, EngineError, EngineResultExt, EngineSession, NewCard, Query, Table};

use super::authorizations::{authorizations_for_person, column_values};
use super::persons::{get_person, update_person_from_card};
use super::Outcome;

/// Engine id of the active card with this (already padded) number.
pub async fn card_id(
    session: &dyn EngineSession,
    padded_number: &str,
) -> Result<Option<String>, EngineError> {
    let ids = column_values(
        session,
        &Query::select(Table::Cards, &["cardid"])
            .eq("cardno", padded_number)
            .gt("status", 0),
        "cardid",
    )
    .await?;
    Ok(ids.into_iter().next())
}

/// Look up the active card with this number.
pub async fn validate_card_exists(
    session: &dyn EngineSession,
    options: &CardOptions,
    card_number: &str,
) -> Outcome<CardRecord> {
    if card_number.trim().is_empty() {
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::CARD_NUMBER_MUST_BE_PROVIDED,
        ));
    }

    let padded = pad_card_number(card_number, options.card_number_length);
    let not_found = || -> Outcome<CardRecord> {
        Ok(BisResult::failure(ErrorType::NotFound, messages::CARD_NOT_FOUND))
    };

    let Some(id) = card_id(session, &padded).await? else {
        tracing::debug!(card_number = %padded, "no active card");
        return not_found();
    };

    match session.get_card(&id).await.vendor()? {
        Ok(card) => Ok(BisResult::success(card)),
        Err(code) => {
            tracing::debug!(card_id = %id, ?code, "card fetch failed");
            not_found()
        }
    }
}

/// Build the client view of a card from the card and its holder.
pub async fn populate_card(
    session: &dyn EngineSession,
    options: &CardOptions,
    record: &CardRecord,
) -> Outcome<Card> {
    let person = match get_person(session, &record.person_id).await?.into_outcome() {
        Ok(person) => person,
        Err(failed) => return Ok(failed.cast()),
    };

    let authorization_ids = authorizations_for_person(session, &person.person_id)
        .await?
        .into_iter()
        .map(|a| a.auth_id)
        .collect();

    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    Ok(BisResult::success(Card {
        card_number: pad_card_number(&record.card_no, options.card_number_length),
        person_id: person.person_id.clone(),
        person_first_name: non_empty(&person.first_name),
        person_last_name: non_empty(&person.last_name),
        card_start_valid_date: person.auth_from.map(|d| d.to_string()),
        card_expiry_date: person.auth_until.map(|d| d.to_string()),
        authorization_ids,
        auth_profile_id: person.auth_profile_id.clone(),
        card_name: person
            .custom_field(&options.card_name_field)
            .map(str::to_string),
    }))
}

/// Write the holder details and return the populated view.
async fn finish_write(
    session: &dyn EngineSession,
    options: &CardOptions,
    card: &Card,
    record: &CardRecord,
) -> Outcome<Card> {
    let person = match get_person(session, &record.person_id).await?.into_outcome() {
        Ok(person) => person,
        Err(failed) => return Ok(failed.cast()),
    };

    let updated = update_person_from_card(session, options, card, person).await?;
    if !updated.is_succeeded() {
        return Ok(updated.cast());
    }

    populate_card(session, options, record).await
}

/// Create a card for an existing person.
pub async fn create_card(
    session: &dyn EngineSession,
    options: &CardOptions,
    card: &Card,
) -> Outcome<Card> {
    if card.card_number.trim().is_empty() {
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::CARD_NUMBER_MUST_BE_PROVIDED,
        ));
    }
    if card.person_id.trim().is_empty() {
        tracing::debug!("{} [PersonId]", messages::REQUEST_BODY_MUST_BE_PROVIDED);
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::REQUEST_BODY_MUST_BE_PROVIDED,
        ));
    }

    let padded = pad_card_number(&card.card_number, options.card_number_length);
    if card_id(session, &padded).await?.is_some() {
        tracing::debug!(card_number = %padded, "active card already exists");
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::UNABLE_TO_CREATE_OR_UPDATE_CARD,
        ));
    }

    if let Err(failed) = get_person(session, &card.person_id).await?.into_outcome() {
        return Ok(failed.cast());
    }

    let new_card = NewCard {
        code_data: card_code_data(&padded),
        card_no: padded,
        person_id: card.person_id.trim().to_string(),
    };
    let record = match session.add_card(&new_card).await.vendor()? {
        Ok(record) => record,
        Err(code) => {
            tracing::error!(card_number = %new_card.card_no, ?code, "{}", messages::BIS_API_CALL_FAILED);
            return Ok(BisResult::failure(
                ErrorType::InvalidInput,
                messages::BIS_API_CALL_FAILED,
            ));
        }
    };
    tracing::info!(card_id = %record.card_id, card_number = %record.card_no, "card created");

    finish_write(session, options, card, &record).await
}

/// Rewrite an existing card and its holder from the request.
///
/// `existing` comes from [`validate_card_exists`]. A `PersonId` different
/// from the current holder moves the card to that person.
pub async fn update_card(
    session: &dyn EngineSession,
    options: &CardOptions,
    mut existing: CardRecord,
    card: &Card,
) -> Outcome<Card> {
    let padded = pad_card_number(&existing.card_no, options.card_number_length);
    existing.code_data = card_code_data(&padded);
    existing.card_no = padded;

    let new_holder = card.person_id.trim();
    if !new_holder.is_empty() && new_holder != existing.person_id {
        if let Err(failed) = get_person(session, new_holder).await?.into_outcome() {
            return Ok(failed.cast());
        }
        tracing::debug!(card_id = %existing.card_id, from = %existing.person_id, to = new_holder, "card changes holder");
        existing.person_id = new_holder.to_string();
    }

    if let Err(code) = session.update_card(&existing).await.vendor()? {
        tracing::error!(card_id = %existing.card_id, ?code, "{}", messages::UNABLE_TO_CREATE_OR_UPDATE_CARD);
        return Ok(BisResult::failure(
            ErrorType::Other,
            messages::UNABLE_TO_CREATE_OR_UPDATE_CARD,
        ));
    }

    finish_write(session, options, card, &existing).await
}

/// Delete the active card with this number.
pub async fn delete_card(
    session: &dyn EngineSession,
    options: &CardOptions,
    card_number: &str,
) -> Outcome<Card> {
    let existing = match validate_card_exists(session, options, card_number)
        .await?
        .into_outcome()
    {
        Ok(record) => record,
        Err(failed) => return Ok(failed.cast()),
    };

    if let Err(code) = session.delete_card(&existing.card_id).await.vendor()? {
        tracing::debug!(card_id = %existing.card_id, ?code, "card delete refused");
        return Ok(BisResult::failure(ErrorType::NotFound, messages::CARD_NOT_FOUND));
    }
    tracing::info!(card_id = %existing.card_id, card_number = %existing.card_no, "card deleted");

    Ok(BisResult::success(Card {
        card_number: pad_card_number(&existing.card_no, options.card_number_length),
        person_id: existing.person_id,
        ..Card::default()
    }))
}

/// The card number and holder's card name, nothing else.
pub async fn card_name(
    session: &dyn EngineSession,
    options: &CardOptions,
    card_number: &str,
) -> Outcome<Card> {
    if card_number.trim().is_empty() {
        return Ok(BisResult::failure(
            ErrorType::InvalidInput,
            messages::REQUEST_BODY_MUST_BE_PROVIDED,
        ));
    }

    let record = match validate_card_exists(session, options, card_number)
        .await?
        .into_outcome()
    {
        Ok(record) => record,
        Err(failed) => return Ok(failed.cast()),
    };

    let person = match session.get_person(&record.person_id).await.vendor()? {
        Ok(person) => person,
        Err(_) => return Ok(BisResult::failure(ErrorType::NotFound, messages::PERSON_NOT_FOUND)),
    };

    Ok(BisResult::success(Card {
        card_number: pad_card_number(&record.card_no, options.card_number_length),
        card_name: person
            .custom_field(&options.card_name_field)
            .map(str::to_string),
        ..Card::default()
    }))
}
