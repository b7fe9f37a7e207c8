//! # Request Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and pass it through
//! [`extract_json`], so a missing or malformed body answers with the same
//! result envelope as every other client error.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use bisace_core::{messages, BisResult, ErrorType};

/// Extract a JSON body, turning rejections into a failed result.
///
/// ```ignore
/// async fn handler(body: Result<Json<Card>, JsonRejection>) -> ... {
///     let card = match extract_json(body) {
///         Ok(card) => card,
///         Err(failed) => return Ok(failed.into()),
///     };
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, BisResult<T>> {
    result.map(|Json(v)| v).map_err(|err| {
        tracing::debug!(rejection = %err.body_text(), "request body rejected");
        let mut failed = BisResult::failure(
            ErrorType::InvalidInput,
            messages::REQUEST_BODY_MUST_BE_PROVIDED,
        );
        failed.add_error_message(err.body_text());
        failed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use bisace_core::Card;

    async fn extract(body: &'static str, content_type: Option<&str>) -> Result<Card, BisResult<Card>> {
        let mut builder = Request::builder().method("POST").uri("/api/AddCard");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let request = builder.body(Body::from(body)).unwrap();
        extract_json(Json::<Card>::from_request(request, &()).await)
    }

    #[tokio::test]
    async fn valid_body_is_extracted() {
        let card = extract(r#"{"CardNumber":"1234","PersonId":"P1"}"#, Some("application/json"))
            .await
            .unwrap();
        assert_eq!(card.card_number, "1234");
        assert_eq!(card.person_id, "P1");
    }

    #[tokio::test]
    async fn missing_body_is_invalid_input() {
        let failed = extract("", Some("application/json")).await.unwrap_err();
        assert_eq!(failed.error_type(), ErrorType::InvalidInput);
        assert_eq!(failed.error_message(), messages::REQUEST_BODY_MUST_BE_PROVIDED);
        assert_eq!(failed.error_messages().len(), 1);
    }

    #[tokio::test]
    async fn missing_content_type_is_invalid_input() {
        let failed = extract(r#"{"CardNumber":"1"}"#, None).await.unwrap_err();
        assert_eq!(failed.error_type(), ErrorType::InvalidInput);
    }
}
