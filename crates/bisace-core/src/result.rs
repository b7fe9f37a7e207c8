//! # Result Aggregation
//!
//! [`BisResult`] is the mutable holder threaded through every orchestration
//! step. It carries an [`ErrorType`], a primary error message, any number of
//! secondary messages, and at most one attached resource. Each step either
//! attaches its resource or records a failure; callers merge the results of
//! sub-steps with [`BisResult::merge`].
//!
//! A result is successful only when nothing was recorded: the type is
//! [`ErrorType::None`] and both message slots are empty.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error_type::ErrorType;

/// Uniform success/error/resource container.
#[derive(Debug, Clone, PartialEq)]
pub struct BisResult<T> {
    error_type: ErrorType,
    error_message: String,
    error_messages: Vec<String>,
    resource: Option<T>,
}

impl<T> Default for BisResult<T> {
    fn default() -> Self {
        Self {
            error_type: ErrorType::None,
            error_message: String::new(),
            error_messages: Vec::new(),
            resource: None,
        }
    }
}

impl<T> BisResult<T> {
    /// Create an empty, successful result with no resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a successful result carrying `resource`.
    pub fn success(resource: T) -> Self {
        Self {
            resource: Some(resource),
            ..Self::default()
        }
    }

    /// Create a failed result with the given classification and primary message.
    pub fn failure(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            error_message: message.into(),
            ..Self::default()
        }
    }

    /// Whether no error has been recorded.
    pub fn is_succeeded(&self) -> bool {
        self.error_type == ErrorType::None
            && self.error_message.is_empty()
            && self.error_messages.is_empty()
    }

    /// The recorded classification.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Overwrite the classification.
    pub fn set_error_type(&mut self, error_type: ErrorType) {
        self.error_type = error_type;
    }

    /// The primary error message (empty when none was recorded).
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Overwrite the primary error message.
    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = message.into();
    }

    /// Record a failure, overwriting classification and primary message.
    pub fn fail(&mut self, error_type: ErrorType, message: impl Into<String>) {
        self.error_type = error_type;
        self.error_message = message.into();
    }

    /// Secondary error messages, in the order they were added.
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    /// Append a secondary message. Empty messages are ignored.
    pub fn add_error_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() {
            self.error_messages.push(message);
        }
    }

    /// Append several secondary messages, skipping empty ones.
    pub fn add_error_messages<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.add_error_message(message);
        }
    }

    /// Join `parts` with single spaces and append the result as one message.
    pub fn add_compound_error_message(&mut self, parts: &[&str]) {
        self.add_error_message(parts.join(" "));
    }

    /// Fold `other` into this result.
    ///
    /// - The classification is taken from `other` only if this one is `None`.
    /// - If this primary message is empty it is replaced by `other`'s;
    ///   otherwise `other`'s primary message becomes a secondary message.
    /// - `other`'s secondary messages are appended.
    /// - `other`'s resource, when present, replaces this one.
    pub fn merge(&mut self, other: BisResult<T>) {
        if self.error_type == ErrorType::None {
            self.error_type = other.error_type;
        }

        if self.error_message.is_empty() {
            self.error_message = other.error_message;
        } else {
            self.add_error_message(other.error_message);
        }

        self.add_error_messages(other.error_messages);

        if other.resource.is_some() {
            self.resource = other.resource;
        }
    }

    /// Attach a resource, replacing any existing one.
    pub fn set_resource(&mut self, resource: T) {
        self.resource = Some(resource);
    }

    /// Borrow the attached resource.
    pub fn resource(&self) -> Option<&T> {
        self.resource.as_ref()
    }

    /// Consume the result and return its resource.
    pub fn into_resource(self) -> Option<T> {
        self.resource
    }

    /// Carry the error state into a result for a different resource type.
    ///
    /// The resource is dropped. Used to propagate a failed sub-step out of
    /// an operation that produces a different kind of resource.
    pub fn cast<U>(self) -> BisResult<U> {
        BisResult {
            error_type: self.error_type,
            error_message: self.error_message,
            error_messages: self.error_messages,
            resource: None,
        }
    }

    /// Transform the attached resource, keeping the error state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BisResult<U> {
        BisResult {
            error_type: self.error_type,
            error_message: self.error_message,
            error_messages: self.error_messages,
            resource: self.resource.map(f),
        }
    }

    /// Split a successful result into its resource, or hand back the failure.
    ///
    /// A successful result without a resource is treated as a failure with
    /// classification `Other`.
    pub fn into_outcome(self) -> Result<T, BisResult<T>> {
        if !self.is_succeeded() {
            return Err(self);
        }
        match self.resource {
            Some(resource) => Ok(resource),
            None => Err(BisResult::failure(ErrorType::Other, "")),
        }
    }
}

impl<T: Serialize> BisResult<T> {
    /// Build the error body for a failed result. Returns `None` on success.
    ///
    /// A failed result that still reports `ErrorType::None` (a message was
    /// added without a classification) is reported as `Other`.
    pub fn error_response(&self) -> Option<ErrorResponse> {
        if self.is_succeeded() {
            return None;
        }

        let error_type = match self.error_type {
            ErrorType::None => ErrorType::Other,
            other => other,
        };

        Some(ErrorResponse {
            is_succeeded: false,
            error: error_type.description().to_string(),
            error_description: (!self.error_message.is_empty())
                .then(|| self.error_message.clone()),
            model: self
                .resource
                .as_ref()
                .and_then(|r| serde_json::to_value(r).ok()),
        })
    }

    /// Build the success envelope written for a successful result.
    pub fn success_body(&self) -> SuccessResponse {
        SuccessResponse {
            is_succeeded: true,
            error_type: ErrorType::None,
            error_message: None,
            model: self
                .resource
                .as_ref()
                .and_then(|r| serde_json::to_value(r).ok()),
        }
    }
}

/// JSON body written for a failed result (other than not-found).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Always `false`.
    pub is_succeeded: bool,
    /// Description of the [`ErrorType`], e.g. `"InvalidInput"`.
    pub error: String,
    /// The primary error message, if one was recorded.
    pub error_description: Option<String>,
    /// The resource attached to the failed result, if any.
    #[schema(value_type = Option<Object>)]
    pub model: Option<serde_json::Value>,
}

/// JSON body written for a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct SuccessResponse {
    /// Always `true`.
    pub is_succeeded: bool,
    /// Always [`ErrorType::None`].
    pub error_type: ErrorType,
    /// Always `None`.
    pub error_message: Option<String>,
    /// The attached resource.
    #[schema(value_type = Option<Object>)]
    pub model: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_is_succeeded() {
        let result: BisResult<String> = BisResult::new();
        assert!(result.is_succeeded());
        assert!(result.resource().is_none());
        assert!(result.error_response().is_none());
    }

    #[test]
    fn message_without_type_is_a_failure() {
        let mut result: BisResult<String> = BisResult::new();
        result.add_error_message("something broke");
        assert!(!result.is_succeeded());

        let body = result.error_response().unwrap();
        assert_eq!(body.error, "Other");
        assert!(body.error_description.is_none());
    }

    #[test]
    fn empty_messages_are_ignored() {
        let mut result: BisResult<()> = BisResult::new();
        result.add_error_message("");
        result.add_error_messages(vec!["", ""]);
        assert!(result.is_succeeded());
        assert!(result.error_messages().is_empty());
    }

    #[test]
    fn compound_message_joins_with_spaces() {
        let mut result: BisResult<()> = BisResult::new();
        result.add_compound_error_message(&["Card", "000000001234", "is locked."]);
        assert_eq!(result.error_messages(), &["Card 000000001234 is locked."]);
    }

    #[test]
    fn merge_takes_type_and_primary_from_other_when_unset() {
        let mut result: BisResult<u32> = BisResult::new();
        result.merge(BisResult::failure(ErrorType::NotFound, "Card can not be found."));

        assert_eq!(result.error_type(), ErrorType::NotFound);
        assert_eq!(result.error_message(), "Card can not be found.");
        assert!(result.error_messages().is_empty());
    }

    #[test]
    fn merge_keeps_own_type_and_demotes_other_primary() {
        let mut result: BisResult<u32> =
            BisResult::failure(ErrorType::InvalidInput, "Request body must be provided!");
        let mut other = BisResult::failure(ErrorType::NotFound, "Person can not be found.");
        other.add_error_message("detail");

        result.merge(other);

        assert_eq!(result.error_type(), ErrorType::InvalidInput);
        assert_eq!(result.error_message(), "Request body must be provided!");
        assert_eq!(
            result.error_messages(),
            &["Person can not be found.", "detail"]
        );
    }

    #[test]
    fn merge_copies_resource_when_present() {
        let mut result = BisResult::success(1u32);
        result.merge(BisResult::success(2));
        assert_eq!(result.resource(), Some(&2));

        result.merge(BisResult::new());
        assert_eq!(result.resource(), Some(&2));
    }

    #[test]
    fn cast_carries_error_state_and_drops_resource() {
        let mut result = BisResult::success(7u32);
        result.fail(ErrorType::NotFound, "Card can not be found.");
        result.add_error_message("extra");

        let cast: BisResult<String> = result.cast();
        assert_eq!(cast.error_type(), ErrorType::NotFound);
        assert_eq!(cast.error_message(), "Card can not be found.");
        assert_eq!(cast.error_messages(), &["extra"]);
        assert!(cast.resource().is_none());
    }

    #[test]
    fn into_outcome_splits_success_and_failure() {
        assert_eq!(BisResult::success(3u8).into_outcome().unwrap(), 3);

        let failed = BisResult::<u8>::failure(ErrorType::Unauthorized, "Failed to login.");
        let err = failed.into_outcome().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Unauthorized);

        let empty = BisResult::<u8>::new().into_outcome().unwrap_err();
        assert_eq!(empty.error_type(), ErrorType::Other);
    }

    #[test]
    fn error_response_includes_model() {
        let mut result = BisResult::success(serde_json::json!({"CardNumber": "000000000042"}));
        result.fail(ErrorType::InvalidInput, "Failed to call BIS API.");

        let body = result.error_response().unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["IsSucceeded"], false);
        assert_eq!(json["Error"], "InvalidInput");
        assert_eq!(json["ErrorDescription"], "Failed to call BIS API.");
        assert_eq!(json["Model"]["CardNumber"], "000000000042");
    }

    #[test]
    fn success_body_wraps_model() {
        let result = BisResult::success(vec!["a", "b"]);
        let json = serde_json::to_value(result.success_body()).unwrap();
        assert_eq!(json["IsSucceeded"], true);
        assert_eq!(json["ErrorType"], "None");
        assert!(json["ErrorMessage"].is_null());
        assert_eq!(json["Model"], serde_json::json!(["a", "b"]));
    }
}
