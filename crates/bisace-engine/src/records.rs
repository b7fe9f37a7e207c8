//! Engine record types.
//!
//! Mirrors of the engine's card, person, authorization and access group
//! records. Fields use `#[serde(default)]` where the gateway may omit them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar date in the engine's day/month/year representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AceDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl AceDate {
    /// Build a date, rejecting impossible calendar dates.
    pub fn new(day: u8, month: u8, year: u16) -> Option<Self> {
        NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .map(|_| Self { day, month, year })
    }

    /// The date as a [`NaiveDate`].
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
    }
}

impl TryFrom<NaiveDate> for AceDate {
    type Error = NaiveDate;

    /// Fails for years outside `0..=65535`.
    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        let year = u16::try_from(date.year()).map_err(|_| date)?;
        // month() and day() are always within u8 range.
        Ok(Self {
            day: date.day() as u8,
            month: date.month() as u8,
            year,
        })
    }
}

impl fmt::Display for AceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A card record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub card_id: String,
    /// Card number as stored by the engine (zero-padded).
    pub card_no: String,
    pub person_id: String,
    /// Hex-encoded raw card data.
    #[serde(default)]
    pub code_data: String,
    /// Positive for active cards.
    #[serde(default)]
    pub status: i32,
}

impl CardRecord {
    pub fn is_active(&self) -> bool {
        self.status > 0
    }
}

/// Fields of a card to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub card_no: String,
    pub person_id: String,
    pub code_data: String,
}

/// A person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub person_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Start of the person's authorization window.
    #[serde(default)]
    pub auth_from: Option<AceDate>,
    /// End of the person's authorization window.
    #[serde(default)]
    pub auth_until: Option<AceDate>,
    #[serde(default)]
    pub auth_profile_id: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

impl PersonRecord {
    /// Value of a custom field, if set.
    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.custom_fields.get(name).map(String::as_str)
    }

    /// Set a custom field. The engine validates the field name on update.
    pub fn set_custom_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.custom_fields.insert(name.into(), value.into());
    }
}

/// An access authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRecord {
    pub auth_id: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// An authorization assigned to a person for a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationGrant {
    pub auth_id: String,
    #[serde(default)]
    pub valid_from: Option<AceDate>,
    #[serde(default)]
    pub valid_until: Option<AceDate>,
}

/// Door or lift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Door,
    Lift,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Lift => "lift",
        }
    }
}

/// A door or lift access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGroupRecord {
    pub group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: GroupKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ace_date_rejects_impossible_dates() {
        assert!(AceDate::new(31, 2, 2024).is_none());
        assert!(AceDate::new(0, 1, 2024).is_none());
        let leap = AceDate::new(29, 2, 2024).unwrap();
        assert_eq!(leap.to_string(), "2024-02-29");
    }

    #[test]
    fn ace_date_from_naive_date() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let ace = AceDate::try_from(date).unwrap();
        assert_eq!(ace, AceDate { day: 4, month: 7, year: 2025 });
        assert_eq!(ace.to_date(), Some(date));
    }

    #[test]
    fn person_custom_fields() {
        let mut person = PersonRecord {
            person_id: "P1".into(),
            ..PersonRecord::default()
        };
        assert!(person.custom_field("CardName").is_none());
        person.set_custom_field("CardName", "Lobby badge");
        assert_eq!(person.custom_field("CardName"), Some("Lobby badge"));
    }

    #[test]
    fn person_tolerates_sparse_gateway_payload() {
        let person: PersonRecord = serde_json::from_value(serde_json::json!({
            "personId": "0013475D736CCE66",
            "authFrom": {"day": 1, "month": 1, "year": 2025}
        }))
        .unwrap();
        assert_eq!(person.person_id, "0013475D736CCE66");
        assert_eq!(person.auth_from, AceDate::new(1, 1, 2025));
        assert!(person.auth_until.is_none());
        assert!(person.custom_fields.is_empty());
    }

    #[test]
    fn group_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&GroupKind::Lift).unwrap(), "\"lift\"");
        assert_eq!(GroupKind::Door.as_str(), "door");
    }
}
