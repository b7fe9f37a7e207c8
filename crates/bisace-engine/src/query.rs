//! # Predicate Queries
//!
//! The engine answers ad-hoc `select columns from table where predicate`
//! queries against its schema. [`Query`] describes such a query with typed
//! conditions so that literals are always quoted, and renders the three
//! strings the engine's query interface expects:
//!
//! ```text
//! columns: cardid
//! tables:  bsuser.cards
//! where:   cardno='000000001234' and status>0
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tables of the engine schema the service queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Cards,
    Persons,
    AuthPerPerson,
    AuthPerProfile,
    Authorizations,
}

impl Table {
    /// Qualified table name in the engine schema.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cards => "bsuser.cards",
            Self::Persons => "bsuser.acpersons",
            Self::AuthPerPerson => "bsuser.authperperson",
            Self::AuthPerProfile => "bsuser.authperprofile",
            Self::Authorizations => "bsuser.authorizations",
        }
    }
}

/// A single `where` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column='value'`
    Eq(String, String),
    /// `column>value`
    Gt(String, i64),
}

impl Condition {
    fn render(&self) -> String {
        match self {
            Self::Eq(column, value) => format!("{column}='{}'", value.replace('\'', "''")),
            Self::Gt(column, value) => format!("{column}>{value}"),
        }
    }

    /// Evaluate the condition against a row. Missing columns never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq(column, value) => row.get(column).as_deref() == Some(value.as_str()),
            Self::Gt(column, value) => row
                .get(column)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .is_some_and(|v| v > *value),
        }
    }
}

/// A `select` against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub columns: Vec<String>,
    pub conditions: Vec<Condition>,
}

impl Query {
    pub fn select(table: Table, columns: &[&str]) -> Self {
        Self {
            table,
            columns: columns.iter().map(|c| c.to_ascii_lowercase()).collect(),
            conditions: Vec::new(),
        }
    }

    /// Add `column='value'`.
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_ascii_lowercase(), value.into()));
        self
    }

    /// Add `column>value`.
    pub fn gt(mut self, column: &str, value: i64) -> Self {
        self.conditions
            .push(Condition::Gt(column.to_ascii_lowercase(), value));
        self
    }

    /// Comma-separated column list.
    pub fn columns_clause(&self) -> String {
        self.columns.join(",")
    }

    /// Conjunction of all conditions (empty when unfiltered).
    pub fn where_clause(&self) -> String {
        self.conditions
            .iter()
            .map(Condition::render)
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Whether `row` satisfies every condition.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Keep only the selected columns of `row`.
    pub fn project(&self, row: &Row) -> Row {
        let mut projected = Row::default();
        for column in &self.columns {
            if let Some(value) = row.0.get(column) {
                projected.0.insert(column.clone(), value.clone());
            }
        }
        projected
    }
}

/// Wire form of a query, as posted to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRequest {
    pub columns: String,
    pub tables: String,
    #[serde(rename = "where")]
    pub predicate: String,
}

impl From<&Query> for SelectRequest {
    fn from(query: &Query) -> Self {
        Self {
            columns: query.columns_clause(),
            tables: query.table.name().to_string(),
            predicate: query.where_clause(),
        }
    }
}

/// One result row. Column names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, serde_json::Value>);

impl Row {
    /// Build a row from column/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        )
    }

    /// Column value as text. `null` and missing columns give `None`.
    pub fn get(&self, column: &str) -> Option<String> {
        let value = self.0.get(column).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })?;
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_active_card_lookup() {
        let query = Query::select(Table::Cards, &["cardid"])
            .eq("cardno", "000000001234")
            .gt("status", 0);
        let wire = SelectRequest::from(&query);
        assert_eq!(wire.columns, "cardid");
        assert_eq!(wire.tables, "bsuser.cards");
        assert_eq!(wire.predicate, "cardno='000000001234' and status>0");
    }

    #[test]
    fn quotes_are_escaped() {
        let query = Query::select(Table::Persons, &["persid"]).eq("lastname", "O'Brien");
        assert_eq!(query.where_clause(), "lastname='O''Brien'");
    }

    #[test]
    fn evaluates_conditions_against_rows() {
        let query = Query::select(Table::Cards, &["cardid", "persid"])
            .eq("cardno", "000000000007")
            .gt("status", 0);

        let active = Row::from_pairs([
            ("CARDID", serde_json::json!("C1")),
            ("cardno", serde_json::json!("000000000007")),
            ("persid", serde_json::json!("P1")),
            ("status", serde_json::json!(1)),
        ]);
        let inactive = Row::from_pairs([
            ("cardid", serde_json::json!("C2")),
            ("cardno", serde_json::json!("000000000007")),
            ("status", serde_json::json!("0")),
        ]);

        assert!(query.matches(&active));
        assert!(!query.matches(&inactive));

        let projected = query.project(&active);
        assert_eq!(projected.get("cardid").as_deref(), Some("C1"));
        assert_eq!(projected.get("PERSID").as_deref(), Some("P1"));
        assert!(projected.get("status").is_none());
    }

    #[test]
    fn row_values_render_as_text() {
        let row: Row =
            serde_json::from_str(r#"{"CardId": "C9", "Status": 2, "Note": null}"#).unwrap();
        assert_eq!(row.get("cardid").as_deref(), Some("C9"));
        assert_eq!(row.get("status").as_deref(), Some("2"));
        assert!(row.get("note").is_none());
    }
}
