//! # Connection Strings
//!
//! Parses `key=value;` connection strings of the form used by the access
//! engine's database (`Data Source=db;Initial Catalog=ace;User ID=...`) and
//! rewrites the catalog for a tenant.
//!
//! Keys compare case-insensitively, `Database` is a synonym of
//! `Initial Catalog`, and values may be quoted with `"` or `'` (a doubled
//! quote inside a quoted value is a literal quote).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from connection string parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    /// The string contains no `key=value` pairs.
    #[error("connection string is empty")]
    Empty,

    /// A segment has no `=` separator.
    #[error("connection string segment '{segment}' has no value")]
    MissingValue {
        /// The offending segment.
        segment: String,
    },

    /// A segment starts with `=`.
    #[error("connection string contains an empty key")]
    EmptyKey,

    /// A quoted value is not closed.
    #[error("unterminated quoted value for '{key}'")]
    UnterminatedQuote {
        /// Key of the unterminated value.
        key: String,
    },

    /// Text follows a closing quote before the next `;`.
    #[error("unexpected characters after quoted value for '{key}'")]
    TrailingCharacters {
        /// Key of the offending value.
        key: String,
    },
}

/// An ordered set of connection string entries.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    entries: Vec<(String, String)>,
}

const INITIAL_CATALOG: &str = "initial catalog";

fn canonical_key(key: &str) -> String {
    let lower = key.trim().to_ascii_lowercase();
    match lower.as_str() {
        "database" => INITIAL_CATALOG.to_string(),
        _ => lower,
    }
}

fn is_secret_key(key: &str) -> bool {
    matches!(canonical_key(key).as_str(), "password" | "pwd")
}

impl ConnectionString {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionStringError`] when the string is empty or a
    /// segment is malformed.
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let mut entries = Vec::new();
        let mut chars = input.chars().peekable();

        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ';') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            loop {
                match chars.next() {
                    Some('=') => break,
                    Some(';') | None => {
                        return Err(ConnectionStringError::MissingValue {
                            segment: key.trim().to_string(),
                        })
                    }
                    Some(c) => key.push(c),
                }
            }
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(ConnectionStringError::EmptyKey);
            }

            while matches!(chars.peek(), Some(c) if *c != ';' && c.is_whitespace()) {
                chars.next();
            }

            let value = match chars.peek().copied() {
                Some(quote) if quote == '"' || quote == '\'' => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => {
                                if chars.peek() == Some(&quote) {
                                    chars.next();
                                    value.push(quote);
                                } else {
                                    break;
                                }
                            }
                            Some(c) => value.push(c),
                            None => return Err(ConnectionStringError::UnterminatedQuote { key }),
                        }
                    }
                    loop {
                        match chars.peek() {
                            Some(';') => {
                                chars.next();
                                break;
                            }
                            Some(c) if c.is_whitespace() => {
                                chars.next();
                            }
                            None => break,
                            Some(_) => {
                                return Err(ConnectionStringError::TrailingCharacters { key })
                            }
                        }
                    }
                    value
                }
                _ => {
                    let mut value = String::new();
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                        value.push(c);
                    }
                    value.trim().to_string()
                }
            };

            entries.push((key, value));
        }

        if entries.is_empty() {
            return Err(ConnectionStringError::Empty);
        }
        Ok(Self { entries })
    }

    /// Look up a value by key (case-insensitive, synonyms resolved).
    pub fn get(&self, key: &str) -> Option<&str> {
        let wanted = canonical_key(key);
        self.entries
            .iter()
            .find(|(k, _)| canonical_key(k) == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, replacing an existing entry with the same key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let wanted = canonical_key(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| canonical_key(k) == wanted) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// The database catalog.
    pub fn initial_catalog(&self) -> Option<&str> {
        self.get(INITIAL_CATALOG)
    }

    /// Point the connection string at another database catalog.
    pub fn set_initial_catalog(&mut self, catalog: impl Into<String>) {
        self.set("Initial Catalog", catalog);
    }

    /// Render with password values masked, for logs.
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                if redact && is_secret_key(k) {
                    format!("{k}=***")
                } else {
                    format!("{k}={}", quote_value(v))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.contains(';')
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.starts_with('"')
        || value.starts_with('\'');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Passwords are masked so connection strings can be logged safely.
impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionString")
            .field(&self.redacted())
            .finish()
    }
}
