use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Everything the synthesizer needs to translate one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub user_question: String,
    pub business_context: String,
    pub schema_description: String,
    pub example_pairs: String,
}

/// A single-line SQL statement ending in exactly one `;`.
///
/// Only the sanitizer builds these, so an instance always satisfies that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryStatement(String);

impl QueryStatement {
    pub(crate) fn from_sanitized(sql: String) -> Self {
        debug_assert!(sql.ends_with(';') && sql.matches(';').count() == 1);
        Self(sql)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column name to scalar value, in the column order the store returned.
pub type ResultRow = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Model summary collapsed to one line of printable ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SummaryText(String);

impl SummaryText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SummaryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
