//! Search target and sort types.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// The Elasticsearch `order` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The attribute to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parses a sort value (e.g., "-properties.start" for descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(stripped) => Self::desc(stripped),
            None => Self::asc(s),
        }
    }
}

/// Where a search runs: an index, optionally restricted to document types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    /// Index (or alias) name.
    pub index: String,
    /// Accepted values of the document `type` attribute; empty means all.
    #[serde(default)]
    pub types: Vec<String>,
}

impl SearchTarget {
    /// Targets every document of `index`.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            types: Vec::new(),
        }
    }

    /// Restricts the search to the given document types.
    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Filter clause on the document type, if restricted.
    pub fn type_filter(&self) -> Option<Value> {
        match self.types.as_slice() {
            [] => None,
            [single] => Some(json!({ "term": { "type": single } })),
            types => Some(json!({ "terms": { "type": types } })),
        }
    }
}
