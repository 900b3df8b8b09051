//! The criterion algebra.
//!
//! A [`Criterion`] is an immutable tree of search predicates. Trees are plain
//! values: they compare structurally, clone cheaply enough for query sizes and
//! serialize with serde. Every transformation in this crate (circle rewrite,
//! planar correction) takes a tree by reference and returns a new one.
//!
//! Trees are usually assembled with the factory functions in [`builders`]:
//!
//! ```
//! use helios_indexer::{and, eq, intersects_circle, Criterion};
//!
//! let criterion = and([
//!     eq("properties.mission", "MEX"),
//!     intersects_circle([45.0, 45.0], "50km"),
//! ]);
//! assert!(criterion.contains_circle());
//! assert!(matches!(criterion, Criterion::And(ref children) if children.len() == 2));
//! ```

pub mod builders;
mod inspect;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::geo::LonLat;

/// A node of the criterion tree.
// Variant fields are named after the attribute they constrain
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Every child must match.
    And(Vec<Criterion>),

    /// At least one child must match.
    Or(Vec<Criterion>),

    /// The child must not match.
    Not(Box<Criterion>),

    /// Matches every document.
    All,

    /// `field <op> value`, with an optional absolute tolerance for numbers.
    Comparison {
        field: String,
        op: ComparisonOp,
        value: CriterionValue,
        tolerance: Option<f64>,
    },

    /// `lower <(=) field <(=) upper`.
    Between {
        field: String,
        lower: RangeBound,
        upper: RangeBound,
    },

    /// `field` equals one of the values.
    In {
        field: String,
        values: Vec<CriterionValue>,
    },

    /// Text matching; several values are ORed.
    StringMatch {
        field: String,
        kind: MatchKind,
        match_type: StringMatchType,
        values: Vec<String>,
    },

    /// The array attribute `field` holds `value`.
    Contains {
        field: String,
        value: CriterionValue,
        tolerance: Option<f64>,
    },

    /// The range attribute `field` contains `value`.
    Into { field: String, value: CriterionValue },

    /// The range attribute `field` intersects `[lower, upper]`.
    IntersectsRange {
        field: String,
        lower: CriterionValue,
        upper: CriterionValue,
    },

    /// `field` is present in the document.
    FieldExists { field: String },

    /// The document geometry intersects a circle. `radius` is a distance
    /// specification such as `"50m"` or `"12.5km"`.
    Circle { center: LonLat, radius: String },

    /// The document geometry intersects a polygon (outer ring then holes).
    Polygon { rings: Vec<Vec<LonLat>> },

    /// The document geometry intersects a longitude/latitude box.
    BoundingBox {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
}

impl ComparisonOp {
    /// The Elasticsearch `range` key for ordering operators.
    pub fn range_key(&self) -> Option<&'static str> {
        match self {
            ComparisonOp::Gt => Some("gt"),
            ComparisonOp::Ge => Some("gte"),
            ComparisonOp::Lt => Some("lt"),
            ComparisonOp::Le => Some("lte"),
            ComparisonOp::Eq | ComparisonOp::Ne => None,
        }
    }
}

/// A bound of a [`Criterion::Between`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    /// The bound value.
    pub value: CriterionValue,
    /// Whether the bound itself matches.
    pub inclusive: bool,
}

impl RangeBound {
    /// An inclusive bound.
    pub fn inclusive(value: impl Into<CriterionValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: true,
        }
    }

    /// An exclusive bound.
    pub fn exclusive(value: impl Into<CriterionValue>) -> Self {
        Self {
            value: value.into(),
            inclusive: false,
        }
    }
}

/// How a text value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Whole value.
    Equals,
    /// Prefix.
    StartsWith,
    /// Suffix.
    EndsWith,
    /// Substring (keyword) or all terms (full text).
    Contains,
    /// Lucene regular expression.
    Regexp,
}

/// Which index flavour of a text attribute is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatchType {
    /// The exact, untokenized value (`field.keyword`).
    #[default]
    Keyword,
    /// The analyzed value (`field`).
    FullText,
}

/// A scalar compared against document attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionValue {
    /// Integer.
    Int(i64),
    /// Floating point number.
    Double(f64),
    /// Boolean.
    Bool(bool),
    /// Instant, always UTC.
    Date(DateTime<Utc>),
    /// Text.
    Text(String),
}

impl CriterionValue {
    /// Numeric view of the value, used for tolerance arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CriterionValue::Int(i) => Some(*i as f64),
            CriterionValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// The JSON form sent to the search engine. Dates use RFC 3339 with
    /// millisecond precision in UTC.
    pub fn to_json(&self) -> Value {
        match self {
            CriterionValue::Int(i) => json!(i),
            CriterionValue::Double(d) => json!(d),
            CriterionValue::Bool(b) => json!(b),
            CriterionValue::Date(date) => json!(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            CriterionValue::Text(s) => json!(s),
        }
    }
}

impl From<i64> for CriterionValue {
    fn from(i: i64) -> Self {
        CriterionValue::Int(i)
    }
}

impl From<i32> for CriterionValue {
    fn from(i: i32) -> Self {
        CriterionValue::Int(i64::from(i))
    }
}

impl From<f64> for CriterionValue {
    fn from(d: f64) -> Self {
        CriterionValue::Double(d)
    }
}

impl From<bool> for CriterionValue {
    fn from(b: bool) -> Self {
        CriterionValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for CriterionValue {
    fn from(date: DateTime<Utc>) -> Self {
        CriterionValue::Date(date)
    }
}

impl From<&str> for CriterionValue {
    fn from(s: &str) -> Self {
        CriterionValue::Text(s.to_string())
    }
}

impl From<String> for CriterionValue {
    fn from(s: String) -> Self {
        CriterionValue::Text(s)
    }
}

impl Criterion {
    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Criterion::And(_) => "and",
            Criterion::Or(_) => "or",
            Criterion::Not(_) => "not",
            Criterion::All => "all",
            Criterion::Comparison { .. } => "comparison",
            Criterion::Between { .. } => "between",
            Criterion::In { .. } => "in",
            Criterion::StringMatch { .. } => "string match",
            Criterion::Contains { .. } => "contains",
            Criterion::Into { .. } => "into",
            Criterion::IntersectsRange { .. } => "intersects range",
            Criterion::FieldExists { .. } => "field exists",
            Criterion::Circle { .. } => "circle",
            Criterion::Polygon { .. } => "polygon",
            Criterion::BoundingBox { .. } => "bounding box",
        }
    }

    /// True for circle, polygon and bounding box leaves.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            Criterion::Circle { .. } | Criterion::Polygon { .. } | Criterion::BoundingBox { .. }
        )
    }

    /// Rebuilds the tree, replacing every leaf with the result of `f`.
    ///
    /// Combinators keep their type and child order.
    pub fn try_map_leaves<E, F>(&self, f: &mut F) -> Result<Criterion, E>
    where
        F: FnMut(&Criterion) -> Result<Criterion, E>,
    {
        match self {
            Criterion::And(children) => Ok(Criterion::And(
                children
                    .iter()
                    .map(|child| child.try_map_leaves(f))
                    .collect::<Result<_, _>>()?,
            )),
            Criterion::Or(children) => Ok(Criterion::Or(
                children
                    .iter()
                    .map(|child| child.try_map_leaves(f))
                    .collect::<Result<_, _>>()?,
            )),
            Criterion::Not(child) => Ok(Criterion::Not(Box::new(child.try_map_leaves(f)?))),
            leaf => f(leaf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_structural_equality() {
        let a = Criterion::Circle {
            center: [1.0, 2.0],
            radius: "10m".to_string(),
        };
        let b = Criterion::Circle {
            center: [1.0, 2.0],
            radius: "10m".to_string(),
        };
        assert_eq!(a, b);
        assert_ne!(a, Criterion::Not(Box::new(b)));
    }

    #[test]
    fn test_serde_round_trip() {
        let criterion = Criterion::And(vec![
            Criterion::Comparison {
                field: "properties.orbit".to_string(),
                op: ComparisonOp::Ge,
                value: CriterionValue::Int(12),
                tolerance: None,
            },
            Criterion::BoundingBox {
                min_x: -10.0,
                min_y: -5.0,
                max_x: 10.0,
                max_y: 5.0,
            },
        ]);
        let json = serde_json::to_string(&criterion).unwrap();
        assert!(json.contains("\"and\""));
        assert!(json.contains("\"bounding_box\""));
        let back: Criterion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, criterion);
    }

    #[test]
    fn test_value_to_json() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            CriterionValue::from(date).to_json(),
            json!("2024-01-15T10:30:00.000Z")
        );
        assert_eq!(CriterionValue::from(3).to_json(), json!(3));
        assert_eq!(CriterionValue::from("MEX").to_json(), json!("MEX"));
        assert_eq!(CriterionValue::from(true).as_f64(), None);
        assert_eq!(CriterionValue::from(2.5).as_f64(), Some(2.5));
    }

    #[test]
    fn test_try_map_leaves_preserves_shape() {
        let tree = Criterion::Or(vec![
            Criterion::FieldExists {
                field: "a".to_string(),
            },
            Criterion::Not(Box::new(Criterion::All)),
        ]);
        let mapped: Result<Criterion, ()> = tree.try_map_leaves(&mut |leaf| match leaf {
            Criterion::All => Ok(Criterion::FieldExists {
                field: "b".to_string(),
            }),
            other => Ok(other.clone()),
        });
        assert_eq!(
            mapped.unwrap(),
            Criterion::Or(vec![
                Criterion::FieldExists {
                    field: "a".to_string(),
                },
                Criterion::Not(Box::new(Criterion::FieldExists {
                    field: "b".to_string(),
                })),
            ])
        );
    }

    #[test]
    fn test_range_key() {
        assert_eq!(ComparisonOp::Ge.range_key(), Some("gte"));
        assert_eq!(ComparisonOp::Eq.range_key(), None);
    }
}
