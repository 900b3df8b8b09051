//! Elasticsearch Query DSL builder.
//!
//! Translates a [`Criterion`] tree into Elasticsearch Query DSL JSON. The
//! tree is expected to be corrected for the reference body already (see
//! [`crate::geo::planar`] and [`crate::geo::circle`]); geometries are
//! rendered as given.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::IndexerConfig;
use crate::criterion::{
    ComparisonOp, Criterion, CriterionValue, MatchKind, RangeBound, StringMatchType,
};
use crate::error::{IllegalArgument, IndexerResult};

use super::geo_shape;

/// Suffix of range attribute lower bounds.
pub const RANGE_LOWER_BOUND: &str = "lowerBound";

/// Suffix of range attribute upper bounds.
pub const RANGE_UPPER_BOUND: &str = "upperBound";

/// Suffix of the untokenized sub-field of text attributes.
pub const KEYWORD_SUFFIX: &str = "keyword";

/// A query clause ready to be placed under `"query"` of a search body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryDoc(Value);

impl QueryDoc {
    /// The query as JSON.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the document, returning the JSON.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<QueryDoc> for Value {
    fn from(doc: QueryDoc) -> Self {
        doc.0
    }
}

/// Builds Elasticsearch queries from criteria.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    geometry_field: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Creates a builder querying geometries on the `geometry` field.
    pub fn new() -> Self {
        Self {
            geometry_field: "geometry".to_string(),
        }
    }

    /// Creates a builder from configuration.
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new().with_geometry_field(config.geometry_field.clone())
    }

    /// Sets the document field holding geometries.
    pub fn with_geometry_field(mut self, field: impl Into<String>) -> Self {
        self.geometry_field = field.into();
        self
    }

    /// Builds the query for a criterion tree.
    pub fn build(&self, criterion: &Criterion) -> QueryDoc {
        QueryDoc(self.build_clause(criterion))
    }

    /// Builds the `geo_shape` query of a geometry leaf.
    ///
    /// Fails with [`IllegalArgument::UnexpectedCriterion`] for other nodes.
    pub fn build_geo_shape(&self, criterion: &Criterion) -> IndexerResult<Value> {
        self.geo_shape(criterion).ok_or_else(|| {
            IllegalArgument::UnexpectedCriterion {
                expected: "geometry",
                found: criterion.kind_name(),
            }
            .into()
        })
    }

    fn geo_shape(&self, criterion: &Criterion) -> Option<Value> {
        let shape = match criterion {
            Criterion::Circle { center, radius } => geo_shape::circle_shape(*center, radius),
            Criterion::Polygon { rings } => geo_shape::polygon_shape(rings),
            Criterion::BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            } => geo_shape::bbox_shape(*min_x, *min_y, *max_x, *max_y),
            _ => return None,
        };
        Some(geo_shape::geo_shape_clause(&self.geometry_field, shape))
    }

    fn build_clause(&self, criterion: &Criterion) -> Value {
        match criterion {
            Criterion::And(children) if children.is_empty() => match_all(),
            Criterion::And(children) => json!({
                "bool": { "must": self.build_clauses(children) }
            }),
            Criterion::Or(children) if children.is_empty() => match_none(),
            Criterion::Or(children) => json!({
                "bool": {
                    "should": self.build_clauses(children),
                    "minimum_should_match": 1
                }
            }),
            Criterion::Not(child) => must_not(self.build_clause(child)),
            Criterion::All => match_all(),
            Criterion::Comparison {
                field,
                op,
                value,
                tolerance,
            } => build_comparison(field, *op, value, *tolerance),
            Criterion::Between { field, lower, upper } => build_between(field, lower, upper),
            Criterion::In { field, values } => {
                let values: Vec<Value> = values.iter().map(CriterionValue::to_json).collect();
                json!({ "terms": { field: values } })
            }
            Criterion::StringMatch {
                field,
                kind,
                match_type,
                values,
            } => build_string_match(field, *kind, *match_type, values),
            Criterion::Contains {
                field,
                value,
                tolerance,
            } => build_comparison(field, ComparisonOp::Eq, value, *tolerance),
            Criterion::Into { field, value } => {
                let value = value.to_json();
                json!({
                    "bool": {
                        "must": [
                            range(&bound_field(field, RANGE_LOWER_BOUND), "lte", value.clone()),
                            range(&bound_field(field, RANGE_UPPER_BOUND), "gte", value),
                        ]
                    }
                })
            }
            Criterion::IntersectsRange { field, lower, upper } => json!({
                "bool": {
                    "must": [
                        range(&bound_field(field, RANGE_LOWER_BOUND), "lte", upper.to_json()),
                        range(&bound_field(field, RANGE_UPPER_BOUND), "gte", lower.to_json()),
                    ]
                }
            }),
            Criterion::FieldExists { field } => json!({ "exists": { "field": field } }),
            Criterion::Circle { .. }
            | Criterion::Polygon { .. }
            | Criterion::BoundingBox { .. } => {
                self.geo_shape(criterion).unwrap_or_else(match_none)
            }
        }
    }

    fn build_clauses(&self, children: &[Criterion]) -> Vec<Value> {
        children.iter().map(|child| self.build_clause(child)).collect()
    }
}

/// Builds a query with the default builder.
pub fn build_query(criterion: &Criterion) -> QueryDoc {
    QueryBuilder::new().build(criterion)
}

fn match_all() -> Value {
    json!({ "match_all": {} })
}

fn match_none() -> Value {
    must_not(match_all())
}

fn must_not(clause: Value) -> Value {
    json!({ "bool": { "must_not": [clause] } })
}

fn range(field: &str, key: &str, value: Value) -> Value {
    json!({ "range": { field: { key: value } } })
}

fn bound_field(field: &str, bound: &str) -> String {
    format!("{}.{}", field, bound)
}

fn build_comparison(
    field: &str,
    op: ComparisonOp,
    value: &CriterionValue,
    tolerance: Option<f64>,
) -> Value {
    match op {
        ComparisonOp::Eq => build_equality(field, value, tolerance),
        ComparisonOp::Ne => must_not(build_equality(field, value, tolerance)),
        ComparisonOp::Gt | ComparisonOp::Ge | ComparisonOp::Lt | ComparisonOp::Le => {
            let key = op.range_key().unwrap_or("gte");
            range(field, key, value.to_json())
        }
    }
}

fn build_equality(field: &str, value: &CriterionValue, tolerance: Option<f64>) -> Value {
    match (value.as_f64(), tolerance) {
        (Some(number), Some(tolerance)) => json!({
            "range": {
                field: {
                    "gte": number - tolerance,
                    "lte": number + tolerance
                }
            }
        }),
        _ => json!({ "term": { field: value.to_json() } }),
    }
}

fn build_between(field: &str, lower: &RangeBound, upper: &RangeBound) -> Value {
    let mut bounds = Map::new();
    let lower_key = if lower.inclusive { "gte" } else { "gt" };
    let upper_key = if upper.inclusive { "lte" } else { "lt" };
    bounds.insert(lower_key.to_string(), lower.value.to_json());
    bounds.insert(upper_key.to_string(), upper.value.to_json());
    json!({ "range": { field: Value::Object(bounds) } })
}

fn build_string_match(
    field: &str,
    kind: MatchKind,
    match_type: StringMatchType,
    values: &[String],
) -> Value {
    if values.is_empty() {
        return match_none();
    }

    let keyword_field = bound_field(field, KEYWORD_SUFFIX);
    if match_type == StringMatchType::Keyword && kind == MatchKind::Equals {
        return match values {
            [single] => json!({ "term": { keyword_field: single } }),
            _ => json!({ "terms": { keyword_field: values } }),
        };
    }

    let clauses: Vec<Value> = values
        .iter()
        .map(|value| match (match_type, kind) {
            (StringMatchType::Keyword, MatchKind::Equals) => {
                json!({ "term": { keyword_field.as_str(): value } })
            }
            (StringMatchType::Keyword, MatchKind::StartsWith) => {
                json!({ "prefix": { keyword_field.as_str(): value } })
            }
            (StringMatchType::Keyword, MatchKind::EndsWith) => {
                wildcard(&keyword_field, format!("*{}", escape_wildcard(value)))
            }
            (StringMatchType::Keyword, MatchKind::Contains) => {
                wildcard(&keyword_field, format!("*{}*", escape_wildcard(value)))
            }
            (StringMatchType::Keyword, MatchKind::Regexp) => {
                json!({ "regexp": { keyword_field.as_str(): value } })
            }
            (StringMatchType::FullText, MatchKind::Equals) => {
                json!({ "match_phrase": { field: value } })
            }
            (StringMatchType::FullText, MatchKind::StartsWith) => {
                json!({ "match_phrase_prefix": { field: value } })
            }
            (StringMatchType::FullText, MatchKind::EndsWith) => {
                wildcard(field, format!("*{}", escape_wildcard(value)))
            }
            (StringMatchType::FullText, MatchKind::Contains) => json!({
                "match": {
                    field: {
                        "query": value,
                        "operator": "and"
                    }
                }
            }),
            (StringMatchType::FullText, MatchKind::Regexp) => {
                json!({ "regexp": { field: value } })
            }
        })
        .collect();

    // Multiple values are ORed
    match <[Value; 1]>::try_from(clauses) {
        Ok([single]) => single,
        Err(clauses) => json!({
            "bool": {
                "should": clauses,
                "minimum_should_match": 1
            }
        }),
    }
}

fn wildcard(field: &str, pattern: String) -> Value {
    json!({ "wildcard": { field: { "value": pattern } } })
}

fn escape_wildcard(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
