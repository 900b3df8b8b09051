//! Facet requests and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How values of a faceted attribute are summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    /// Most frequent values.
    String,
    /// Min/max and percentiles of a number.
    Numeric,
    /// Min/max and percentiles of a date.
    Date,
}

/// Percentiles requested for numeric and date facets.
pub const FACET_PERCENTILES: [f64; 9] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

/// The attributes to facet on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    /// `(field, type)` pairs, in request order.
    pub facets: Vec<(String, FacetType)>,
}

impl FacetSpec {
    /// Creates an empty facet specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a facet.
    pub fn with_facet(mut self, field: impl Into<String>, facet_type: FacetType) -> Self {
        self.facets.push((field.into(), facet_type));
        self
    }

    /// Returns true if no facet is requested.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Reads the facets out of an Elasticsearch `aggregations` object.
    ///
    /// Facets whose aggregations are missing are skipped.
    pub fn parse_aggregations(&self, aggregations: &Value) -> Vec<Facet> {
        self.facets
            .iter()
            .filter_map(|(field, facet_type)| {
                Facet::from_aggregations(field, *facet_type, aggregations)
            })
            .collect()
    }
}

/// Name of the aggregation computing the main summary of a facet.
pub fn aggregation_name(field: &str, facet_type: FacetType) -> String {
    match facet_type {
        FacetType::String => format!("{}_terms", field),
        FacetType::Numeric | FacetType::Date => format!("{}_stats", field),
    }
}

/// Name of the percentiles aggregation of a numeric or date facet.
pub fn percentiles_aggregation_name(field: &str) -> String {
    format!("{}_percentiles", field)
}

/// A value and its document count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermBucket {
    /// The attribute value.
    pub value: String,
    /// Documents holding it.
    pub count: u64,
}

/// Summary of one faceted attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Facet {
    /// Most frequent values.
    String {
        /// Faceted attribute.
        field: String,
        /// Buckets, most frequent first.
        buckets: Vec<TermBucket>,
        /// Documents whose value is not in a bucket.
        others: u64,
    },
    /// Numeric or date range.
    Range {
        /// Faceted attribute.
        field: String,
        /// Facet type (numeric or date).
        facet_type: FacetType,
        /// Documents holding the attribute.
        count: u64,
        /// Smallest value (formatted for dates).
        min: Option<Value>,
        /// Largest value (formatted for dates).
        max: Option<Value>,
        /// `(percent, value)` pairs.
        percentiles: Vec<(f64, Value)>,
    },
}

impl Facet {
    /// Builds a facet from the aggregations of a search response.
    pub fn from_aggregations(
        field: &str,
        facet_type: FacetType,
        aggregations: &Value,
    ) -> Option<Facet> {
        let main = aggregations.get(aggregation_name(field, facet_type))?;
        match facet_type {
            FacetType::String => {
                let buckets = main
                    .get("buckets")?
                    .as_array()?
                    .iter()
                    .filter_map(|bucket| {
                        let key = bucket.get("key")?;
                        let value = key
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| key.to_string());
                        Some(TermBucket {
                            value,
                            count: bucket.get("doc_count")?.as_u64()?,
                        })
                    })
                    .collect();
                Some(Facet::String {
                    field: field.to_string(),
                    buckets,
                    others: main
                        .get("sum_other_doc_count")
                        .and_then(Value::as_u64)
                        .unwrap_or(0),
                })
            }
            FacetType::Numeric | FacetType::Date => {
                let bound = |name: &str| -> Option<Value> {
                    if facet_type == FacetType::Date {
                        if let Some(formatted) = main.get(format!("{}_as_string", name)) {
                            return Some(formatted.clone());
                        }
                    }
                    main.get(name).filter(|v| !v.is_null()).cloned()
                };
                let percentiles = aggregations
                    .get(percentiles_aggregation_name(field))
                    .and_then(|agg| agg.get("values"))
                    .and_then(Value::as_object)
                    .map(|values| {
                        let mut pairs: Vec<(f64, Value)> = values
                            .iter()
                            .filter(|(key, _)| !key.ends_with("_as_string"))
                            .filter_map(|(key, value)| {
                                let percent: f64 = key.parse().ok()?;
                                let formatted = values.get(&format!("{}_as_string", key));
                                let value = match (facet_type, formatted) {
                                    (FacetType::Date, Some(formatted)) => formatted.clone(),
                                    _ => value.clone(),
                                };
                                Some((percent, value))
                            })
                            .collect();
                        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
                        pairs
                    })
                    .unwrap_or_default();
                Some(Facet::Range {
                    field: field.to_string(),
                    facet_type,
                    count: main.get("count").and_then(Value::as_u64).unwrap_or(0),
                    min: bound("min"),
                    max: bound("max"),
                    percentiles,
                })
            }
        }
    }

    /// The faceted attribute.
    pub fn field(&self) -> &str {
        match self {
            Facet::String { field, .. } | Facet::Range { field, .. } => field,
        }
    }
}
