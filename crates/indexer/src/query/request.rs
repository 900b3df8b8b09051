//! Search request body assembly.

use serde_json::{Map, Value, json};

use crate::config::IndexerConfig;
use crate::error::{IllegalArgument, IndexerResult};
use crate::types::{
    FACET_PERCENTILES, FacetSpec, FacetType, Pagination, SearchTarget, SortDirective,
    aggregation_name, percentiles_aggregation_name,
};

use super::builder::{KEYWORD_SUFFIX, QueryDoc};

/// A complete Elasticsearch search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    query: QueryDoc,
    target: Option<SearchTarget>,
    pagination: Pagination,
    sort: Vec<SortDirective>,
    facets: FacetSpec,
    source: Option<Vec<String>>,
    facet_terms_size: u32,
    max_result_window: u32,
}

impl SearchRequest {
    /// Creates a request with default paging and limits.
    pub fn new(query: QueryDoc) -> Self {
        Self::from_config(query, &IndexerConfig::default())
    }

    /// Creates a request using the configured page size and limits.
    pub fn from_config(query: QueryDoc, config: &IndexerConfig) -> Self {
        Self {
            query,
            target: None,
            pagination: Pagination::new(config.default_page_size),
            sort: Vec::new(),
            facets: FacetSpec::default(),
            source: None,
            facet_terms_size: config.facet_terms_size,
            max_result_window: config.max_result_window,
        }
    }

    /// Restricts the request to a search target.
    pub fn with_target(mut self, target: SearchTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the page to fetch.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets the sort order.
    pub fn with_sort(mut self, sort: &[SortDirective]) -> Self {
        self.sort = sort.to_vec();
        self
    }

    /// Requests facets.
    pub fn with_facets(mut self, facets: FacetSpec) -> Self {
        self.facets = facets;
        self
    }

    /// Limits the returned `_source` to the given fields.
    pub fn with_source<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.source = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The targeted index, if set.
    pub fn index(&self) -> Option<&str> {
        self.target.as_ref().map(|target| target.index.as_str())
    }

    /// The request pagination.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Builds the request body.
    ///
    /// Fails when the requested page ends past the result window.
    pub fn body(&self) -> IndexerResult<Value> {
        let requested = self.pagination.end();
        let max = u64::from(self.max_result_window);
        if requested > max {
            return Err(IllegalArgument::ResultWindowExceeded { requested, max }.into());
        }

        let query = match self.target.as_ref().and_then(SearchTarget::type_filter) {
            Some(filter) => json!({
                "bool": {
                    "must": [self.query.as_value()],
                    "filter": [filter],
                }
            }),
            None => self.query.as_value().clone(),
        };

        let mut body = json!({
            "query": query,
            "size": self.pagination.count,
            "track_total_hits": true,
        });

        if self.pagination.offset > 0 {
            body["from"] = json!(self.pagination.offset);
        }

        if !self.sort.is_empty() {
            body["sort"] = self.build_sort();
        }

        if !self.facets.is_empty() {
            body["aggs"] = self.build_aggregations();
        }

        if let Some(ref fields) = self.source {
            body["_source"] = json!(fields);
        }

        tracing::debug!("Built search request body: {}", body);
        Ok(body)
    }

    fn build_sort(&self) -> Value {
        let mut sort_clauses: Vec<Value> = self
            .sort
            .iter()
            .map(|directive| {
                json!({
                    directive.field.as_str(): {
                        "order": directive.direction.as_str(),
                        "missing": "_last"
                    }
                })
            })
            .collect();

        // Always add tie-breaker
        sort_clauses.push(json!({ "_doc": { "order": "asc" } }));

        Value::Array(sort_clauses)
    }

    fn build_aggregations(&self) -> Value {
        let mut aggs = Map::new();
        for (field, facet_type) in &self.facets.facets {
            let name = aggregation_name(field, *facet_type);
            match facet_type {
                FacetType::String => {
                    aggs.insert(
                        name,
                        json!({
                            "terms": {
                                "field": format!("{}.{}", field, KEYWORD_SUFFIX),
                                "size": self.facet_terms_size
                            }
                        }),
                    );
                }
                FacetType::Numeric | FacetType::Date => {
                    aggs.insert(name, json!({ "stats": { "field": field } }));
                    aggs.insert(
                        percentiles_aggregation_name(field),
                        json!({
                            "percentiles": {
                                "field": field,
                                "percents": FACET_PERCENTILES
                            }
                        }),
                    );
                }
            }
        }
        Value::Object(aggs)
    }
}
