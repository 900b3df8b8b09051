//! In-memory search repository fake.
//!
//! The fake does not evaluate criteria. It serves a fixed set of boundary hits
//! for the band criterion it was given, certain hits for any other query, and
//! records every criterion it receives.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use helios_indexer::{
    Criterion, Document, FacetSpec, IndexerResult, IllegalArgument, Page, PageInfo, Pagination,
    SearchRepository, SearchTarget, SortDirective,
};

/// A repository answering from memory.
#[derive(Debug)]
pub struct InMemoryRepository {
    accepted: Vec<Document>,
    boundary: Vec<Document>,
    band: Option<Criterion>,
    max_result_window: u64,
    received: Mutex<Vec<Criterion>>,
}

impl InMemoryRepository {
    /// Creates a repository with certain and boundary hits.
    pub fn new(accepted: Vec<Document>, boundary: Vec<Document>) -> Self {
        Self {
            accepted,
            boundary,
            band: None,
            max_result_window: 10_000,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Serves the boundary hits for `band`, usually a plan's candidate.
    pub fn with_band(mut self, band: Option<Criterion>) -> Self {
        self.band = band;
        self
    }

    /// Criteria received so far.
    pub fn received(&self) -> Vec<Criterion> {
        self.received.lock().unwrap().clone()
    }

    fn answer(&self, criterion: &Criterion) -> &[Document] {
        self.received.lock().unwrap().push(criterion.clone());
        if self.band.as_ref() == Some(criterion) {
            &self.boundary
        } else {
            &self.accepted
        }
    }
}

#[async_trait]
impl SearchRepository for InMemoryRepository {
    async fn search(
        &self,
        _target: &SearchTarget,
        pagination: Pagination,
        criterion: &Criterion,
        _facets: Option<&FacetSpec>,
        _sort: &[SortDirective],
    ) -> IndexerResult<Page<Document>> {
        if pagination.end() > self.max_result_window {
            return Err(IllegalArgument::ResultWindowExceeded {
                requested: pagination.end(),
                max: self.max_result_window,
            }
            .into());
        }

        let hits = self.answer(criterion);
        let items = hits
            .iter()
            .skip(pagination.offset as usize)
            .take(pagination.count as usize)
            .cloned()
            .collect();
        Ok(Page::new(
            items,
            PageInfo::from_total(&pagination, hits.len() as u64),
        ))
    }

    async fn search_with_source(
        &self,
        _target: &SearchTarget,
        criterion: &Criterion,
        source_fields: &[String],
    ) -> IndexerResult<Vec<Value>> {
        Ok(self
            .answer(criterion)
            .iter()
            .map(|document| filter_source(document, source_fields))
            .collect())
    }
}

fn filter_source(document: &Value, fields: &[String]) -> Value {
    let Some(object) = document.as_object() else {
        return document.clone();
    };
    object
        .iter()
        .filter(|(key, _)| fields.iter().any(|field| field == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}
