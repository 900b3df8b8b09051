//! Search repository contract.
//!
//! Implementations own the engine client; this crate only prepares what they
//! send. A typical implementation builds the query with
//! [`QueryBuilder`](crate::QueryBuilder), wraps it in a
//! [`SearchRequest`](crate::SearchRequest) and maps the response hits back
//! into [`Document`]s.

use async_trait::async_trait;
use serde_json::Value;

use crate::criterion::Criterion;
use crate::error::IndexerResult;
use crate::plan::GeoSearchPlan;
use crate::types::{FacetSpec, Page, Pagination, SearchTarget, SortDirective};

/// A search hit: the stored `_source` of the document.
pub type Document = Value;

/// Search access to an indexed catalog.
///
/// # Example
///
/// ```ignore
/// use helios_indexer::{SearchRepository, SearchTarget, Pagination, eq};
///
/// async fn missions<R: SearchRepository>(repo: &R) -> IndexerResult<()> {
///     let target = SearchTarget::new("catalog").with_types(["DATA"]);
///     let page = repo
///         .search(&target, Pagination::new(50), &eq("properties.mission", "MEX"), None, &[])
///         .await?;
///
///     for document in page.items {
///         println!("Found: {}", document["properties"]["label"]);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Searches one page of documents matching `criterion`.
    ///
    /// # Arguments
    ///
    /// * `target` - Index and document types to search
    /// * `pagination` - Page to fetch
    /// * `criterion` - Criterion tree, already corrected for the body
    /// * `facets` - Facets to compute alongside the hits
    /// * `sort` - Sort order; engine order when empty
    ///
    /// # Errors
    ///
    /// * `IndexerError::IllegalArgument` - If the page goes past the result window
    async fn search(
        &self,
        target: &SearchTarget,
        pagination: Pagination,
        criterion: &Criterion,
        facets: Option<&FacetSpec>,
        sort: &[SortDirective],
    ) -> IndexerResult<Page<Document>>;

    /// Returns every document matching `criterion`, limited to `source_fields`.
    async fn search_with_source(
        &self,
        target: &SearchTarget,
        criterion: &Criterion,
        source_fields: &[String],
    ) -> IndexerResult<Vec<Value>>;

    /// Runs a geo search plan: accepted hits, then boundary candidates that
    /// pass exact refinement.
    ///
    /// `source_fields` must include the geometry field for refinement to
    /// accept anything from the boundary band.
    async fn search_planned(
        &self,
        target: &SearchTarget,
        plan: &GeoSearchPlan,
        source_fields: &[String],
    ) -> IndexerResult<Vec<Value>> {
        let mut documents = self
            .search_with_source(target, plan.lower(), source_fields)
            .await?;

        if let Some(candidate) = plan.candidate() {
            let band = self
                .search_with_source(target, &candidate, source_fields)
                .await?;
            let before = documents.len();
            documents.extend(band.into_iter().filter(|doc| plan.refine_document(doc)));
            tracing::debug!(
                "Refinement kept {} boundary documents",
                documents.len() - before
            );
        }

        Ok(documents)
    }
}
