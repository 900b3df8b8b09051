//! Request and result types shared by the query builder and the repository
//! contract.
//!
//! - [`Pagination`], [`Page`], [`PageInfo`] - paging
//! - [`SortDirective`] - sorting
//! - [`FacetSpec`], [`Facet`] - facets
//! - [`SearchTarget`] - index and document types searched
//!
//! # Examples
//!
//! ```
//! use helios_indexer::types::{FacetSpec, FacetType, Pagination, SortDirective};
//!
//! let pagination = Pagination::page(2, 50);
//! assert_eq!(pagination.offset, 100);
//!
//! let sort = SortDirective::parse("-properties.start");
//! let facets = FacetSpec::new()
//!     .with_facet("properties.mission", FacetType::String)
//!     .with_facet("properties.start", FacetType::Date);
//! ```

mod facet;
mod pagination;
mod search;

pub use facet::{
    FACET_PERCENTILES, Facet, FacetSpec, FacetType, TermBucket, aggregation_name,
    percentiles_aggregation_name,
};
pub use pagination::{Page, PageInfo, Pagination};
pub use search::{SearchTarget, SortDirection, SortDirective};
