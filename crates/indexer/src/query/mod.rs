//! Elasticsearch query generation.
//!
//! - [`builder`] - criterion tree to Query DSL
//! - [`geo_shape`] - geometry shapes
//! - [`request`] - full search bodies (paging, sort, facets, source filtering)

pub mod builder;
pub mod geo_shape;
pub mod request;

pub use builder::{QueryBuilder, QueryDoc, build_query};
pub use request::SearchRequest;
