//! Helios Indexer
//!
//! This crate turns search criteria into Elasticsearch queries for catalogs of
//! planetary data. Elasticsearch evaluates geometries on a sphere, so criteria
//! over ellipsoidal bodies (Earth, Mars, ...) are rewritten before they reach
//! the engine.
//!
//! # Features
//!
//! - **Criterion algebra**: immutable, serializable predicate trees built with
//!   factory functions (`eq`, `between`, `intersects_circle`, ...)
//! - **Circle rewrite**: geodesic circles become lower and upper engine circles
//! - **Planar correction**: polygons and bounding boxes are widened for the
//!   body's flattening, unwrapped across the antimeridian and closed over poles
//! - **Query building**: Elasticsearch Query DSL and full search bodies with
//!   paging, sort, facets and source filtering
//! - **Refinement**: exact geodesic checks for hits between the two bounds
//!
//! # Architecture
//!
//! - [`criterion`] - The criterion tree and its factory functions
//! - [`geo`] - Reference bodies, geodesy, circle rewrite, planar correction
//! - [`query`] - Query DSL and search request generation
//! - [`plan`] - Two-phase geo search plans
//! - [`repository`] - The search repository contract
//! - [`types`] - Pagination, sorting, facets
//! - [`config`] - Configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use helios_indexer::{
//!     and, build_query, correct_for_ellipsoid, eq, intersects_polygon, ReferenceBody,
//! };
//!
//! let criterion = and([
//!     eq("properties.mission", "MEX"),
//!     intersects_polygon(vec![vec![
//!         [170.0, 20.0],
//!         [-170.0, 20.0],
//!         [-170.0, 60.0],
//!         [170.0, 60.0],
//!     ]]),
//! ]);
//!
//! // The ring crosses the antimeridian and is unwrapped past 180
//! let corrected = correct_for_ellipsoid(&criterion, &ReferenceBody::WGS_84).unwrap();
//! let query = build_query(&corrected);
//! assert!(query.as_value().to_string().contains("190.0"));
//! ```
//!
//! # Circles
//!
//! ```
//! use helios_indexer::{intersects_circle, GeoSearchPlan, IndexerConfig, ReferenceBody};
//!
//! let plan = GeoSearchPlan::build(
//!     &intersects_circle([45.0, 45.0], "50m"),
//!     &ReferenceBody::WGS_84,
//!     &IndexerConfig::default(),
//! )
//! .unwrap();
//!
//! // Accepted hits are certain; candidates need exact refinement
//! let accepted = plan.accepted_query();
//! let candidates = plan.candidate_query();
//! assert!(candidates.is_some());
//! # let _ = accepted;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod criterion;
pub mod error;
pub mod geo;
pub mod plan;
pub mod query;
pub mod repository;
pub mod types;

// Re-export commonly used types at crate root
pub use config::IndexerConfig;
pub use criterion::builders::*;
pub use criterion::{
    ComparisonOp, Criterion, CriterionValue, MatchKind, RangeBound, StringMatchType,
};
pub use error::{
    GeoResult, GeometryError, IllegalArgument, IndexerError, IndexerResult, ParseError,
};
pub use types::{
    Facet, FacetSpec, FacetType, Page, PageInfo, Pagination, SearchTarget, SortDirective,
};

// Re-export geometry operations
pub use geo::{
    CircleBounds, GeoCircleRewriter, GeoPlanarCorrector, Geometry, LonLat, ReferenceBody,
    correct_for_ellipsoid, distance, distance_to, is_nearer, rewrite_circles, to_meters,
};

// Re-export query generation
pub use plan::GeoSearchPlan;
pub use query::{QueryBuilder, QueryDoc, SearchRequest, build_query};
pub use repository::{Document, SearchRepository};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
