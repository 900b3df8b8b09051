//! Geospatial support.
//!
//! The search engine evaluates geometries on a sphere with planar edges. The
//! modules here bridge that model and the reference body the data lives on:
//!
//! - [`body`] - reference body registry
//! - [`geodesy`] - geodesic distances and radius parsing
//! - [`circle`] - circle rewriting into lower/upper bound criteria
//! - [`planar`] - latitude, antimeridian and pole correction of polygons and boxes
//! - [`refine`] - exact in-memory distance checks

pub mod body;
pub mod circle;
pub mod geodesy;
pub mod planar;
pub mod refine;

pub use body::ReferenceBody;
pub use circle::{CircleBounds, GeoCircleRewriter, rewrite_circles};
pub use geodesy::{distance, to_meters};
pub use planar::{GeoPlanarCorrector, correct_for_ellipsoid};
pub use refine::{Geometry, distance_to, is_nearer};

/// A `[longitude, latitude]` pair in degrees.
pub type LonLat = [f64; 2];
