//! Indexer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IndexerResult;
use crate::geo::ReferenceBody;
use crate::geo::circle::{DEFAULT_BEARING_SAMPLES, DEFAULT_ENGINE_RADIUS};

/// Configuration for query building and geo rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Name of the reference body the indexed geometries use (default: `"WGS_84"`).
    #[serde(default = "default_reference_body")]
    pub reference_body: String,

    /// Document field holding the geo_shape (default: `"geometry"`).
    #[serde(default = "default_geometry_field")]
    pub geometry_field: String,

    /// Sphere radius in meters the engine evaluates circles on
    /// (default: 6371008.7714, the Elasticsearch mean Earth radius).
    #[serde(default = "default_engine_sphere_radius")]
    pub engine_sphere_radius: f64,

    /// Bearings sampled when bounding a circle (default: 16).
    #[serde(default = "default_circle_bearing_samples")]
    pub circle_bearing_samples: u32,

    /// Page size when none is requested (default: 20).
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Maximum `from + size` of a request (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Buckets returned by string facets (default: 10).
    #[serde(default = "default_facet_terms_size")]
    pub facet_terms_size: u32,

    /// Request timeout in milliseconds for repository implementations (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_reference_body() -> String {
    ReferenceBody::WGS_84.name.to_string()
}

fn default_geometry_field() -> String {
    "geometry".to_string()
}

fn default_engine_sphere_radius() -> f64 {
    DEFAULT_ENGINE_RADIUS
}

fn default_circle_bearing_samples() -> u32 {
    DEFAULT_BEARING_SAMPLES
}

fn default_page_size() -> u32 {
    20
}

fn default_max_result_window() -> u32 {
    10000
}

fn default_facet_terms_size() -> u32 {
    10
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            reference_body: default_reference_body(),
            geometry_field: default_geometry_field(),
            engine_sphere_radius: default_engine_sphere_radius(),
            circle_bearing_samples: default_circle_bearing_samples(),
            default_page_size: default_page_size(),
            max_result_window: default_max_result_window(),
            facet_terms_size: default_facet_terms_size(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl IndexerConfig {
    /// Resolves and validates the configured reference body.
    pub fn body(&self) -> IndexerResult<ReferenceBody> {
        let body = ReferenceBody::lookup(&self.reference_body)?;
        body.validate()?;
        Ok(body)
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
