//! Catalog document and criterion fixtures.

use serde_json::{Value, json};

use helios_indexer::{Criterion, IndexerConfig, LonLat, and, eq, intersects_polygon};

/// A catalog document fixture.
#[derive(Debug, Clone)]
pub struct DocumentFixture {
    /// Product label.
    pub label: String,
    /// Mission acronym.
    pub mission: String,
    /// GeoJSON geometry, if any.
    pub geometry: Option<Value>,
}

impl DocumentFixture {
    /// Creates a document without geometry.
    pub fn new(label: impl Into<String>, mission: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mission: mission.into(),
            geometry: None,
        }
    }

    /// Sets a point geometry.
    pub fn at(mut self, position: LonLat) -> Self {
        self.geometry = Some(json!({ "type": "Point", "coordinates": position }));
        self
    }

    /// Sets a polygon geometry.
    pub fn covering(mut self, ring: Vec<LonLat>) -> Self {
        self.geometry = Some(json!({ "type": "Polygon", "coordinates": [ring] }));
        self
    }

    /// Builds the stored document.
    pub fn build(&self) -> Value {
        let mut document = json!({
            "type": "DATA",
            "properties": {
                "label": self.label,
                "mission": self.mission,
            }
        });
        if let Some(ref geometry) = self.geometry {
            document["geometry"] = geometry.clone();
        }
        document
    }
}

/// Configuration used by the integration tests.
pub fn test_config() -> IndexerConfig {
    IndexerConfig {
        default_page_size: 10,
        ..Default::default()
    }
}

/// A ring crossing the antimeridian between 20N and 60N.
pub fn antimeridian_ring() -> Vec<LonLat> {
    vec![[170.0, 20.0], [-170.0, 20.0], [-170.0, 60.0], [170.0, 60.0]]
}

/// Mission filter combined with an antimeridian polygon.
pub fn mission_over_antimeridian(mission: &str) -> Criterion {
    and([
        eq("properties.mission", mission),
        intersects_polygon(vec![antimeridian_ring()]),
    ])
}
