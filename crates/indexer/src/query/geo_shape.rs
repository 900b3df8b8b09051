//! geo_shape clause rendering.
//!
//! Polygons are sent with `orientation: right` (counter-clockwise outer
//! rings), which also makes Elasticsearch read longitudes past 180 as a
//! continuation across the antimeridian instead of folding them back.

use serde_json::{Value, json};

use crate::geo::LonLat;

/// Spatial relation used for every geometry criterion.
pub const RELATION: &str = "intersects";

/// Polygon orientation sent to the engine.
pub const ORIENTATION: &str = "right";

/// Wraps a shape into a `geo_shape` query on `field`.
pub fn geo_shape_clause(field: &str, shape: Value) -> Value {
    json!({
        "geo_shape": {
            field: {
                "shape": shape,
                "relation": RELATION,
            }
        }
    })
}

/// A polygon shape with closed rings.
pub fn polygon_shape(rings: &[Vec<LonLat>]) -> Value {
    let rings: Vec<Vec<LonLat>> = rings.iter().map(|ring| closed_ring(ring)).collect();
    json!({
        "type": "polygon",
        "orientation": ORIENTATION,
        "coordinates": rings,
    })
}

/// A bounding box rendered as a counter-clockwise polygon.
pub fn bbox_shape(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
    polygon_shape(&[vec![
        [min_x, min_y],
        [max_x, min_y],
        [max_x, max_y],
        [min_x, max_y],
        [min_x, min_y],
    ]])
}

/// A circle shape; `radius` is passed through (e.g. `"50m"`).
pub fn circle_shape(center: LonLat, radius: &str) -> Value {
    json!({
        "type": "circle",
        "coordinates": center,
        "radius": radius,
    })
}

fn closed_ring(ring: &[LonLat]) -> Vec<LonLat> {
    let mut closed = ring.to_vec();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            closed.push(*first);
        }
    }
    closed
}
