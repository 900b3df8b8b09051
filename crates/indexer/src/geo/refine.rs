//! Exact distance checks for hits falling between the lower and upper bound
//! of a rewritten circle.
//!
//! Edges are sampled at ten evenly spaced positions (both ends included)
//! rather than solved exactly, which is precise enough for the annulus widths
//! the circle rewrite produces.

use geo::{Contains, LineString, Point, Polygon};
use serde_json::Value;

use super::geodesy::distance;
use super::{LonLat, ReferenceBody};

const POSITIONS_PER_EDGE: usize = 10;

/// A document geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(LonLat),
    /// An open path.
    LineString(Vec<LonLat>),
    /// Outer ring then holes.
    Polygon(Vec<Vec<LonLat>>),
}

impl Geometry {
    /// Reads a GeoJSON `Point`, `LineString` or `Polygon` object.
    pub fn from_geojson(value: &Value) -> Option<Self> {
        let coordinates = value.get("coordinates")?;
        match value.get("type")?.as_str()? {
            "Point" => Some(Geometry::Point(position(coordinates)?)),
            "LineString" => Some(Geometry::LineString(positions(coordinates)?)),
            "Polygon" => Some(Geometry::Polygon(
                coordinates
                    .as_array()?
                    .iter()
                    .map(positions)
                    .collect::<Option<Vec<_>>>()?,
            )),
            _ => None,
        }
    }
}

fn position(value: &Value) -> Option<LonLat> {
    let pair = value.as_array()?;
    Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
}

fn positions(value: &Value) -> Option<Vec<LonLat>> {
    value.as_array()?.iter().map(position).collect()
}

/// Distance in meters from `point` to `geometry` on `body`.
///
/// A point inside a polygon is at distance zero.
pub fn distance_to(geometry: &Geometry, point: LonLat, body: &ReferenceBody) -> f64 {
    match geometry {
        Geometry::Point(p) => distance(body, *p, point),
        Geometry::LineString(path) => path_distance(path, false, point, body),
        Geometry::Polygon(rings) => {
            if polygon_contains(rings, point) {
                return 0.0;
            }
            rings
                .iter()
                .map(|ring| path_distance(ring, true, point, body))
                .fold(f64::INFINITY, f64::min)
        }
    }
}

/// True if `geometry` comes within `meters` of `point`.
pub fn is_nearer(geometry: &Geometry, point: LonLat, meters: f64, body: &ReferenceBody) -> bool {
    distance_to(geometry, point, body) <= meters
}

fn path_distance(path: &[LonLat], closed: bool, point: LonLat, body: &ReferenceBody) -> f64 {
    match path {
        [] => f64::INFINITY,
        [single] => distance(body, *single, point),
        _ => {
            let closing = if closed && path.first() != path.last() {
                Some((path[path.len() - 1], path[0]))
            } else {
                None
            };
            path.windows(2)
                .map(|edge| (edge[0], edge[1]))
                .chain(closing)
                .flat_map(|(from, to)| edge_positions(from, to))
                .map(|p| distance(body, p, point))
                .fold(f64::INFINITY, f64::min)
        }
    }
}

fn edge_positions(from: LonLat, to: LonLat) -> impl Iterator<Item = LonLat> {
    let steps = (POSITIONS_PER_EDGE - 1) as f64;
    let lon_step = (to[0] - from[0]) / steps;
    let lat_step = (to[1] - from[1]) / steps;
    (0..POSITIONS_PER_EDGE).map(move |n| {
        if n == POSITIONS_PER_EDGE - 1 {
            to
        } else {
            [from[0] + n as f64 * lon_step, from[1] + n as f64 * lat_step]
        }
    })
}

fn polygon_contains(rings: &[Vec<LonLat>], point: LonLat) -> bool {
    let mut rings = rings.iter().map(|ring| {
        LineString::from(
            ring.iter()
                .map(|&[lon, lat]| (lon, lat))
                .collect::<Vec<(f64, f64)>>(),
        )
    });
    let Some(exterior) = rings.next() else {
        return false;
    };
    Polygon::new(exterior, rings.collect()).contains(&Point::new(point[0], point[1]))
}
