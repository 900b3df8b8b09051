//! Planar correction of polygons and bounding boxes.
//!
//! The engine reads latitudes as positions on its sphere and joins vertices
//! with straight edges in longitude/latitude space. Before a polygon or box
//! is sent, it is widened by the gap between geodetic and geocentric latitude
//! so that it still covers the area meant on the ellipsoid. Rings crossing the
//! antimeridian are unwrapped into a continuous longitude range, and rings
//! encircling a pole are closed over it.

use geo::{Area, LineString, Polygon, Winding};

use crate::config::IndexerConfig;
use crate::criterion::Criterion;
use crate::error::{GeoResult, GeometryError, IllegalArgument, IndexerResult};

use super::geodesy::{latitude_discrepancy, max_latitude_discrepancy};
use super::{LonLat, ReferenceBody};

/// Corrects polygon and bounding box leaves for one reference body.
#[derive(Debug, Clone)]
pub struct GeoPlanarCorrector {
    body: ReferenceBody,
}

impl GeoPlanarCorrector {
    /// Creates a corrector for `body`, which must pass validation.
    pub fn new(body: ReferenceBody) -> Result<Self, IllegalArgument> {
        body.validate()?;
        Ok(Self { body })
    }

    /// Creates a corrector for the configured body.
    pub fn from_config(config: &IndexerConfig) -> IndexerResult<Self> {
        Ok(Self::new(config.body()?)?)
    }

    /// The reference body.
    pub fn body(&self) -> &ReferenceBody {
        &self.body
    }

    /// Corrects every polygon and bounding box of the tree.
    ///
    /// Circles and non-geometry leaves are copied unchanged.
    pub fn correct(&self, criterion: &Criterion) -> IndexerResult<Criterion> {
        criterion.try_map_leaves(&mut |leaf: &Criterion| -> IndexerResult<Criterion> {
            match leaf {
                Criterion::BoundingBox {
                    min_x,
                    min_y,
                    max_x,
                    max_y,
                } => Ok(self.correct_bbox(*min_x, *min_y, *max_x, *max_y)?),
                Criterion::Polygon { rings } => Ok(self.correct_polygon(rings)?),
                other => Ok(other.clone()),
            }
        })
    }

    /// Corrects a bounding box.
    ///
    /// The latitude extent grows by the largest latitude discrepancy inside
    /// it. A box with `min_x > max_x` crosses the antimeridian and gets
    /// `max_x + 360`; bodies without wrap-around reject it.
    pub fn correct_bbox(
        &self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> GeoResult<Criterion> {
        check_coordinate([min_x, min_y])?;
        check_coordinate([max_x, max_y])?;
        if min_y > max_y {
            return Err(GeometryError::InvertedBbox { min_y, max_y });
        }

        let crosses_antimeridian = min_x > max_x;
        if crosses_antimeridian && !self.body.requires_pole_handling {
            return Err(GeometryError::UnhandledAntimeridian {
                min_x,
                max_x,
                body: self.body.name.to_string(),
            });
        }
        if self.body.is_spherical() && !crosses_antimeridian {
            return Ok(Criterion::BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }

        let delta = if self.body.is_spherical() {
            0.0
        } else {
            max_latitude_discrepancy(&self.body, min_y, max_y)
        };
        let max_x = if crosses_antimeridian {
            tracing::debug!(
                "Bounding box crosses the antimeridian, max_x {} -> {}",
                max_x,
                max_x + 360.0
            );
            max_x + 360.0
        } else {
            max_x
        };
        tracing::debug!(
            "Widening bounding box latitudes by {} degrees on {}",
            delta,
            self.body
        );

        Ok(Criterion::BoundingBox {
            min_x,
            min_y: (min_y - delta).max(-90.0),
            max_x,
            max_y: (max_y + delta).min(90.0),
        })
    }

    /// Corrects every ring of a polygon.
    pub fn correct_polygon(&self, rings: &[Vec<LonLat>]) -> GeoResult<Criterion> {
        let corrected = rings
            .iter()
            .enumerate()
            .map(|(index, ring)| self.correct_ring(index, ring))
            .collect::<GeoResult<Vec<_>>>()?;
        Ok(Criterion::Polygon { rings: corrected })
    }

    fn correct_ring(&self, index: usize, ring: &[LonLat]) -> GeoResult<Vec<LonLat>> {
        if ring.is_empty() {
            return Err(GeometryError::EmptyRing { ring: index });
        }
        for vertex in ring {
            check_coordinate(*vertex)?;
        }

        let closed = ring.len() > 1 && ring.first() == ring.last();
        let open = if closed { &ring[..ring.len() - 1] } else { ring };
        let distinct = distinct_vertices(open);
        if distinct < 3 {
            return Err(GeometryError::TooFewVertices {
                ring: index,
                distinct,
            });
        }

        let unwrapped = unwrap_longitudes(open);
        let pole = encircled_pole(&unwrapped);
        if pole.is_some() && !self.body.requires_pole_handling {
            return Err(GeometryError::UnhandledPole {
                body: self.body.name.to_string(),
            });
        }
        let working = if self.body.requires_pole_handling {
            unwrapped
        } else {
            open.to_vec()
        };

        if self.body.is_spherical() && pole.is_none() && working == open {
            if ring_area(&working) == 0.0 {
                return Err(GeometryError::DegenerateRing { ring: index });
            }
            return Ok(ring.to_vec());
        }

        let winding = if pole.is_none() {
            if ring_area(&working) == 0.0 {
                return Err(GeometryError::DegenerateRing { ring: index });
            }
            winding_order(&working)
        } else {
            None
        };

        let mut corrected = self.push_latitudes(&working);

        if let Some(pole_lat) = pole {
            close_over_pole(&mut corrected, pole_lat);
            tracing::debug!(
                "Polygon ring {} encircles the pole at latitude {}",
                index,
                pole_lat
            );
            if ring_area(&corrected) == 0.0 {
                return Err(GeometryError::DegenerateRing { ring: index });
            }
        } else if winding_order(&corrected) != winding {
            return Err(GeometryError::WindingChanged { ring: index });
        }

        if closed {
            corrected.push(corrected[0]);
        }
        Ok(corrected)
    }

    /// Moves each vertex away from the ring's mid-latitude by its own latitude
    /// discrepancy.
    fn push_latitudes(&self, ring: &[LonLat]) -> Vec<LonLat> {
        if self.body.is_spherical() {
            return ring.to_vec();
        }
        let (min_lat, max_lat) = ring
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(v[1]), max.max(v[1]))
            });
        let mid = (min_lat + max_lat) / 2.0;

        ring.iter()
            .map(|&[lon, lat]| {
                let delta = latitude_discrepancy(&self.body, lat);
                let lat = if lat > mid {
                    (lat + delta).min(90.0)
                } else if lat < mid {
                    (lat - delta).max(-90.0)
                } else {
                    lat
                };
                [lon, lat]
            })
            .collect()
    }
}

/// Corrects every polygon and bounding box of `criterion` for `body`.
pub fn correct_for_ellipsoid(
    criterion: &Criterion,
    body: &ReferenceBody,
) -> IndexerResult<Criterion> {
    GeoPlanarCorrector::new(*body)?.correct(criterion)
}

fn check_coordinate([lon, lat]: LonLat) -> GeoResult<()> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 360.0 {
        return Err(GeometryError::InvalidCoordinate { lon, lat });
    }
    Ok(())
}

fn distinct_vertices(ring: &[LonLat]) -> usize {
    let mut keys: Vec<(u64, u64)> = ring
        .iter()
        .map(|[lon, lat]| (lon.to_bits(), lat.to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

/// Shifts each longitude by a multiple of 360 so that no step exceeds 180
/// degrees. The first vertex is kept as is.
fn unwrap_longitudes(ring: &[LonLat]) -> Vec<LonLat> {
    let mut unwrapped = Vec::with_capacity(ring.len());
    let mut previous = ring[0][0];
    for (i, &[lon, lat]) in ring.iter().enumerate() {
        let turns = ((previous - lon) / 360.0).round();
        let shifted = lon + turns * 360.0;
        if i > 0 && turns != 0.0 {
            tracing::trace!("Unwrapping vertex {} longitude {} -> {}", i, lon, shifted);
        }
        unwrapped.push([shifted, lat]);
        previous = shifted;
    }
    unwrapped
}

/// Latitude of the pole an unwrapped ring winds around, if any.
fn encircled_pole(unwrapped: &[LonLat]) -> Option<f64> {
    let first = unwrapped[0][0];
    let last = unwrapped[unwrapped.len() - 1][0];
    let closing = last - first;
    let closing = closing - (closing / 360.0).round() * 360.0;
    // Walking the ring then closing it adds up to a full turn
    if (last - first - closing).abs() < 180.0 {
        return None;
    }
    let mean_lat = unwrapped.iter().map(|v| v[1]).sum::<f64>() / unwrapped.len() as f64;
    Some(if mean_lat >= 0.0 { 90.0 } else { -90.0 })
}

/// Appends the detour over the pole that closes a ring winding around it.
fn close_over_pole(ring: &mut Vec<LonLat>, pole_lat: f64) {
    let [first_lon, first_lat] = ring[0];
    let last_lon = ring[ring.len() - 1][0];
    let turns = ((last_lon - first_lon) / 360.0).round();
    let end_lon = first_lon + turns * 360.0;
    ring.push([end_lon, first_lat]);
    ring.push([end_lon, pole_lat]);
    ring.push([first_lon, pole_lat]);
}

fn to_polygon(ring: &[LonLat]) -> Polygon<f64> {
    let coords: Vec<(f64, f64)> = ring.iter().map(|&[lon, lat]| (lon, lat)).collect();
    Polygon::new(LineString::from(coords), vec![])
}

fn ring_area(ring: &[LonLat]) -> f64 {
    to_polygon(ring).unsigned_area()
}

fn winding_order(ring: &[LonLat]) -> Option<geo::winding_order::WindingOrder> {
    to_polygon(ring).exterior().winding_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::builders::{and, intersects_bbox, intersects_circle, intersects_polygon};

    fn bbox_parts(criterion: &Criterion) -> (f64, f64, f64, f64) {
        match criterion {
            Criterion::BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            } => (*min_x, *min_y, *max_x, *max_y),
            other => panic!("expected a bounding box, found {:?}", other),
        }
    }

    fn polygon_rings(criterion: &Criterion) -> &Vec<Vec<LonLat>> {
        match criterion {
            Criterion::Polygon { rings } => rings,
            other => panic!("expected a polygon, found {:?}", other),
        }
    }

    #[test]
    fn test_bbox_identity_on_sphere() {
        for body in [ReferenceBody::ASTRO, ReferenceBody::MARS_SPHERE] {
            let bbox = intersects_bbox(-10.0, 20.0, 30.0, 50.0);
            assert_eq!(correct_for_ellipsoid(&bbox, &body).unwrap(), bbox);
        }
    }

    #[test]
    fn test_bbox_widens_latitudes_on_ellipsoid() {
        for body in [ReferenceBody::WGS_84, ReferenceBody::MARS_49900] {
            let corrected =
                correct_for_ellipsoid(&intersects_bbox(-10.0, 20.0, 30.0, 50.0), &body).unwrap();
            let (min_x, min_y, max_x, max_y) = bbox_parts(&corrected);
            assert_eq!(min_x, -10.0);
            assert_eq!(max_x, 30.0);
            assert!(min_y < 20.0);
            assert!(max_y > 50.0);
        }
    }

    #[test]
    fn test_bbox_antimeridian() {
        let corrected = correct_for_ellipsoid(
            &intersects_bbox(170.0, -10.0, -170.0, 10.0),
            &ReferenceBody::WGS_84,
        )
        .unwrap();
        let (min_x, _, max_x, _) = bbox_parts(&corrected);
        assert_eq!(min_x, 170.0);
        assert_eq!(max_x, 190.0);
    }

    #[test]
    fn test_bbox_antimeridian_without_wrap_around_fails() {
        let body = ReferenceBody::new("NO_POLES", 6_378_137.0, 1.0 / 298.257_223_563, false);
        let corrector = GeoPlanarCorrector::new(body).unwrap();
        assert!(matches!(
            corrector.correct_bbox(170.0, -10.0, -170.0, 10.0),
            Err(GeometryError::UnhandledAntimeridian { min_x, max_x, .. })
                if min_x == 170.0 && max_x == -170.0
        ));

        // Ordinary boxes still go through
        assert!(corrector.correct_bbox(-170.0, -10.0, 170.0, 10.0).is_ok());
    }

    #[test]
    fn test_bbox_validation() {
        let corrector = GeoPlanarCorrector::new(ReferenceBody::WGS_84).unwrap();
        assert!(matches!(
            corrector.correct_bbox(0.0, 10.0, 1.0, -10.0),
            Err(GeometryError::InvertedBbox { .. })
        ));
        assert!(matches!(
            corrector.correct_bbox(0.0, -95.0, 1.0, 10.0),
            Err(GeometryError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            corrector.correct_bbox(f64::NAN, 0.0, 1.0, 10.0),
            Err(GeometryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_polygon_antimeridian_unwrapping() {
        let polygon = intersects_polygon(vec![vec![
            [170.0, 20.0],
            [-170.0, 20.0],
            [-170.0, 60.0],
            [170.0, 60.0],
        ]]);
        let corrected = correct_for_ellipsoid(&polygon, &ReferenceBody::WGS_84).unwrap();
        let ring = &polygon_rings(&corrected)[0];
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[1][0], 190.0);
        for pair in ring.windows(2) {
            assert!((pair[1][0] - pair[0][0]).abs() <= 180.0);
        }
        assert!(ring[0][1] < 20.0);
        assert!(ring[2][1] > 60.0);
        assert_eq!(
            winding_order(ring),
            winding_order(&[[170.0, 20.0], [190.0, 20.0], [190.0, 60.0], [170.0, 60.0]])
        );
    }

    #[test]
    fn test_closed_ring_stays_closed() {
        let polygon = intersects_polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]]);
        let corrected = correct_for_ellipsoid(&polygon, &ReferenceBody::WGS_84).unwrap();
        let ring = &polygon_rings(&corrected)[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_sphere_fast_path() {
        let polygon = intersects_polygon(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]]);
        assert_eq!(
            correct_for_ellipsoid(&polygon, &ReferenceBody::ASTRO).unwrap(),
            polygon
        );
    }

    #[test]
    fn test_pole_closure() {
        let polygon = intersects_polygon(vec![vec![
            [0.0, 80.0],
            [90.0, 80.0],
            [180.0, 80.0],
            [-90.0, 80.0],
        ]]);
        let corrected = correct_for_ellipsoid(&polygon, &ReferenceBody::WGS_84).unwrap();
        let ring = &polygon_rings(&corrected)[0];
        assert_eq!(ring.len(), 7);
        assert_eq!(ring[3][0], 270.0);
        assert_eq!(ring[4], [360.0, 80.0]);
        assert_eq!(ring[5], [360.0, 90.0]);
        assert_eq!(ring[6], [0.0, 90.0]);
    }

    #[test]
    fn test_pole_without_handling_fails() {
        let body = ReferenceBody::new("NO_POLES", 6_378_137.0, 1.0 / 298.257_223_563, false);
        let polygon = intersects_polygon(vec![vec![
            [0.0, -80.0],
            [120.0, -80.0],
            [-120.0, -80.0],
        ]]);
        assert!(matches!(
            correct_for_ellipsoid(&polygon, &body),
            Err(crate::error::IndexerError::Geometry(
                GeometryError::UnhandledPole { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_rings() {
        let corrector = GeoPlanarCorrector::new(ReferenceBody::WGS_84).unwrap();
        assert!(matches!(
            corrector.correct_polygon(&[vec![]]),
            Err(GeometryError::EmptyRing { ring: 0 })
        ));
        assert!(matches!(
            corrector.correct_polygon(&[vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            Err(GeometryError::TooFewVertices { distinct: 2, .. })
        ));
        assert!(matches!(
            corrector.correct_polygon(&[vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]]),
            Err(GeometryError::DegenerateRing { ring: 0 })
        ));
        assert!(matches!(
            corrector.correct_polygon(&[vec![[0.0, 0.0], [1.0, 91.0], [2.0, 2.0]]]),
            Err(GeometryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_circles_pass_through() {
        let tree = and([
            intersects_circle([45.0, 45.0], "50m"),
            intersects_bbox(0.0, 0.0, 1.0, 1.0),
        ]);
        let corrected = correct_for_ellipsoid(&tree, &ReferenceBody::WGS_84).unwrap();
        let Criterion::And(children) = corrected else {
            panic!("expected an and");
        };
        assert_eq!(children[0], intersects_circle([45.0, 45.0], "50m"));
        assert_ne!(children[1], intersects_bbox(0.0, 0.0, 1.0, 1.0));
    }
}
