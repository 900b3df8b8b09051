//! Circle rewriting.
//!
//! Elasticsearch evaluates a `circle` shape on its own sphere, using the
//! coordinates as given. A geodesic circle of the reference body maps onto
//! that sphere as a slightly irregular ring, so a single engine circle can
//! only bound it from inside or outside. The rewriter measures, for a set of
//! bearings, how far the true boundary lands from the center on the engine
//! sphere, refines the extremes between bearings and turns the spread into
//! two criteria:
//!
//! - the lower bound: an engine circle fully inside the true disk
//! - the upper bound: the lower circle, or the annulus up to an engine circle
//!   fully containing the true disk; hits in the annulus need an exact check
//!
//! On the equator, the poles and on spherical bodies both bounds collapse to
//! one circle and the two returned trees are structurally equal. Under a
//! `Not` the bounds of the child swap places.

use crate::config::IndexerConfig;
use crate::criterion::Criterion;
use crate::criterion::builders::{and, intersects_circle, not, or};
use crate::error::{GeometryError, IllegalArgument, IndexerResult};

use super::geodesy::{self, central_angle, destination, format_meters};
use super::{LonLat, ReferenceBody};

/// Elasticsearch mean Earth radius, used for every `circle` shape.
pub const DEFAULT_ENGINE_RADIUS: f64 = 6_371_008.771_4;

/// Bearings sampled around the center (every 22.5 degrees).
pub const DEFAULT_BEARING_SAMPLES: u32 = 16;

const AXIS_TOLERANCE_DEGREES: f64 = 1e-9;
const COLLAPSE_RELATIVE_TOLERANCE: f64 = 1e-12;
const EXTREMUM_ITERATIONS: usize = 60;

/// Engine radii bounding one geodesic circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleBounds {
    /// Circle center, `[lon, lat]`.
    pub center: LonLat,
    /// The requested geodesic radius in meters.
    pub geodesic_meters: f64,
    /// Largest engine radius fully inside the geodesic circle.
    pub lower_meters: f64,
    /// Smallest engine radius fully containing the geodesic circle.
    pub upper_meters: f64,
}

impl CircleBounds {
    /// True when a single engine circle represents the geodesic one.
    pub fn is_collapsed(&self) -> bool {
        self.lower_meters == self.upper_meters
    }
}

/// Rewrites circle leaves into lower/upper bound criteria for one body.
#[derive(Debug, Clone)]
pub struct GeoCircleRewriter {
    body: ReferenceBody,
    engine_radius: f64,
    bearing_samples: u32,
    strict_bounds: bool,
}

impl GeoCircleRewriter {
    /// Creates a rewriter for `body`, which must pass validation.
    pub fn new(body: ReferenceBody) -> Result<Self, IllegalArgument> {
        body.validate()?;
        Ok(Self {
            body,
            engine_radius: DEFAULT_ENGINE_RADIUS,
            bearing_samples: DEFAULT_BEARING_SAMPLES,
            strict_bounds: false,
        })
    }

    /// Creates a rewriter from configuration.
    pub fn from_config(config: &IndexerConfig) -> IndexerResult<Self> {
        Ok(Self::new(config.body()?)?
            .with_engine_radius(config.engine_sphere_radius)
            .with_bearing_samples(config.circle_bearing_samples))
    }

    /// Sets the sphere radius the engine evaluates circles on.
    pub fn with_engine_radius(mut self, radius: f64) -> Self {
        self.engine_radius = radius;
        self
    }

    /// Sets how many bearings are sampled (at least 1).
    pub fn with_bearing_samples(mut self, samples: u32) -> Self {
        self.bearing_samples = samples.max(1);
        self
    }

    /// Keeps the sampled lower radius for circles on the equator instead of
    /// collapsing both bounds onto the upper one.
    ///
    /// With strict bounds the lower circle never reaches outside the
    /// geodesic disk.
    pub fn with_strict_bounds(mut self, strict: bool) -> Self {
        self.strict_bounds = strict;
        self
    }

    /// The reference body.
    pub fn body(&self) -> &ReferenceBody {
        &self.body
    }

    /// Computes the engine radii bounding the geodesic circle.
    pub fn circle_bounds(&self, center: LonLat, radius: &str) -> IndexerResult<CircleBounds> {
        let meters = geodesy::to_meters(radius)?;
        let [lon, lat] = center;
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return Err(GeometryError::InvalidCoordinate { lon, lat }.into());
        }

        let (lower, upper) = if self.body.is_spherical() {
            let engine = meters / self.body.semi_major_axis * self.engine_radius;
            (engine, engine)
        } else {
            self.sample_engine_radii(center, meters)
        };

        let on_axis = !self.strict_bounds
            && (lat.abs() <= AXIS_TOLERANCE_DEGREES || lat.abs() >= 90.0 - AXIS_TOLERANCE_DEGREES);
        let (lower, upper) = if on_axis || upper - lower <= COLLAPSE_RELATIVE_TOLERANCE * upper {
            (upper, upper)
        } else {
            (lower, upper)
        };

        tracing::debug!(
            "Circle {:?} radius {} m on {}: engine radii [{}, {}]",
            center,
            meters,
            self.body,
            lower,
            upper
        );

        Ok(CircleBounds {
            center,
            geodesic_meters: meters,
            lower_meters: lower,
            upper_meters: upper,
        })
    }

    fn sample_engine_radii(&self, center: LonLat, meters: f64) -> (f64, f64) {
        // Every bearing from a pole follows a meridian
        if center[1].abs() >= 90.0 - AXIS_TOLERANCE_DEGREES {
            let radius = self.engine_distance(center, 0.0, meters);
            return (radius, radius);
        }

        let count = self.bearing_samples as usize;
        let step = 360.0 / f64::from(self.bearing_samples);
        let samples: Vec<f64> = (0..self.bearing_samples)
            .map(|i| self.engine_distance(center, f64::from(i) * step, meters))
            .collect();

        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for (i, &radius) in samples.iter().enumerate() {
            lower = lower.min(radius);
            upper = upper.max(radius);
            if count < 3 {
                continue;
            }

            // Extremes between two bearings are searched around each local one
            let previous = samples[(i + count - 1) % count];
            let next = samples[(i + 1) % count];
            let bearing = i as f64 * step;
            if radius <= previous && radius <= next {
                lower = lower.min(self.search_extremum(center, meters, bearing, step, 1.0));
            }
            if radius >= previous && radius >= next {
                upper = upper.max(self.search_extremum(center, meters, bearing, step, -1.0));
            }
        }
        (lower, upper)
    }

    /// Ternary search of the engine distance over `bearing ± step`, minimizing
    /// `sign * distance`.
    fn search_extremum(
        &self,
        center: LonLat,
        meters: f64,
        bearing: f64,
        step: f64,
        sign: f64,
    ) -> f64 {
        let cost = |b: f64| sign * self.engine_distance(center, b, meters);
        let (mut low, mut high) = (bearing - step, bearing + step);
        for _ in 0..EXTREMUM_ITERATIONS {
            let left = low + (high - low) / 3.0;
            let right = high - (high - low) / 3.0;
            if cost(left) < cost(right) {
                high = right;
            } else {
                low = left;
            }
        }
        self.engine_distance(center, (low + high) / 2.0, meters)
    }

    /// Engine sphere distance from `center` to the geodesic boundary point at
    /// `bearing`. The engine reads both coordinates as given.
    fn engine_distance(&self, center: LonLat, bearing: f64, meters: f64) -> f64 {
        let boundary = destination(&self.body, center, bearing, meters);
        central_angle(center, boundary) * self.engine_radius
    }

    /// Rewrites a single circle leaf.
    ///
    /// Fails with [`IllegalArgument::UnexpectedCriterion`] for any other node.
    pub fn rewrite_circle(&self, criterion: &Criterion) -> IndexerResult<(Criterion, Criterion)> {
        let Criterion::Circle { center, radius } = criterion else {
            return Err(IllegalArgument::UnexpectedCriterion {
                expected: "circle",
                found: criterion.kind_name(),
            }
            .into());
        };

        let bounds = self.circle_bounds(*center, radius)?;
        let upper_leaf = intersects_circle(*center, format_meters(bounds.upper_meters));
        if bounds.is_collapsed() {
            return Ok((upper_leaf.clone(), upper_leaf));
        }

        let lower_leaf = intersects_circle(*center, format_meters(bounds.lower_meters));
        let upper = or([
            lower_leaf.clone(),
            and([not(lower_leaf.clone()), upper_leaf]),
        ]);
        Ok((lower_leaf, upper))
    }

    /// Rewrites every circle leaf of the tree.
    ///
    /// Returns `(lower_bound, upper_bound)`. Other leaves are copied into both
    /// trees; combinators keep their type and child order. A `Not` wraps the
    /// child's upper bound in the lower tree and its lower bound in the upper
    /// tree.
    pub fn rewrite(&self, criterion: &Criterion) -> IndexerResult<(Criterion, Criterion)> {
        match criterion {
            Criterion::And(children) => {
                let (lower, upper) = self.rewrite_children(children)?;
                Ok((Criterion::And(lower), Criterion::And(upper)))
            }
            Criterion::Or(children) => {
                let (lower, upper) = self.rewrite_children(children)?;
                Ok((Criterion::Or(lower), Criterion::Or(upper)))
            }
            Criterion::Not(child) => {
                let (lower, upper) = self.rewrite(child)?;
                Ok((not(upper), not(lower)))
            }
            Criterion::Circle { .. } => self.rewrite_circle(criterion),
            leaf => Ok((leaf.clone(), leaf.clone())),
        }
    }

    fn rewrite_children(
        &self,
        children: &[Criterion],
    ) -> IndexerResult<(Vec<Criterion>, Vec<Criterion>)> {
        let pairs = children
            .iter()
            .map(|child| self.rewrite(child))
            .collect::<IndexerResult<Vec<_>>>()?;
        Ok(pairs.into_iter().unzip())
    }
}

/// Rewrites every circle of `criterion` for `body` with the default engine
/// sphere and bearing sampling.
pub fn rewrite_circles(
    criterion: &Criterion,
    body: &ReferenceBody,
) -> IndexerResult<(Criterion, Criterion)> {
    GeoCircleRewriter::new(*body)?.rewrite(criterion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::builders::{attribute_exists, intersects_bbox};
    use crate::error::{IndexerError, ParseError};

    fn circle_radius(criterion: &Criterion) -> f64 {
        match criterion {
            Criterion::Circle { radius, .. } => geodesy::to_meters(radius).unwrap(),
            other => panic!("expected a circle, found {:?}", other),
        }
    }

    #[test]
    fn test_equator_and_poles_collapse() {
        for body in ReferenceBody::ALL {
            for center in [[10.0, 0.0], [0.0, 90.0], [-120.0, -90.0]] {
                let (lower, upper) =
                    rewrite_circles(&intersects_circle(center, "25km"), &body).unwrap();
                assert_eq!(lower, upper, "{} at {:?}", body, center);
                assert!(matches!(lower, Criterion::Circle { .. }));
            }
        }
    }

    #[test]
    fn test_mid_latitude_bounds_differ() {
        let rewriter = GeoCircleRewriter::new(ReferenceBody::WGS_84).unwrap();
        let bounds = rewriter.circle_bounds([45.0, 45.0], "50m").unwrap();
        assert!(bounds.lower_meters < bounds.upper_meters);
        assert!((bounds.upper_meters - 50.0).abs() < 0.5);

        let bounds = rewriter.circle_bounds([2.35, -30.0], "100km").unwrap();
        assert!(bounds.lower_meters < bounds.upper_meters);
    }

    #[test]
    fn test_bounds_contain_geodesic_boundary() {
        let cases = [
            (ReferenceBody::WGS_84, [45.0, 45.0], "500km"),
            (ReferenceBody::MARS_49900, [45.0, 45.0], "500km"),
            (ReferenceBody::WGS_84, [10.0, 70.0], "100km"),
            (ReferenceBody::WGS_84, [2.35, -30.0], "100km"),
            (ReferenceBody::MARS_49900, [-120.0, 12.5], "50m"),
        ];
        for (body, center, radius) in cases {
            let rewriter = GeoCircleRewriter::new(body).unwrap();
            let bounds = rewriter.circle_bounds(center, radius).unwrap();
            assert!(bounds.lower_meters < bounds.upper_meters);

            // The engine measures from the emitted center, as given
            let (lower, upper) = rewriter
                .rewrite_circle(&intersects_circle(center, radius))
                .unwrap();
            assert!(matches!(lower, Criterion::Circle { center: c, .. } if c == center));
            assert_eq!(circle_radius(&lower), bounds.lower_meters);

            let tolerance = 1e-6 * bounds.upper_meters;
            for i in 0..3600 {
                let bearing = f64::from(i) * 0.1;
                let boundary = destination(&body, center, bearing, bounds.geodesic_meters);
                let engine = central_angle(center, boundary) * DEFAULT_ENGINE_RADIUS;
                assert!(
                    engine >= bounds.lower_meters - tolerance
                        && engine <= bounds.upper_meters + tolerance,
                    "{} {:?} {}: {} outside [{}, {}]",
                    body,
                    center,
                    radius,
                    engine,
                    bounds.lower_meters,
                    bounds.upper_meters
                );
            }
            assert!(matches!(upper, Criterion::Or(_)));
        }
    }

    #[test]
    fn test_strict_bounds_keep_equator_spread() {
        let rewriter = GeoCircleRewriter::new(ReferenceBody::WGS_84).unwrap();
        let collapsed = rewriter.circle_bounds([10.0, 0.0], "25km").unwrap();
        assert!(collapsed.is_collapsed());

        let strict = rewriter.with_strict_bounds(true);
        let bounds = strict.circle_bounds([10.0, 0.0], "25km").unwrap();
        assert!(bounds.lower_meters < bounds.upper_meters);
        assert_eq!(bounds.upper_meters, collapsed.upper_meters);

        // Pole circles stay collapsed
        assert!(strict.circle_bounds([0.0, 90.0], "25km").unwrap().is_collapsed());
    }

    #[test]
    fn test_negated_circle_swaps_bounds() {
        let rewriter = GeoCircleRewriter::new(ReferenceBody::WGS_84).unwrap();
        let circle = intersects_circle([45.0, 45.0], "50km");
        let (inner, outer) = rewriter.rewrite_circle(&circle).unwrap();

        let (lower, upper) = rewriter.rewrite(&not(circle)).unwrap();
        assert_eq!(lower, not(outer));
        assert_eq!(upper, not(inner));
    }

    #[test]
    fn test_upper_bound_shape() {
        let (lower, upper) = rewrite_circles(
            &intersects_circle([45.0, 45.0], "50m"),
            &ReferenceBody::MARS_49900,
        )
        .unwrap();

        let lower_radius = circle_radius(&lower);
        let Criterion::Or(branches) = &upper else {
            panic!("expected an or, found {:?}", upper);
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0], lower);
        let Criterion::And(annulus) = &branches[1] else {
            panic!("expected an and, found {:?}", branches[1]);
        };
        assert_eq!(annulus[0], not(lower.clone()));
        assert!(circle_radius(&annulus[1]) > lower_radius);
    }

    #[test]
    fn test_spherical_body_collapses() {
        let (lower, upper) = rewrite_circles(
            &intersects_circle([45.0, 45.0], "50km"),
            &ReferenceBody::ASTRO,
        )
        .unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_tree_shape_preserved() {
        let tree = and([
            attribute_exists("properties.orbit"),
            not(intersects_circle([0.0, 0.0], "1km")),
            intersects_bbox(-1.0, -1.0, 1.0, 1.0),
        ]);
        let (lower, upper) = rewrite_circles(&tree, &ReferenceBody::WGS_84).unwrap();
        assert_eq!(lower, upper);
        let Criterion::And(children) = &lower else {
            panic!("expected an and");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], attribute_exists("properties.orbit"));
        assert!(matches!(children[1], Criterion::Not(_)));
        assert_eq!(children[2], intersects_bbox(-1.0, -1.0, 1.0, 1.0));
    }

    #[test]
    fn test_rewrite_circle_rejects_other_kinds() {
        let rewriter = GeoCircleRewriter::new(ReferenceBody::WGS_84).unwrap();
        let err = rewriter
            .rewrite_circle(&intersects_bbox(0.0, 0.0, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::IllegalArgument(IllegalArgument::UnexpectedCriterion {
                expected: "circle",
                found: "bounding box",
            })
        ));
    }

    #[test]
    fn test_invalid_body_and_radius() {
        let flat = ReferenceBody::new("FLAT", 0.0, 0.0, false);
        assert!(GeoCircleRewriter::new(flat).is_err());

        let err = rewrite_circles(
            &intersects_circle([1.0, 1.0], "ten km"),
            &ReferenceBody::WGS_84,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Parse(ParseError::InvalidRadius { .. })
        ));
    }
}
