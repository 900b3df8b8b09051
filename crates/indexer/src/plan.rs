//! Two-phase geo search planning.
//!
//! The engine evaluates circles on a sphere, so a geodesic circle on an
//! ellipsoidal body is bracketed by two engine circles. Documents matched by
//! the lower-bound tree are certain hits. Documents matched by the
//! upper-bound tree but not by the lower one form a thin boundary band that
//! is checked exactly in memory with [`GeoSearchPlan::refine`].
//!
//! A band hit is decided by the one circle whose bounds differ, so a plan
//! accepts at most one such circle. A circle under a `Not` is refined with
//! the opposite outcome.

use serde_json::Value;

use crate::config::IndexerConfig;
use crate::criterion::Criterion;
use crate::criterion::builders::{and, not};
use crate::error::{IllegalArgument, IndexerResult};
use crate::geo::{GeoCircleRewriter, GeoPlanarCorrector, Geometry, LonLat, ReferenceBody, is_nearer};
use crate::query::{QueryBuilder, QueryDoc};

/// A criterion prepared for searching on a reference body.
#[derive(Debug, Clone)]
pub struct GeoSearchPlan {
    body: ReferenceBody,
    lower: Criterion,
    upper: Criterion,
    circle: Option<(LonLat, f64)>,
    negated: bool,
    builder: QueryBuilder,
    geometry_field: String,
}

impl GeoSearchPlan {
    /// Corrects polygons and bounding boxes of `criterion` for `body`, then
    /// rewrites its circles into lower and upper engine bounds.
    ///
    /// # Errors
    ///
    /// * `IndexerError::IllegalArgument` - If more than one circle has a
    ///   boundary band, or the body cannot be used for geometry
    /// * `IndexerError::Geometry` - If a polygon or bounding box is invalid
    /// * `IndexerError::Parse` - If a circle radius is malformed
    pub fn build(
        criterion: &Criterion,
        body: &ReferenceBody,
        config: &IndexerConfig,
    ) -> IndexerResult<Self> {
        let corrected = GeoPlanarCorrector::new(*body)?.correct(criterion)?;
        let rewriter = GeoCircleRewriter::new(*body)?
            .with_engine_radius(config.engine_sphere_radius)
            .with_bearing_samples(config.circle_bearing_samples)
            .with_strict_bounds(true);

        let mut first = None;
        let mut banded = Vec::new();
        for (leaf, negated) in corrected.signed_circles() {
            let Criterion::Circle { center, radius } = leaf else {
                continue;
            };
            let bounds = rewriter.circle_bounds(*center, radius)?;
            let circle = (*center, bounds.geodesic_meters);
            if first.is_none() {
                first = Some((circle, negated));
            }
            if !bounds.is_collapsed() {
                banded.push((circle, negated));
            }
        }
        if banded.len() > 1 {
            return Err(IllegalArgument::AmbiguousRefinement {
                circles: banded.len(),
            }
            .into());
        }
        let (circle, negated) = match banded.pop().or(first) {
            Some((circle, negated)) => (Some(circle), negated),
            None => (None, false),
        };

        let (lower, upper) = if circle.is_some() {
            rewriter.rewrite(&corrected)?
        } else {
            (corrected.clone(), corrected)
        };

        tracing::debug!(
            "Planned geo search on {}: circle {:?} (negated {}), boundary band {}",
            body,
            circle,
            negated,
            lower != upper
        );

        Ok(Self {
            body: *body,
            lower,
            upper,
            circle,
            negated,
            builder: QueryBuilder::from_config(config),
            geometry_field: config.geometry_field.clone(),
        })
    }

    /// Plans `criterion` on the body named in `config`.
    pub fn from_config(criterion: &Criterion, config: &IndexerConfig) -> IndexerResult<Self> {
        Self::build(criterion, &config.body()?, config)
    }

    /// The reference body.
    pub fn body(&self) -> &ReferenceBody {
        &self.body
    }

    /// The lower-bound tree.
    pub fn lower(&self) -> &Criterion {
        &self.lower
    }

    /// The upper-bound tree.
    pub fn upper(&self) -> &Criterion {
        &self.upper
    }

    /// True when some hits need exact refinement.
    pub fn has_boundary(&self) -> bool {
        self.circle.is_some() && self.lower != self.upper
    }

    /// Query whose every hit satisfies the criterion.
    pub fn accepted_query(&self) -> QueryDoc {
        self.builder.build(&self.lower)
    }

    /// Criterion of the boundary band: `And([upper, Not(lower)])`.
    pub fn candidate(&self) -> Option<Criterion> {
        self.has_boundary()
            .then(|| and([self.upper.clone(), not(self.lower.clone())]))
    }

    /// Query for hits of the boundary band, `None` when there is no band.
    pub fn candidate_query(&self) -> Option<QueryDoc> {
        self.candidate().map(|band| self.builder.build(&band))
    }

    /// Center and geodesic radius in meters of the circle deciding the
    /// boundary band, or of the first circle when no band exists.
    pub fn circle(&self) -> Option<(LonLat, f64)> {
        self.circle
    }

    /// True when the refined circle sits under an odd number of `Not` nodes.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Exact check of a boundary candidate against the refined circle.
    ///
    /// Always true when the plan has no circle.
    pub fn refine(&self, geometry: &Geometry) -> bool {
        match self.circle {
            Some((center, meters)) => {
                is_nearer(geometry, center, meters, &self.body) != self.negated
            }
            None => true,
        }
    }

    /// Refines a candidate document by its GeoJSON geometry field.
    ///
    /// Documents without a readable geometry are rejected.
    pub fn refine_document(&self, document: &Value) -> bool {
        match document.get(&self.geometry_field).and_then(Geometry::from_geojson) {
            Some(geometry) => self.refine(&geometry),
            None => {
                tracing::debug!("Candidate has no readable {} field", self.geometry_field);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::builders::{eq, intersects_circle, intersects_polygon, or};
    use crate::error::IndexerError;
    use serde_json::json;

    fn plan(criterion: &Criterion, body: ReferenceBody) -> GeoSearchPlan {
        GeoSearchPlan::build(criterion, &body, &IndexerConfig::default()).unwrap()
    }

    #[test]
    fn test_without_circle() {
        let criterion = and([
            eq("properties.mission", "MEX"),
            intersects_polygon(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]]),
        ]);
        let plan = plan(&criterion, ReferenceBody::WGS_84);
        assert!(plan.circle().is_none());
        assert!(plan.candidate_query().is_none());
        assert_eq!(plan.lower(), plan.upper());
        assert!(plan.refine(&Geometry::Point([100.0, 50.0])));
    }

    #[test]
    fn test_mid_latitude_circle_has_band() {
        let criterion = and([
            eq("properties.mission", "MEX"),
            intersects_circle([45.0, 45.0], "50km"),
        ]);
        let plan = plan(&criterion, ReferenceBody::WGS_84);
        let (center, meters) = plan.circle().unwrap();
        assert_eq!(center, [45.0, 45.0]);
        assert_eq!(meters, 50_000.0);

        let candidate = plan.candidate_query().unwrap().into_value();
        let must = candidate["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert!(must[1]["bool"]["must_not"].is_array());

        let accepted = plan.accepted_query().into_value();
        assert_eq!(accepted["bool"]["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_axis_circles() {
        // Equator circles keep a band so accepted hits stay inside the disk
        let equator = plan(&intersects_circle([10.0, 0.0], "5km"), ReferenceBody::MARS_49900);
        assert!(equator.has_boundary());

        let pole = plan(&intersects_circle([10.0, 90.0], "5km"), ReferenceBody::MARS_49900);
        assert!(pole.circle().is_some());
        assert!(!pole.has_boundary());
        assert!(pole.candidate_query().is_none());
    }

    #[test]
    fn test_negated_circle_refines_the_outside() {
        let plan = plan(&not(intersects_circle([45.0, 45.0], "10km")), ReferenceBody::WGS_84);
        assert!(plan.is_negated());
        assert!(!plan.refine(&Geometry::Point([45.05, 45.05])));
        assert!(plan.refine(&Geometry::Point([46.0, 46.0])));
    }

    #[test]
    fn test_refines_the_banded_circle() {
        let criterion = or([
            intersects_circle([45.0, 45.0], "50km"),
            intersects_circle([10.0, 60.0], "50km"),
        ]);
        let config = IndexerConfig::default();
        let err = GeoSearchPlan::build(&criterion, &ReferenceBody::WGS_84, &config).unwrap_err();
        assert!(matches!(
            err,
            IndexerError::IllegalArgument(IllegalArgument::AmbiguousRefinement { circles: 2 })
        ));

        // A spherical body never needs refinement
        let plan = plan(&criterion, ReferenceBody::ASTRO);
        assert_eq!(plan.circle(), Some(([45.0, 45.0], 50_000.0)));
        assert!(!plan.has_boundary());
    }

    #[test]
    fn test_refine() {
        let plan = plan(&intersects_circle([45.0, 45.0], "10km"), ReferenceBody::WGS_84);
        assert!(plan.refine(&Geometry::Point([45.05, 45.05])));
        assert!(!plan.refine(&Geometry::Point([46.0, 46.0])));

        assert!(plan.refine_document(&json!({
            "geometry": { "type": "Point", "coordinates": [45.01, 45.0] }
        })));
        assert!(!plan.refine_document(&json!({ "properties": {} })));
    }

    #[test]
    fn test_bad_radius() {
        let result = GeoSearchPlan::build(
            &intersects_circle([45.0, 45.0], "far"),
            &ReferenceBody::WGS_84,
            &IndexerConfig::default(),
        );
        assert!(result.is_err());
    }
}
