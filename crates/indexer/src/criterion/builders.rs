//! Factory functions for criterion trees.
//!
//! These are the intended way to build criteria. They never validate
//! geometry; that happens when a tree is corrected or rewritten for a
//! reference body.

use crate::error::ParseError;
use crate::geo::LonLat;

use super::{ComparisonOp, Criterion, CriterionValue, MatchKind, RangeBound, StringMatchType};

/// Matches every document.
pub fn all() -> Criterion {
    Criterion::All
}

/// Every criterion must match.
pub fn and(criteria: impl IntoIterator<Item = Criterion>) -> Criterion {
    Criterion::And(criteria.into_iter().collect())
}

/// At least one criterion must match.
pub fn or(criteria: impl IntoIterator<Item = Criterion>) -> Criterion {
    Criterion::Or(criteria.into_iter().collect())
}

/// Negation.
pub fn not(criterion: Criterion) -> Criterion {
    Criterion::Not(Box::new(criterion))
}

fn comparison(
    field: impl Into<String>,
    op: ComparisonOp,
    value: impl Into<CriterionValue>,
    tolerance: Option<f64>,
) -> Criterion {
    Criterion::Comparison {
        field: field.into(),
        op,
        value: value.into(),
        tolerance,
    }
}

/// `field == value`.
pub fn eq(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Eq, value, None)
}

/// `|field - value| <= tolerance`.
pub fn eq_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Criterion {
    comparison(field, ComparisonOp::Eq, value, Some(tolerance))
}

/// `field != value`.
pub fn ne(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Ne, value, None)
}

/// `|field - value| > tolerance`.
pub fn ne_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Criterion {
    comparison(field, ComparisonOp::Ne, value, Some(tolerance))
}

/// `field > value`.
pub fn gt(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Gt, value, None)
}

/// `field >= value`.
pub fn ge(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Ge, value, None)
}

/// `field < value`.
pub fn lt(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Lt, value, None)
}

/// `field <= value`.
pub fn le(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    comparison(field, ComparisonOp::Le, value, None)
}

/// `lower <= field <= upper`.
pub fn between(
    field: impl Into<String>,
    lower: impl Into<CriterionValue>,
    upper: impl Into<CriterionValue>,
) -> Criterion {
    between_with(field, RangeBound::inclusive(lower), RangeBound::inclusive(upper))
}

/// Range with explicit bound inclusiveness.
pub fn between_with(field: impl Into<String>, lower: RangeBound, upper: RangeBound) -> Criterion {
    Criterion::Between {
        field: field.into(),
        lower,
        upper,
    }
}

/// `field` equals one of `values`. An empty list matches nothing.
pub fn in_values<V: Into<CriterionValue>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> Criterion {
    let values: Vec<CriterionValue> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return not(all());
    }
    Criterion::In {
        field: field.into(),
        values,
    }
}

/// Text match against any of `values`. An empty list matches nothing.
pub fn string_match<S: Into<String>>(
    field: impl Into<String>,
    kind: MatchKind,
    match_type: StringMatchType,
    values: impl IntoIterator<Item = S>,
) -> Criterion {
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return not(all());
    }
    Criterion::StringMatch {
        field: field.into(),
        kind,
        match_type,
        values,
    }
}

/// Whole text equality.
pub fn eq_text(
    field: impl Into<String>,
    text: impl Into<String>,
    match_type: StringMatchType,
) -> Criterion {
    string_match(field, MatchKind::Equals, match_type, [text.into()])
}

/// Text prefix.
pub fn starts_with(
    field: impl Into<String>,
    text: impl Into<String>,
    match_type: StringMatchType,
) -> Criterion {
    string_match(field, MatchKind::StartsWith, match_type, [text.into()])
}

/// Text suffix.
pub fn ends_with(
    field: impl Into<String>,
    text: impl Into<String>,
    match_type: StringMatchType,
) -> Criterion {
    string_match(field, MatchKind::EndsWith, match_type, [text.into()])
}

/// Text containment.
pub fn contains_text(
    field: impl Into<String>,
    text: impl Into<String>,
    match_type: StringMatchType,
) -> Criterion {
    string_match(field, MatchKind::Contains, match_type, [text.into()])
}

/// Regular expression match.
pub fn regexp(
    field: impl Into<String>,
    pattern: impl Into<String>,
    match_type: StringMatchType,
) -> Criterion {
    string_match(field, MatchKind::Regexp, match_type, [pattern.into()])
}

/// The array attribute `field` holds `value`.
pub fn contains(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    Criterion::Contains {
        field: field.into(),
        value: value.into(),
        tolerance: None,
    }
}

/// The array attribute `field` holds a number within `tolerance` of `value`.
pub fn contains_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Criterion {
    Criterion::Contains {
        field: field.into(),
        value: value.into(),
        tolerance: Some(tolerance),
    }
}

/// The range attribute `field` contains `value`.
pub fn into(field: impl Into<String>, value: impl Into<CriterionValue>) -> Criterion {
    Criterion::Into {
        field: field.into(),
        value: value.into(),
    }
}

/// The range attribute `field` intersects `[lower, upper]`.
pub fn intersects_range(
    field: impl Into<String>,
    lower: impl Into<CriterionValue>,
    upper: impl Into<CriterionValue>,
) -> Criterion {
    Criterion::IntersectsRange {
        field: field.into(),
        lower: lower.into(),
        upper: upper.into(),
    }
}

/// `field` is present.
pub fn attribute_exists(field: impl Into<String>) -> Criterion {
    Criterion::FieldExists {
        field: field.into(),
    }
}

/// Intersection with a circle. `radius` is read by [`crate::geo::to_meters`].
pub fn intersects_circle(center: LonLat, radius: impl Into<String>) -> Criterion {
    Criterion::Circle {
        center,
        radius: radius.into(),
    }
}

/// Intersection with a polygon given as rings (outer ring first).
pub fn intersects_polygon(rings: Vec<Vec<LonLat>>) -> Criterion {
    Criterion::Polygon { rings }
}

/// Intersection with a longitude/latitude box.
pub fn intersects_bbox(left: f64, bottom: f64, right: f64, top: f64) -> Criterion {
    Criterion::BoundingBox {
        min_x: left,
        min_y: bottom,
        max_x: right,
        max_y: top,
    }
}

/// Intersection with a box given as `"left,bottom,right,top"`.
pub fn intersects_bbox_str(bbox: &str) -> Result<Criterion, ParseError> {
    let invalid = |message: String| ParseError::InvalidBbox {
        input: bbox.to_string(),
        message,
    };

    let parts: Vec<&str> = bbox.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 values, found {}", parts.len())));
    }

    let mut coords = [0.0; 4];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        let value: f64 = part
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", part)))?;
        if !value.is_finite() {
            return Err(invalid(format!("'{}' is not finite", part)));
        }
        *slot = value;
    }

    Ok(intersects_bbox(coords[0], coords[1], coords[2], coords[3]))
}
