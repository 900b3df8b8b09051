//! Geodesic computations on a reference body.
//!
//! Distances and destination points use Vincenty's iterative solutions on the
//! body ellipsoid (sub-millimetre accuracy at the scales used by search
//! criteria). All functions are pure and deterministic.

use std::f64::consts::PI;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;

use super::{LonLat, ReferenceBody};

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

static RADIUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<value>\d+(?:\.\d*)?(?:[eE][+-]?\d+)?|\.\d+)\s*(?P<unit>[A-Za-z]*)$")
        .expect("radius pattern is valid")
});

/// Geodesic distance in meters between two points on the body ellipsoid.
///
/// Coincident points yield exactly `0.0`. Nearly antipodal points, for which
/// the iteration does not converge, fall back to the great circle distance on
/// the body's mean sphere.
pub fn distance(body: &ReferenceBody, from: LonLat, to: LonLat) -> f64 {
    match vincenty_inverse(body, from, to) {
        Some(meters) => meters,
        None => {
            tracing::warn!(
                "Vincenty inverse did not converge between {:?} and {:?} on {}, using mean sphere",
                from,
                to,
                body
            );
            central_angle(from, to) * body.mean_radius()
        }
    }
}

fn vincenty_inverse(body: &ReferenceBody, from: LonLat, to: LonLat) -> Option<f64> {
    let a = body.semi_major_axis;
    let f = body.flattening;
    let b = body.semi_minor_axis();

    let l = normalize_radians((to[0] - from[0]).to_radians());
    let u1 = ((1.0 - f) * from[1].to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to[1].to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;
    let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 0.0, 0.0);
    let (mut cos_sq_alpha, mut cos_2sigma_m) = (0.0, 0.0);

    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos²α = 0
        cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));
        if (lambda - previous).abs() < CONVERGENCE {
            converged = true;
            break;
        }
        if lambda.abs() > PI {
            return None;
        }
    }
    if !converged {
        return None;
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma.powi(2))
                        * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

    Some(b * big_a * (sigma - delta_sigma))
}

/// Point reached from `start` after travelling `meters` along the geodesic
/// leaving with `azimuth` (degrees clockwise from north).
///
/// The returned longitude is normalized into `[-180, 180)`.
pub fn destination(body: &ReferenceBody, start: LonLat, azimuth: f64, meters: f64) -> LonLat {
    let a = body.semi_major_axis;
    let f = body.flattening;
    let b = body.semi_minor_axis();

    let (sin_alpha1, cos_alpha1) = azimuth.to_radians().sin_cos();
    let tan_u1 = (1.0 - f) * start[1].to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;
    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let mut sigma = meters / (b * big_a);
    let mut cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    for _ in 0..MAX_ITERATIONS {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma.powi(2))
                            * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
        let previous = sigma;
        sigma = meters / (b * big_a) + delta_sigma;
        if (sigma - previous).abs() < CONVERGENCE {
            break;
        }
    }

    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
    let lambda =
        (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

    [
        normalize_longitude(start[0] + l.to_degrees()),
        lat.to_degrees(),
    ]
}

/// Angle in radians between two points of the unit sphere (haversine form).
pub fn central_angle(from: LonLat, to: LonLat) -> f64 {
    let (lat1, lat2) = (from[1].to_radians(), to[1].to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (to[0] - from[0]).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Geocentric latitude (degrees) of a geodetic latitude on the body.
pub fn geocentric_latitude(body: &ReferenceBody, lat: f64) -> f64 {
    if lat.abs() >= 90.0 || body.is_spherical() {
        return lat;
    }
    let k = (1.0 - body.flattening).powi(2);
    (k * lat.to_radians().tan()).atan().to_degrees()
}

/// Geodetic latitude (degrees) of a geocentric latitude on the body.
pub fn geodetic_latitude(body: &ReferenceBody, lat: f64) -> f64 {
    if lat.abs() >= 90.0 || body.is_spherical() {
        return lat;
    }
    let k = (1.0 - body.flattening).powi(2);
    (lat.to_radians().tan() / k).atan().to_degrees()
}

/// Gap in degrees between a latitude read as geocentric and the matching
/// geodetic latitude. Zero on the equator, the poles and on spheres.
pub fn latitude_discrepancy(body: &ReferenceBody, lat: f64) -> f64 {
    (geodetic_latitude(body, lat) - lat).abs()
}

/// Largest [`latitude_discrepancy`] over `[min_lat, max_lat]`.
///
/// The discrepancy peaks at `atan(1 - f)`, slightly below 45°.
pub fn max_latitude_discrepancy(body: &ReferenceBody, min_lat: f64, max_lat: f64) -> f64 {
    let peak = (1.0 - body.flattening).atan().to_degrees();
    let mut max = latitude_discrepancy(body, min_lat).max(latitude_discrepancy(body, max_lat));
    for candidate in [peak, -peak] {
        if (min_lat..=max_lat).contains(&candidate) {
            max = max.max(latitude_discrepancy(body, candidate));
        }
    }
    max
}

/// Converts a radius specification (`"100km"`, `"50m"`, `"12.5"`) to meters.
///
/// Units are `m` (default) and `km`, case-insensitive, blanks allowed.
pub fn to_meters(spec: &str) -> Result<f64, ParseError> {
    let invalid = |message: &str| ParseError::InvalidRadius {
        spec: spec.to_string(),
        message: message.to_string(),
    };

    let trimmed = spec.trim();
    if trimmed.starts_with('-') {
        return Err(invalid("radius must not be negative"));
    }
    let captures = RADIUS_PATTERN
        .captures(trimmed)
        .ok_or_else(|| invalid("expected a number optionally followed by 'm' or 'km'"))?;

    let value: f64 = captures["value"]
        .parse()
        .map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("radius must be finite"));
    }

    let factor = match captures["unit"].to_ascii_lowercase().as_str() {
        "" | "m" => 1.0,
        "km" => 1000.0,
        other => return Err(invalid(&format!("unknown unit '{}'", other))),
    };
    Ok(value * factor)
}

/// Renders meters as a radius specification that [`to_meters`] reads back exactly.
pub fn format_meters(meters: f64) -> String {
    format!("{}m", meters)
}

/// Normalizes a longitude into `[-180, 180)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

fn normalize_radians(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
