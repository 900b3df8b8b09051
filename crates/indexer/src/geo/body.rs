//! Reference bodies.
//!
//! A reference body is the ellipsoid geographic coordinates are expressed on.
//! The set of registered bodies is closed; custom bodies can be built with
//! [`ReferenceBody::new`] and must pass [`ReferenceBody::validate`] before any
//! geometry operation accepts them.

use std::fmt;
use std::str::FromStr;

use crate::error::IllegalArgument;

/// An ellipsoid of revolution used to interpret longitude/latitude coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceBody {
    /// Registered name (e.g. `WGS_84`).
    pub name: &'static str,
    /// Equatorial radius in meters.
    pub semi_major_axis: f64,
    /// `(a - b) / a`, zero for a sphere.
    pub flattening: f64,
    /// Whether rings may wrap around the antimeridian or encircle a pole.
    pub requires_pole_handling: bool,
}

impl ReferenceBody {
    /// Earth, WGS 84 ellipsoid.
    pub const WGS_84: ReferenceBody =
        ReferenceBody::new("WGS_84", 6_378_137.0, 1.0 / 298.257_223_563, true);

    /// Mars, IAU 2000 ellipsoid (polar radius 3 376 200 m).
    pub const MARS_49900: ReferenceBody = ReferenceBody::new(
        "MARS_49900",
        3_396_190.0,
        (3_396_190.0 - 3_376_200.0) / 3_396_190.0,
        true,
    );

    /// Mars approximated by a sphere of its equatorial radius.
    pub const MARS_SPHERE: ReferenceBody =
        ReferenceBody::new("MARS_SPHERE", 3_396_190.0, 0.0, true);

    /// Celestial sphere, using the Earth authalic radius.
    pub const ASTRO: ReferenceBody = ReferenceBody::new("ASTRO", 6_371_007.0, 0.0, true);

    /// Every registered body.
    pub const ALL: [ReferenceBody; 4] = [
        Self::WGS_84,
        Self::MARS_49900,
        Self::MARS_SPHERE,
        Self::ASTRO,
    ];

    /// Creates a custom reference body. Call [`validate`](Self::validate) before use.
    pub const fn new(
        name: &'static str,
        semi_major_axis: f64,
        flattening: f64,
        requires_pole_handling: bool,
    ) -> Self {
        Self {
            name,
            semi_major_axis,
            flattening,
            requires_pole_handling,
        }
    }

    /// Finds a registered body by name, ignoring case and `_`/`-` separators.
    pub fn lookup(name: &str) -> Result<ReferenceBody, IllegalArgument> {
        let wanted = normalize_name(name);
        Self::ALL
            .iter()
            .find(|body| normalize_name(body.name) == wanted)
            .copied()
            .ok_or_else(|| IllegalArgument::UnknownBody {
                name: name.to_string(),
            })
    }

    /// Polar radius in meters.
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    /// Mean radius `(2a + b) / 3`.
    pub fn mean_radius(&self) -> f64 {
        (2.0 * self.semi_major_axis + self.semi_minor_axis()) / 3.0
    }

    /// First eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    /// True for a body without flattening.
    pub fn is_spherical(&self) -> bool {
        self.flattening == 0.0
    }

    /// Checks the body describes a real ellipsoid.
    ///
    /// A flat or undefined body (non positive radius, flattening outside
    /// `[0, 1)`, non finite parameters) cannot be used to rewrite or correct
    /// geometries.
    pub fn validate(&self) -> Result<(), IllegalArgument> {
        if !self.semi_major_axis.is_finite() || self.semi_major_axis <= 0.0 {
            return Err(IllegalArgument::UnsupportedBody {
                name: self.name.to_string(),
                message: format!(
                    "semi-major axis {} is not a positive length",
                    self.semi_major_axis
                ),
            });
        }
        if !self.flattening.is_finite() || !(0.0..1.0).contains(&self.flattening) {
            return Err(IllegalArgument::UnsupportedBody {
                name: self.name.to_string(),
                message: format!("flattening {} is outside [0, 1)", self.flattening),
            });
        }
        Ok(())
    }
}

impl Default for ReferenceBody {
    fn default() -> Self {
        Self::WGS_84
    }
}

impl fmt::Display for ReferenceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for ReferenceBody {
    type Err = IllegalArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
