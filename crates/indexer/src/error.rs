//! Error types for the indexer.
//!
//! Errors are split by category: parse errors (malformed user input such as a
//! radius specification), geometry errors (topologically invalid shapes for the
//! requested reference body) and illegal arguments (precondition violations
//! that indicate a programming error). Every failure is total and immediate;
//! nothing in this crate retries.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all indexer operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexerError {
    /// Malformed input
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid geometry
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Precondition violations
    #[error(transparent)]
    IllegalArgument(#[from] IllegalArgument),
}

/// Errors raised while parsing user supplied values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The radius specification is not `<non-negative number>[m|km]`.
    #[error("invalid radius '{spec}': {message}")]
    InvalidRadius { spec: String, message: String },

    /// The bounding box string is not `left,bottom,right,top`.
    #[error("invalid bounding box '{input}': {message}")]
    InvalidBbox { input: String, message: String },
}

/// Errors raised when a geometry cannot be represented on the reference body.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A polygon ring without any vertex.
    #[error("polygon ring {ring} is empty")]
    EmptyRing { ring: usize },

    /// A polygon ring that cannot enclose an area.
    #[error("polygon ring {ring} has {distinct} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, distinct: usize },

    /// A ring whose vertices are all aligned.
    #[error("polygon ring {ring} has a zero area")]
    DegenerateRing { ring: usize },

    /// A coordinate out of the geographic domain.
    #[error("invalid coordinate ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// A bounding box whose bottom is above its top.
    #[error(
        "bounding box crosses itself: min latitude {min_y} is greater than max latitude {max_y}"
    )]
    InvertedBbox { min_y: f64, max_y: f64 },

    /// A bounding box crossing the antimeridian on a body without wrap-around.
    #[error(
        "bounding box crosses the antimeridian ({min_x} > {max_x}) but reference body {body} \
         does not handle wrap-around"
    )]
    UnhandledAntimeridian { min_x: f64, max_x: f64, body: String },

    /// A ring encircling a pole on a body that does not handle poles.
    #[error("ring encircles a pole but reference body {body} does not handle poles")]
    UnhandledPole { body: String },

    /// The correction would flip the ring orientation.
    #[error("correction of polygon ring {ring} changed its winding order")]
    WindingChanged { ring: usize },
}

/// Precondition violations. These are programming errors, not runtime conditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IllegalArgument {
    /// The reference body cannot be used for geometry rewriting or correction.
    #[error("reference body {name} cannot be used for geometry operations: {message}")]
    UnsupportedBody { name: String, message: String },

    /// No registered reference body with this name.
    #[error("unknown reference body: {name}")]
    UnknownBody { name: String },

    /// An operation restricted to one criterion kind received another one.
    #[error("expected a {expected} criterion, found {found}")]
    UnexpectedCriterion {
        expected: &'static str,
        found: &'static str,
    },

    /// More than one circle of a search plan needs exact refinement.
    #[error("{circles} circles need exact refinement, a search plan supports one")]
    AmbiguousRefinement { circles: usize },

    /// The requested page goes past the index result window.
    #[error("result window exceeded: requested {requested}, maximum is {max}")]
    ResultWindowExceeded { requested: u64, max: u64 },
}

/// Result type alias for indexer operations.
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Result type alias for geometry validation.
pub type GeoResult<T> = Result<T, GeometryError>;
