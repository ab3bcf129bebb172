//! Error types for geofind.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GeofindError>;

/// Reasons a raw ring or geometry cannot be turned into spherical loops.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A ring must be closed with at least four positions.
    #[error("ring has {points} points, need at least 4")]
    TooFewPoints { points: usize },

    /// The first and last positions of a ring must be coordinate-equal.
    #[error("ring is not closed: first and last points differ")]
    UnclosedRing,

    /// A GeoJSON position carried fewer than two coordinates.
    #[error("position has fewer than 2 coordinates")]
    ShortPosition,

    /// Only Polygon and MultiPolygon geometries can be indexed.
    #[error("unsupported geometry kind: {kind}")]
    UnsupportedKind { kind: String },
}

/// All errors the engine can produce.
///
/// Construction errors abort the entire build; no partially loaded engine is
/// ever returned. Query errors are per-call and never touch engine state.
#[derive(Debug, Error)]
pub enum GeofindError {
    /// A dataset loader produced zero bytes.
    #[error("dataset {index} ({name}): empty payload")]
    EmptyPayload { index: usize, name: String },

    /// A gzip payload could not be decompressed.
    #[error("dataset {index} ({name}): decompression failed")]
    Decompression {
        index: usize,
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A payload could not be decoded as a GeoJSON feature collection.
    #[error("dataset {index} ({name}): decode failed")]
    Decode {
        index: usize,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A feature's geometry could not be normalized.
    #[error("dataset {index} ({name}): malformed geometry")]
    MalformedGeometry {
        index: usize,
        name: String,
        #[source]
        source: GeometryError,
    },

    /// No indexed polygon contains the queried coordinate.
    #[error("no location found at ({longitude}, {latitude})")]
    LocationNotFound { longitude: f64, latitude: f64 },

    /// A geometry lookup was requested without naming a dataset.
    #[error("dataset name must not be empty")]
    MissingDatasetParameter,

    /// The named dataset was never registered.
    #[error("dataset not found: {name}")]
    DatasetNotFound { name: String },

    /// The coordinate matched, but not within the named dataset.
    #[error("no geometry found in dataset {name} at ({longitude}, {latitude})")]
    GeometryNotFound {
        name: String,
        longitude: f64,
        latitude: f64,
    },
}
