//! Embedded, offline reverse geocoding: which regions contain a coordinate?
//!
//! Polygon datasets (GeoJSON feature collections, optionally
//! gzip-compressed) are ingested once into an in-memory spatial index;
//! queries then answer entirely in-process, with no network calls. Once
//! built, the engine is immutable and safe to share across threads.
//!
//! ```rust
//! use geofind::{DatasetLoader, Geofind, Point};
//!
//! let payload = br#"{"type":"FeatureCollection","features":[{
//!     "type":"Feature",
//!     "properties":{"ADMIN":"Testland","ISO_A3":"TST"},
//!     "geometry":{"type":"Polygon",
//!         "coordinates":[[[0.0,0.0],[10.0,0.0],[10.0,10.0],[0.0,10.0],[0.0,0.0]]]}
//! }]}"#;
//!
//! let engine = Geofind::new([DatasetLoader::new("countries", || payload.to_vec())])?;
//! let location = engine.reverse_geocode(Point::new(5.0, 5.0))?;
//! assert_eq!(location.country, "Testland");
//! assert_eq!(location.to_string(), "<Location> Testland (TST)");
//! # Ok::<(), geofind::GeofindError>(())
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod index;
pub mod store;
pub mod types;

pub use builder::GeofindBuilder;
pub use engine::{DatasetLoader, Geofind, GeofindStats};
pub use error::{GeofindError, GeometryError, Result};
pub use index::{ShapeHandle, SpatialIndex};
pub use store::LocationStore;
pub use types::{Location, LocationWithGeometry};

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        DatasetLoader, Geofind, GeofindBuilder, GeofindError, Location, LocationWithGeometry,
        Point, Result,
    };
}
