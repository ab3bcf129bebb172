//! Fluent construction of a [`Geofind`] engine.

use crate::engine::{DatasetLoader, Geofind};
use crate::error::Result;

/// Builder collecting dataset loaders before a single build step.
///
/// # Examples
///
/// ```rust
/// use geofind::{GeofindBuilder, Point};
///
/// let payload = br#"{"type":"FeatureCollection","features":[{
///     "type":"Feature",
///     "properties":{"ADMIN":"Testland"},
///     "geometry":{"type":"Polygon",
///         "coordinates":[[[0.0,0.0],[10.0,0.0],[10.0,10.0],[0.0,10.0],[0.0,0.0]]]}
/// }]}"#;
///
/// let engine = GeofindBuilder::new()
///     .dataset("countries", || payload.to_vec())
///     .build()?;
/// assert_eq!(engine.reverse_geocode(Point::new(5.0, 5.0))?.country, "Testland");
/// # Ok::<(), geofind::GeofindError>(())
/// ```
#[derive(Debug, Default)]
pub struct GeofindBuilder {
    datasets: Vec<DatasetLoader>,
}

impl GeofindBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a dataset payload under an explicit name.
    pub fn dataset<F>(mut self, name: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> Vec<u8> + 'static,
    {
        self.datasets.push(DatasetLoader::new(name, load));
        self
    }

    /// Queue a prepared loader.
    pub fn loader(mut self, loader: DatasetLoader) -> Self {
        self.datasets.push(loader);
        self
    }

    /// Build the engine. Loaders run in the order they were queued.
    pub fn build(self) -> Result<Geofind> {
        Geofind::new(self.datasets)
    }
}
