//! Attribute and raw-geometry storage keyed by shape handles.

use std::collections::BTreeMap;

use geojson::Geometry;
use rustc_hash::FxHashMap;

use crate::index::ShapeHandle;
use crate::types::Location;

/// Maps shape handles to their attribute records and, per dataset, to the
/// raw geometry they were built from.
///
/// Datasets are keyed in a `BTreeMap` so name enumeration is sorted and
/// reproducible by construction.
#[derive(Debug, Default)]
pub struct LocationStore {
    locations: FxHashMap<ShapeHandle, Location>,
    datasets: BTreeMap<String, FxHashMap<ShapeHandle, Geometry>>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset name. Idempotent: repeated registration under the
    /// same name accumulates rather than erroring.
    pub fn register_dataset(&mut self, name: &str) {
        self.datasets.entry(name.to_string()).or_default();
    }

    /// Record a handle's attribute record and raw geometry under a dataset.
    pub fn put(&mut self, handle: ShapeHandle, dataset: &str, location: Location, geometry: Geometry) {
        self.locations.insert(handle, location);
        self.datasets
            .entry(dataset.to_string())
            .or_default()
            .insert(handle, geometry);
    }

    /// Attribute record for a handle.
    ///
    /// Every handle returned by the index was recorded at ingest, so `None`
    /// indicates an internal bug rather than a user error.
    pub fn location(&self, handle: ShapeHandle) -> Option<&Location> {
        self.locations.get(&handle)
    }

    /// Raw geometry for a handle within a dataset, or `None` if the handle
    /// is not registered under that dataset.
    pub fn geometry(&self, handle: ShapeHandle, dataset: &str) -> Option<&Geometry> {
        self.datasets.get(dataset)?.get(&handle)
    }

    pub fn contains_dataset(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Registered dataset names, lexicographically sorted.
    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    /// Number of handles with a recorded attribute record.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
