//! The reverse geocoding engine: dataset ingestion and containment queries.

use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use flate2::read::GzDecoder;
use geo::Point;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

use crate::error::{GeofindError, GeometryError, Result};
use crate::geometry::SphericalPolygon;
use crate::index::{ShapeHandle, SpatialIndex};
use crate::store::LocationStore;
use crate::types::{Location, LocationWithGeometry};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A named source of one dataset payload.
///
/// The closure returns the dataset's raw bytes: a GeoJSON feature
/// collection, optionally gzip-compressed. The name is the dataset's
/// identity; loaders sharing a name accumulate into one dataset.
pub struct DatasetLoader {
    name: String,
    load: Box<dyn Fn() -> Vec<u8>>,
}

impl DatasetLoader {
    pub fn new<F>(name: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> Vec<u8> + 'static,
    {
        Self {
            name: name.into(),
            load: Box::new(load),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for DatasetLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetLoader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Counts describing a built engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofindStats {
    /// Number of registered datasets.
    pub dataset_count: usize,
    /// Number of indexed shapes across all datasets.
    pub shape_count: usize,
}

/// Pre-built polygon index plus attribute stores, ready for queries.
///
/// Built once from dataset loaders; immutable afterwards. There is no
/// internal mutation on any query path, so a `Geofind` can be shared freely
/// across threads without locks.
#[derive(Debug)]
pub struct Geofind {
    index: SpatialIndex,
    store: LocationStore,
}

impl Geofind {
    /// Build an engine from dataset loaders.
    ///
    /// Loaders run synchronously, in order. Any failure (empty payload,
    /// decompression, decode, malformed geometry) aborts the entire build
    /// with the loader's index and dataset name attached; no partially
    /// loaded engine is ever returned.
    pub fn new<I>(datasets: I) -> Result<Self>
    where
        I: IntoIterator<Item = DatasetLoader>,
    {
        let mut index = SpatialIndex::new();
        let mut store = LocationStore::new();

        for (position, loader) in datasets.into_iter().enumerate() {
            let DatasetLoader { name, load } = loader;
            let payload = load();
            if payload.is_empty() {
                return Err(GeofindError::EmptyPayload {
                    index: position,
                    name,
                });
            }

            let collection = decode_payload(&payload, position, &name)?;
            store.register_dataset(&name);

            let feature_count = collection.features.len();
            for feature in collection.features {
                let Some(geometry) = feature.geometry else {
                    return Err(GeofindError::MalformedGeometry {
                        index: position,
                        name,
                        source: GeometryError::UnsupportedKind {
                            kind: "none".to_string(),
                        },
                    });
                };

                let polygon =
                    SphericalPolygon::from_geojson(&geometry).map_err(|source| {
                        GeofindError::MalformedGeometry {
                            index: position,
                            name: name.clone(),
                            source,
                        }
                    })?;

                let handle = index.add(polygon);
                let location = Location::from_properties(feature.properties.as_ref());
                store.put(handle, &name, location, geometry);
            }

            log::debug!("dataset {name}: indexed {feature_count} features");
        }

        log::info!(
            "engine ready: {} shapes across {} datasets",
            index.len(),
            store.dataset_count()
        );

        Ok(Self { index, store })
    }

    /// Look up the location containing a point.
    ///
    /// Coordinates are (longitude, latitude) degrees with no range
    /// validation; out-of-range input yields geometrically meaningless but
    /// non-erroring results. When several shapes match, their locations are
    /// merged field by field with the first non-empty value winning, in
    /// index result order, which is dataset load order. Callers who want
    /// finer-grained data to win must load those datasets first.
    pub fn reverse_geocode(&self, point: Point<f64>) -> Result<Location> {
        let matches = self.index.query(point.x(), point.y());
        if matches.is_empty() {
            return Err(GeofindError::LocationNotFound {
                longitude: point.x(),
                latitude: point.y(),
            });
        }
        Ok(self.combine_locations(&matches))
    }

    /// Like [`reverse_geocode`](Self::reverse_geocode), additionally
    /// returning the raw geometry of the first matching shape registered
    /// under `dataset`.
    pub fn reverse_geocode_with_geometry(
        &self,
        point: Point<f64>,
        dataset: &str,
    ) -> Result<LocationWithGeometry> {
        if dataset.is_empty() {
            return Err(GeofindError::MissingDatasetParameter);
        }
        if !self.store.contains_dataset(dataset) {
            return Err(GeofindError::DatasetNotFound {
                name: dataset.to_string(),
            });
        }

        let matches = self.index.query(point.x(), point.y());
        if matches.is_empty() {
            return Err(GeofindError::LocationNotFound {
                longitude: point.x(),
                latitude: point.y(),
            });
        }

        let location = self.combine_locations(&matches);
        let geometry = matches
            .iter()
            .find_map(|handle| self.store.geometry(*handle, dataset))
            .ok_or_else(|| GeofindError::GeometryNotFound {
                name: dataset.to_string(),
                longitude: point.x(),
                latitude: point.y(),
            })?;

        Ok(LocationWithGeometry {
            location,
            geometry: geometry.clone(),
        })
    }

    /// Registered dataset names, lexicographically sorted.
    pub fn dataset_names(&self) -> Vec<String> {
        self.store.dataset_names()
    }

    pub fn stats(&self) -> GeofindStats {
        GeofindStats {
            dataset_count: self.store.dataset_count(),
            shape_count: self.index.len(),
        }
    }

    fn combine_locations(&self, handles: &[ShapeHandle]) -> Location {
        let mut merged = Location::default();
        for handle in handles {
            let Some(location) = self.store.location(*handle) else {
                // Every indexed handle is recorded at ingest; a miss here is
                // an internal bug, not a user error.
                log::error!("no location recorded for {handle}");
                continue;
            };
            merged.merge_from(location);
        }
        merged
    }
}

/// Decompress (when gzip-compressed) and decode one dataset payload.
fn decode_payload(payload: &[u8], position: usize, name: &str) -> Result<FeatureCollection> {
    let bytes: Cow<'_, [u8]> = if payload.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(payload);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|source| GeofindError::Decompression {
                index: position,
                name: name.to_string(),
                source,
            })?;
        Cow::Owned(decompressed)
    } else {
        Cow::Borrowed(payload)
    };

    serde_json::from_slice(&bytes).map_err(|source| GeofindError::Decode {
        index: position,
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries_payload() -> Vec<u8> {
        br#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"ADMIN": "Testland", "ISO_A3": "TST"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0,0.0],[10.0,0.0],[10.0,10.0],[0.0,10.0],[0.0,0.0]]]
                }
            }]
        }"#
        .to_vec()
    }

    #[test]
    fn test_loader_reports_its_name() {
        let loader = DatasetLoader::new("countries", countries_payload);
        assert_eq!(loader.name(), "countries");
    }

    #[test]
    fn test_build_and_query() {
        let engine =
            Geofind::new([DatasetLoader::new("countries", countries_payload)]).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.dataset_count, 1);
        assert_eq!(stats.shape_count, 1);

        let location = engine.reverse_geocode(Point::new(5.0, 5.0)).unwrap();
        assert_eq!(location.country, "Testland");
        assert_eq!(location.country_code_3, "TST");
    }

    #[test]
    fn test_empty_payload_aborts_build() {
        let err = Geofind::new([
            DatasetLoader::new("countries", countries_payload),
            DatasetLoader::new("empty", Vec::new),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            GeofindError::EmptyPayload { index: 1, ref name } if name == "empty"
        ));
    }
}
