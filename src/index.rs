//! R-tree backed point-containment index over spherical polygons.
//!
//! Polygons are keyed by a lat/lng envelope derived from their bounding
//! caps; an envelope probe narrows each query to a handful of candidates,
//! which are then tested with exact spherical containment.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rstar::{AABB, RTree, RTreeObject};

use crate::geometry::{SphericalPolygon, Vec3};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for an indexed polygon.
///
/// Handles are allocated from a process-wide monotonic counter and never
/// reused, so structurally identical polygons inserted twice get distinct
/// handles. Ordering follows insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(u64);

impl ShapeHandle {
    fn next() -> Self {
        ShapeHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// R-tree member: a polygon with its precomputed envelope.
#[derive(Debug)]
struct IndexedShape {
    handle: ShapeHandle,
    polygon: SphericalPolygon,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedShape {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index answering "which polygons contain this point?".
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedShape>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Insert a polygon and return its handle.
    ///
    /// Degenerate or self-intersecting loops are accepted best-effort; no
    /// validation happens here and queries against such loops answer from
    /// the winding number as-is.
    pub fn add(&mut self, polygon: SphericalPolygon) -> ShapeHandle {
        let handle = ShapeHandle::next();
        let bounds = polygon.bounds();
        let envelope = AABB::from_corners(
            [bounds.min_lon, bounds.min_lat],
            [bounds.max_lon, bounds.max_lat],
        );
        self.tree.insert(IndexedShape {
            handle,
            polygon,
            envelope,
        });
        handle
    }

    /// Handles of all polygons containing the point, under the open-boundary
    /// model (points on an edge or vertex match nothing).
    ///
    /// Results are sorted ascending by handle, which is insertion order, so
    /// identical queries against an identical index always return the same
    /// sequence.
    pub fn query(&self, longitude: f64, latitude: f64) -> Vec<ShapeHandle> {
        let target = Vec3::from_degrees(longitude, latitude);
        let probe = AABB::from_point([longitude, latitude]);
        let mut matches: Vec<ShapeHandle> = self
            .tree
            .locate_in_envelope_intersecting(&probe)
            .filter(|shape| shape.polygon.contains(target))
            .map(|shape| shape.handle)
            .collect();
        matches.sort_unstable();
        matches
    }

    /// Number of indexed polygons.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
