//! Normalization of raw GeoJSON rings into oriented spherical loops.
//!
//! Rings arrive as closed sequences of (longitude, latitude) positions with
//! no reliable winding convention. This module converts them into loops of
//! unit 3-vectors wound counter-clockwise around their interior, so that
//! point containment has a single meaning everywhere in the crate. The
//! winding guess is planar and breaks for rings that span the antimeridian
//! or more than a hemisphere; the bounding-cap check catches those cases and
//! flips the loop's interior interpretation instead of rebuilding it.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geojson::Value;
use smallvec::SmallVec;

use crate::error::GeometryError;

/// Dot-product slack under which a query point counts as coincident with a
/// loop vertex.
const VERTEX_EPS: f64 = 1e-12;

/// Tangent-plane projections shorter than this are degenerate: the query
/// point sits on top of, or antipodal to, a vertex.
const PROJECTION_EPS: f64 = 1e-12;

/// Angular slack for the on-edge test. A point this close to an edge's
/// great circle counts as on the boundary.
const EDGE_EPS: f64 = 1e-10;

/// A point on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Unit vector for a (longitude, latitude) pair in degrees.
    ///
    /// No range validation: out-of-range degrees still land somewhere on the
    /// sphere, which keeps out-of-range queries non-erroring.
    pub fn from_degrees(longitude: f64, latitude: f64) -> Self {
        let lon = longitude.to_radians();
        let lat = latitude.to_radians();
        let cos_lat = lat.cos();
        Self {
            x: cos_lat * lon.cos(),
            y: cos_lat * lon.sin(),
            z: lat.sin(),
        }
    }

    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    fn scale(self, factor: f64) -> Vec3 {
        Vec3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }

    fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    fn normalized(self) -> Option<Vec3> {
        let norm = self.norm();
        if norm < PROJECTION_EPS {
            None
        } else {
            Some(self.scale(1.0 / norm))
        }
    }

    /// Central angle to another unit vector, in radians.
    fn angle_to(self, other: Vec3) -> f64 {
        self.cross(other).norm().atan2(self.dot(other))
    }

    /// An arbitrary unit vector orthogonal to `self`.
    fn any_orthonormal(self) -> Vec3 {
        let axis = if self.x.abs() <= self.y.abs() && self.x.abs() <= self.z.abs() {
            Vec3 {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            }
        } else if self.y.abs() <= self.z.abs() {
            Vec3 {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            }
        } else {
            Vec3 {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            }
        };
        self.cross(axis).normalized().unwrap_or(Vec3 {
            x: 1.0,
            y: 0.0,
            z: 0.0,
        })
    }
}

/// Lat/lng rectangle in degrees, used to key polygons in the R-tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub(crate) fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

/// A spherical cap: all points within `radius` radians of `center`.
#[derive(Debug, Clone, Copy)]
pub struct Cap {
    center: Vec3,
    radius: f64,
}

impl Cap {
    pub fn radius_degrees(&self) -> f64 {
        self.radius.to_degrees()
    }

    /// Lat/lng rectangle enclosing the cap.
    ///
    /// Falls back to the full longitude range when the cap touches a pole or
    /// crosses the antimeridian, since axis-aligned envelopes cannot wrap.
    fn bounds(&self) -> Bounds {
        let lat = self.center.z.clamp(-1.0, 1.0).asin();
        let lon = self.center.y.atan2(self.center.x);

        let min_lat = (lat - self.radius).max(-FRAC_PI_2).to_degrees();
        let max_lat = (lat + self.radius).min(FRAC_PI_2).to_degrees();

        let full = Bounds {
            min_lon: -180.0,
            min_lat,
            max_lon: 180.0,
            max_lat,
        };

        if lat - self.radius <= -FRAC_PI_2 || lat + self.radius >= FRAC_PI_2 {
            return full;
        }

        // Both poles are clear, so cos(lat) > sin(radius) territory is safe.
        let delta = (self.radius.sin() / lat.cos()).min(1.0).asin();
        let min_lon = lon - delta;
        let max_lon = lon + delta;
        if min_lon < -PI || max_lon > PI {
            return full;
        }

        Bounds {
            min_lon: min_lon.to_degrees(),
            min_lat,
            max_lon: max_lon.to_degrees(),
            max_lat,
        }
    }
}

/// Net turn of a loop as seen from a query point's tangent plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Winding {
    /// Full counter-clockwise turn: the loop encircles the point.
    Ccw,
    /// Full clockwise turn: the loop encircles the point's antipode.
    Cw,
    /// No net turn: the point is between the loop and its antipodal image.
    None,
    /// Half turn, a coincident vertex, or a degenerate projection.
    Boundary,
}

/// Whether `point` lies on the great-circle arc between `a` and `b`.
fn on_edge(a: Vec3, b: Vec3, point: Vec3) -> bool {
    let Some(normal) = a.cross(b).normalized() else {
        // Degenerate edge: coincident or antipodal endpoints.
        return false;
    };
    if normal.dot(point).abs() > EDGE_EPS {
        return false;
    }
    let span = a.angle_to(b);
    a.angle_to(point) <= span + EDGE_EPS && point.angle_to(b) <= span + EDGE_EPS
}

/// Sum the signed tangent-plane angles the loop edges subtend at `point`.
///
/// Coincident vertices and on-edge points are reported as `Boundary` before
/// the sum: an edge through the point subtends exactly a half turn with an
/// ambiguous sign, which would otherwise tip the total to a full turn on
/// one arbitrary side.
fn winding(vertices: &[Vec3], point: Vec3) -> Winding {
    let mut previous_vertex = vertices[vertices.len() - 1];
    for vertex in vertices {
        if vertex.dot(point) >= 1.0 - VERTEX_EPS {
            return Winding::Boundary;
        }
        if on_edge(previous_vertex, *vertex, point) {
            return Winding::Boundary;
        }
        previous_vertex = *vertex;
    }

    let u = point.any_orthonormal();
    let v = point.cross(u);

    let azimuth = |vertex: Vec3| -> Option<f64> {
        let projected = vertex.sub(point.scale(vertex.dot(point)));
        if projected.norm() < PROJECTION_EPS {
            return None;
        }
        Some(projected.dot(v).atan2(projected.dot(u)))
    };

    let Some(mut previous) = azimuth(vertices[vertices.len() - 1]) else {
        return Winding::Boundary;
    };

    let mut total = 0.0;
    for vertex in vertices {
        let Some(current) = azimuth(*vertex) else {
            return Winding::Boundary;
        };
        let mut delta = current - previous;
        if delta > PI {
            delta -= TAU;
        } else if delta <= -PI {
            delta += TAU;
        }
        total += delta;
        previous = current;
    }

    if total > 3.0 * FRAC_PI_2 {
        Winding::Ccw
    } else if total < -3.0 * FRAC_PI_2 {
        Winding::Cw
    } else if total.abs() < FRAC_PI_2 {
        Winding::None
    } else {
        Winding::Boundary
    }
}

/// Planar shoelace orientation test on raw (lon, lat) coordinates.
///
/// Fast approximation that misjudges rings spanning the poles or the
/// antimeridian; `Loop::new` corrects those via the bounding cap.
fn is_clockwise(ring: &[Vec<f64>]) -> bool {
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let p1 = &ring[i];
        let p2 = &ring[(i + 1) % n];
        area += (p2[0] - p1[0]) * (p1[1] + p2[1]);
    }
    area > 0.0
}

/// A canonical ring: unique vertices (closing point dropped), a known
/// orientation, and a bounding cap over its interior.
#[derive(Debug, Clone)]
pub struct Loop {
    vertices: Vec<Vec3>,
    inverted: bool,
    cap: Cap,
}

impl Loop {
    /// Normalize one closed GeoJSON ring.
    pub fn from_ring(ring: &[Vec<f64>]) -> Result<Self, GeometryError> {
        if ring.len() < 4 {
            return Err(GeometryError::TooFewPoints {
                points: ring.len(),
            });
        }
        for position in ring {
            if position.len() < 2 {
                return Err(GeometryError::ShortPosition);
            }
        }
        let first = &ring[0];
        let last = &ring[ring.len() - 1];
        if first[0] != last[0] || first[1] != last[1] {
            return Err(GeometryError::UnclosedRing);
        }

        // The closing point is implied in the canonical form.
        let open = &ring[..ring.len() - 1];
        let mut vertices: Vec<Vec3> = open
            .iter()
            .map(|position| Vec3::from_degrees(position[0], position[1]))
            .collect();

        // Containment needs counter-clockwise winding for "inside" to mean
        // the enclosed area.
        if is_clockwise(open) {
            vertices.reverse();
        }

        Ok(Loop::new(vertices))
    }

    fn new(vertices: Vec<Vec3>) -> Self {
        let sum = vertices.iter().fold(Vec3::ZERO, |acc, v| acc.add(*v));
        let centroid = sum.normalized().unwrap_or(vertices[0]);

        let mut max_angle: f64 = 0.0;
        let mut min_angle: f64 = PI;
        for vertex in &vertices {
            let angle = centroid.angle_to(*vertex);
            max_angle = max_angle.max(angle);
            min_angle = min_angle.min(angle);
        }

        // One cap per candidate interior side of the loop.
        let near = Cap {
            center: centroid,
            radius: max_angle,
        };
        let far = Cap {
            center: centroid.neg(),
            radius: (PI - min_angle).max(max_angle),
        };

        let centroid_inside = winding(&vertices, centroid) == Winding::Ccw;
        let (cap, flipped) = if centroid_inside { (near, far) } else { (far, near) };

        if cap.radius > FRAC_PI_2 {
            // The winding guess enclosed more than a hemisphere. Flip the
            // interior interpretation rather than rebuilding the loop, which
            // is numerically less stable.
            Loop {
                vertices,
                inverted: true,
                cap: flipped,
            }
        } else {
            Loop {
                vertices,
                inverted: false,
                cap,
            }
        }
    }

    /// Number of unique vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the interior interpretation was flipped by the cap check.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Bounding cap over the loop's effective interior.
    pub fn cap(&self) -> &Cap {
        &self.cap
    }

    /// Open-boundary containment: points on an edge or vertex are never
    /// contained, so shared borders are not double-counted.
    pub fn contains(&self, point: Vec3) -> bool {
        match winding(&self.vertices, point) {
            Winding::Ccw => !self.inverted,
            Winding::Cw => self.inverted,
            Winding::None | Winding::Boundary => false,
        }
    }
}

/// One or more loops combined via even-odd nesting on the sphere.
///
/// Loops are not structurally split into outer boundaries and holes; hole
/// semantics emerge from the nesting rule in [`SphericalPolygon::contains`].
#[derive(Debug, Clone)]
pub struct SphericalPolygon {
    loops: SmallVec<[Loop; 2]>,
}

impl SphericalPolygon {
    /// Normalize a GeoJSON Polygon or MultiPolygon.
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<Self, GeometryError> {
        match &geometry.value {
            Value::Polygon(rings) => Self::from_polygons(std::iter::once(rings)),
            Value::MultiPolygon(polygons) => Self::from_polygons(polygons.iter()),
            other => Err(GeometryError::UnsupportedKind {
                kind: geometry_kind(other).to_string(),
            }),
        }
    }

    fn from_polygons<'a, I>(polygons: I) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = &'a geojson::PolygonType>,
    {
        let mut loops = SmallVec::new();
        for rings in polygons {
            for ring in rings {
                loops.push(Loop::from_ring(ring)?);
            }
        }
        Ok(Self { loops })
    }

    /// Even-odd nesting: a point is inside when an odd number of loops
    /// contain it.
    pub fn contains(&self, point: Vec3) -> bool {
        self.loops.iter().filter(|l| l.contains(point)).count() % 2 == 1
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Lat/lng rectangle enclosing every loop.
    pub fn bounds(&self) -> Bounds {
        let mut iter = self.loops.iter();
        let Some(first) = iter.next() else {
            return Bounds {
                min_lon: 0.0,
                min_lat: 0.0,
                max_lon: 0.0,
                max_lat: 0.0,
            };
        };
        iter.fold(first.cap.bounds(), |acc, l| acc.union(l.cap.bounds()))
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Geometry;

    fn ring(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
        points.iter().map(|&(lon, lat)| vec![lon, lat]).collect()
    }

    /// Counter-clockwise closed square.
    fn square(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<Vec<f64>> {
        ring(&[
            (min_lon, min_lat),
            (max_lon, min_lat),
            (max_lon, max_lat),
            (min_lon, max_lat),
            (min_lon, min_lat),
        ])
    }

    fn point(lon: f64, lat: f64) -> Vec3 {
        Vec3::from_degrees(lon, lat)
    }

    #[test]
    fn test_loop_drops_closing_point() {
        let l = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(l.len(), 4);
    }

    #[test]
    fn test_too_few_points_rejected() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        assert!(matches!(
            Loop::from_ring(&r),
            Err(GeometryError::TooFewPoints { points: 3 })
        ));
    }

    #[test]
    fn test_unclosed_ring_rejected() {
        let r = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(matches!(
            Loop::from_ring(&r),
            Err(GeometryError::UnclosedRing)
        ));
    }

    #[test]
    fn test_short_position_rejected() {
        let mut r = square(0.0, 0.0, 10.0, 10.0);
        r[2] = vec![10.0];
        assert!(matches!(
            Loop::from_ring(&r),
            Err(GeometryError::ShortPosition)
        ));
    }

    #[test]
    fn test_clockwise_ring_is_normalized() {
        // Same square as `square()`, wound the other way.
        let r = ring(&[
            (0.0, 0.0),
            (0.0, 10.0),
            (10.0, 10.0),
            (10.0, 0.0),
            (0.0, 0.0),
        ]);
        let l = Loop::from_ring(&r).unwrap();
        assert!(!l.is_inverted());
        assert!(l.cap().radius_degrees() <= 90.0);
        assert!(l.contains(point(5.0, 5.0)));
        assert!(!l.contains(point(20.0, 20.0)));
    }

    #[test]
    fn test_open_boundary_model() {
        let l = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        // Vertex.
        assert!(!l.contains(point(0.0, 0.0)));
        // Edge midpoint on the equator, which the edge follows exactly.
        assert!(!l.contains(point(5.0, 0.0)));
        // Strictly inside.
        assert!(l.contains(point(5.0, 5.0)));
    }

    #[test]
    fn test_antipode_is_not_contained() {
        let l = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(!l.contains(point(-175.0, -5.0)));
    }

    #[test]
    fn test_antimeridian_ring_inverts() {
        // Written with raw coordinates the planar shoelace misreads, so the
        // loop gets reversed onto the wrong side and then flipped back by
        // the cap check.
        let r = ring(&[
            (170.0, -10.0),
            (-170.0, -10.0),
            (-170.0, 10.0),
            (170.0, 10.0),
            (170.0, -10.0),
        ]);
        let l = Loop::from_ring(&r).unwrap();
        assert!(l.is_inverted());
        assert!(l.contains(point(175.0, 0.0)));
        assert!(l.contains(point(-175.0, 0.0)));
        assert!(!l.contains(point(0.0, 0.0)));
        assert!(!l.contains(point(90.0, 0.0)));
    }

    #[test]
    fn test_latitude_band_loop_inverts_to_polar_cap() {
        // Eastward ring at latitude -60: the winding guess encloses
        // everything north of it, which is more than a hemisphere.
        let r = ring(&[
            (0.0, -60.0),
            (60.0, -60.0),
            (120.0, -60.0),
            (180.0, -60.0),
            (-120.0, -60.0),
            (-60.0, -60.0),
            (0.0, -60.0),
        ]);
        let l = Loop::from_ring(&r).unwrap();
        assert!(l.is_inverted());
        assert!(l.contains(point(0.0, -89.0)));
        assert!(!l.contains(point(0.0, 0.0)));
        assert!(!l.contains(point(0.0, 89.0)));
    }

    #[test]
    fn test_hole_excluded_by_even_odd_nesting() {
        let geometry = Geometry::new(Value::Polygon(vec![
            square(0.0, 0.0, 10.0, 10.0),
            square(4.0, 4.0, 6.0, 6.0),
        ]));
        let polygon = SphericalPolygon::from_geojson(&geometry).unwrap();
        assert!(polygon.contains(point(2.0, 2.0)));
        assert!(!polygon.contains(point(5.0, 5.0)));
        assert!(!polygon.contains(point(20.0, 20.0)));
    }

    #[test]
    fn test_multipolygon_flattens_into_loops() {
        let geometry = Geometry::new(Value::MultiPolygon(vec![
            vec![square(0.0, 0.0, 10.0, 10.0)],
            vec![square(20.0, 20.0, 30.0, 30.0)],
        ]));
        let polygon = SphericalPolygon::from_geojson(&geometry).unwrap();
        assert_eq!(polygon.loops().len(), 2);
        assert!(polygon.contains(point(5.0, 5.0)));
        assert!(polygon.contains(point(25.0, 25.0)));
        assert!(!polygon.contains(point(15.0, 15.0)));
    }

    #[test]
    fn test_unsupported_geometry_kind() {
        let geometry = Geometry::new(Value::Point(vec![0.0, 0.0]));
        let err = SphericalPolygon::from_geojson(&geometry).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnsupportedKind { ref kind } if kind == "Point"
        ));
    }

    #[test]
    fn test_polar_cap_bounds_span_all_longitudes() {
        let r = ring(&[
            (0.0, 80.0),
            (90.0, 80.0),
            (180.0, 80.0),
            (-90.0, 80.0),
            (0.0, 80.0),
        ]);
        let l = Loop::from_ring(&r).unwrap();
        let bounds = l.cap().bounds();
        assert_eq!(bounds.min_lon, -180.0);
        assert_eq!(bounds.max_lon, 180.0);
    }

    #[test]
    fn test_sub_hemisphere_bounds_cover_the_loop() {
        let l = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        let bounds = l.cap().bounds();
        assert!(bounds.min_lon <= 0.0 && bounds.max_lon >= 10.0);
        assert!(bounds.min_lat <= 0.0 && bounds.max_lat >= 10.0);
    }
}
