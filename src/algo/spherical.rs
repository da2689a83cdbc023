//! Spherical polygons on the Gauss map.
//!
//! A ring of unit normals around a vertex is a spherical polygon. This module
//! computes its polar dual and tessellates its great-circle arcs into a
//! polyline for display.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{Mesh, VertexId};

/// Below this cross-product length two ring points count as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-12;

/// Angle between two vectors, in `[0, π]`, via `atan2` so it stays accurate
/// for nearly parallel vectors.
#[inline]
pub fn spherical_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// The pole of the great circle through `a` and `b`: `normalize(a × b)`.
///
/// `None` when `a` and `b` are parallel or antiparallel.
pub fn polar_dual(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<Vector3<f64>> {
    a.cross(b).try_normalize(PARALLEL_EPSILON)
}

/// Polar dual of a spherical polygon.
///
/// Entry `i` is dual to the arc from `polygon[i]` to `polygon[i + 1]`,
/// wrapping at the end. Applying the dual twice yields the original polygon
/// shifted by one: `dual(dual(w))[i]` is parallel to `w[i + 1]`.
///
/// `None` if two consecutive points are parallel or the polygon has fewer
/// than two points.
pub fn polar_polygon(polygon: &[Vector3<f64>]) -> Option<Vec<Vector3<f64>>> {
    if polygon.len() < 2 {
        return None;
    }
    (0..polygon.len())
        .map(|i| polar_dual(&polygon[i], &polygon[(i + 1) % polygon.len()]))
        .collect()
}

/// Tessellation settings for Gauss-map polylines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussMapOptions {
    /// Points emitted per arc, counting its start but not its end.
    pub samples_per_arc: usize,
    /// Radius of the sphere the polyline is drawn on.
    pub radius: f64,
}

impl Default for GaussMapOptions {
    fn default() -> Self {
        Self {
            samples_per_arc: 16,
            radius: 1.0,
        }
    }
}

impl GaussMapOptions {
    /// Set the number of samples per arc.
    pub fn with_samples_per_arc(mut self, samples: usize) -> Self {
        self.samples_per_arc = samples;
        self
    }

    /// Set the sphere radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.samples_per_arc == 0 {
            return Err(MeshError::invalid_param(
                "samples_per_arc",
                self.samples_per_arc,
                "must be at least 1",
            ));
        }
        if !(self.radius > 0.0) {
            return Err(MeshError::invalid_param(
                "radius",
                self.radius,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Closed polyline through a ring of unit vectors along great-circle arcs.
///
/// Each arc contributes its start point followed by `samples_per_arc - 1`
/// interior points; the first point is repeated at the end to close the loop.
/// Interior points are linear interpolants pushed back onto the sphere; a
/// point that lands on the origin (antipodal endpoints) is skipped.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] for zero samples or a non-positive radius.
///
/// # Example
///
/// ```
/// use curvmap::algo::spherical::{gauss_map_polyline, GaussMapOptions};
/// use nalgebra::Vector3;
///
/// let ring = [Vector3::x(), Vector3::y(), Vector3::z()];
/// let options = GaussMapOptions::default().with_samples_per_arc(4).with_radius(2.0);
/// let line = gauss_map_polyline(&ring, &options).unwrap();
/// assert_eq!(line.len(), 3 * 4 + 1);
/// assert!(line.iter().all(|p| (p.coords.norm() - 2.0).abs() < 1e-12));
/// ```
pub fn gauss_map_polyline(ring: &[Vector3<f64>], options: &GaussMapOptions) -> Result<Vec<Point3<f64>>> {
    options.validate()?;
    Ok(sample_arcs(ring, true, options))
}

/// Open polyline through a chain of unit vectors: like
/// [`gauss_map_polyline`] without the arc from the last point back to the
/// first.
pub fn gauss_map_chain(chain: &[Vector3<f64>], options: &GaussMapOptions) -> Result<Vec<Point3<f64>>> {
    options.validate()?;
    Ok(sample_arcs(chain, false, options))
}

fn sample_arcs(ring: &[Vector3<f64>], closed: bool, options: &GaussMapOptions) -> Vec<Point3<f64>> {
    let (Some(first), Some(last)) = (ring.first(), ring.last()) else {
        return Vec::new();
    };

    let r = options.radius;
    let count = options.samples_per_arc;
    let arcs = if closed { ring.len() } else { ring.len() - 1 };
    let mut points = Vec::with_capacity(arcs * count + 1);

    for (i, current) in ring.iter().enumerate().take(arcs) {
        let next = &ring[(i + 1) % ring.len()];
        points.push(Point3::from(r * *current));
        for j in 1..count {
            let t = j as f64 / count as f64;
            let lerp = (1.0 - t) * *current + t * *next;
            match lerp.try_normalize(PARALLEL_EPSILON) {
                Some(dir) => points.push(Point3::from(r * dir)),
                None => log::warn!("skipping Gauss map sample between antipodal normals"),
            }
        }
    }
    points.push(Point3::from(r * if closed { *first } else { *last }));

    points
}

/// Triangle normals around a vertex, in star order.
pub fn normal_ring(mesh: &Mesh, v: VertexId) -> Vec<Vector3<f64>> {
    mesh.star(v)
        .corners
        .iter()
        .map(|c| mesh.triangle(c.triangle()).normal)
        .collect()
}

/// Gauss-map polyline of the star of `v`.
///
/// Interior stars give a closed loop. On the boundary consecutive triangles
/// share an edge only inside the fan, so the polyline stops at the last
/// normal instead of wrapping across the gap. An isolated vertex yields an
/// empty polyline.
pub fn vertex_gauss_map(mesh: &Mesh, v: VertexId, options: &GaussMapOptions) -> Result<Vec<Point3<f64>>> {
    let ring = normal_ring(mesh, v);
    if mesh.star(v).boundary {
        gauss_map_chain(&ring, options)
    } else {
        gauss_map_polyline(&ring, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn square_ring() -> Vec<Vector3<f64>> {
        // Four normals around the +z pole, 45 degrees down.
        (0..4)
            .map(|k| {
                let a = k as f64 * FRAC_PI_2;
                Vector3::new(a.cos(), a.sin(), 1.0).normalize()
            })
            .collect()
    }

    #[test]
    fn test_spherical_angle() {
        assert!((spherical_angle(&Vector3::x(), &Vector3::y()) - FRAC_PI_2).abs() < 1e-12);
        assert!((spherical_angle(&Vector3::x(), &-Vector3::x()) - PI).abs() < 1e-12);
        assert_eq!(spherical_angle(&Vector3::z(), &Vector3::z()), 0.0);
    }

    #[test]
    fn test_polar_dual_of_octant() {
        let ring = [Vector3::x(), Vector3::y(), Vector3::z()];
        let dual = polar_polygon(&ring).unwrap();
        assert!((dual[0] - Vector3::z()).norm() < 1e-12);
        assert!((dual[1] - Vector3::x()).norm() < 1e-12);
        assert!((dual[2] - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_polar_round_trip() {
        let ring = square_ring();
        let twice = polar_polygon(&polar_polygon(&ring).unwrap()).unwrap();
        assert_eq!(twice.len(), ring.len());
        for i in 0..ring.len() {
            let original = ring[(i + 1) % ring.len()];
            assert!(twice[i].dot(&original).abs() > 1.0 - 1e-12);
        }
    }

    #[test]
    fn test_degenerate_polar() {
        assert!(polar_dual(&Vector3::z(), &(2.0 * Vector3::z())).is_none());
        assert!(polar_polygon(&[Vector3::z(), Vector3::z()]).is_none());
        assert!(polar_polygon(&[Vector3::z()]).is_none());
    }

    #[test]
    fn test_polyline_closes() {
        let ring = square_ring();
        let options = GaussMapOptions::default().with_samples_per_arc(5);
        let line = gauss_map_polyline(&ring, &options).unwrap();
        assert_eq!(line.len(), 4 * 5 + 1);
        assert_eq!(line.first(), line.last());
        for p in &line {
            assert!((p.coords.norm() - 1.0).abs() < 1e-12);
        }
        // Interpolated points stay between their endpoints.
        let mid = line[2].coords;
        assert!(mid.x > 0.0 && mid.y > 0.0);
    }

    #[test]
    fn test_polyline_rejects_bad_options() {
        let ring = square_ring();
        let zero = GaussMapOptions::default().with_samples_per_arc(0);
        assert!(matches!(
            gauss_map_polyline(&ring, &zero),
            Err(MeshError::InvalidParameter { name: "samples_per_arc", .. })
        ));
        let negative = GaussMapOptions::default().with_radius(-1.0);
        assert!(gauss_map_polyline(&ring, &negative).is_err());
        assert!(gauss_map_polyline(&[], &GaussMapOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_octahedron_gauss_map() {
        let mesh = primitives::octahedron().unwrap();
        for v in mesh.vertex_ids() {
            let ring = normal_ring(&mesh, v);
            assert_eq!(ring.len(), 4);

            let line = vertex_gauss_map(&mesh, v, &GaussMapOptions::default()).unwrap();
            assert_eq!(line.len(), 4 * 16 + 1);
        }
    }

    #[test]
    fn test_boundary_gauss_map_stays_open() {
        // Lift one corner of a 2x2 grid so the fan at the corner's
        // neighbour is not flat.
        let mesh = primitives::height_field(2, 2.0, |x, y| if x < 0.0 && y < 0.0 { 0.5 } else { 0.0 })
            .unwrap();
        let v = VertexId::new(1);
        let star = mesh.star(v);
        assert!(star.boundary);
        let ring = normal_ring(&mesh, v);

        let options = GaussMapOptions::default().with_samples_per_arc(4);
        let line = vertex_gauss_map(&mesh, v, &options).unwrap();
        assert_eq!(line.len(), (ring.len() - 1) * 4 + 1);
        assert_eq!(line.first().unwrap().coords, ring[0]);
        assert_eq!(line.last().unwrap().coords, ring[ring.len() - 1]);
    }

    #[test]
    fn test_chain_of_one_point() {
        let line = gauss_map_chain(&[Vector3::z()], &GaussMapOptions::default()).unwrap();
        assert_eq!(line, vec![Point3::new(0.0, 0.0, 1.0)]);
        assert!(gauss_map_chain(&[], &GaussMapOptions::default()).unwrap().is_empty());
    }
}
