//! Corner angles and mixed Voronoi weights.
//!
//! The [`AngleTable`] is filled by one linear pass over the corner array, so
//! every corner contributes to its vertex total exactly once regardless of
//! boundaries. It is cached on the mesh and reached through [`Mesh::angles`].
//!
//! Mixed areas and perimeters follow Meyer et al.: inside non-obtuse
//! triangles the Voronoi cell of the vertex is used, obtuse triangles fall
//! back to fixed fractions of the triangle.
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::{Point3, Vector3};

use crate::mesh::{CornerId, Mesh, VertexId};

/// Smallest sine used when turning an angle into a cotangent.
pub const SIN_EPSILON: f64 = 1e-12;

/// Interior angle of every corner, plus the sum per vertex.
#[derive(Debug, Clone)]
pub struct AngleTable {
    corners: Vec<f64>,
    totals: Vec<f64>,
}

impl AngleTable {
    /// Compute all corner angles of `mesh`.
    pub fn compute(mesh: &Mesh) -> Self {
        let table = mesh.corners();
        let mut corners = Vec::with_capacity(table.len());
        let mut totals = vec![0.0; mesh.num_vertices()];
        let mut degenerate = 0usize;

        for (c, corner) in table.iter() {
            let here = mesh.position(corner.vertex);
            let next = mesh.corner_position(table.next(c));
            let prev = mesh.corner_position(table.previous(c));

            let angle = match corner_angle(here, next, prev) {
                Some(a) => a,
                None => {
                    degenerate += 1;
                    0.0
                }
            };
            corners.push(angle);
            totals[corner.vertex.index()] += angle;
        }

        if degenerate > 0 {
            log::warn!("{} corners have a zero-length edge; their angle is 0", degenerate);
        }

        Self { corners, totals }
    }

    /// Interior angle at a corner, in radians.
    #[inline]
    pub fn angle(&self, c: CornerId) -> f64 {
        self.corners[c.index()]
    }

    /// Sum of the corner angles at a vertex.
    #[inline]
    pub fn total(&self, v: VertexId) -> f64 {
        self.totals[v.index()]
    }

    /// `2π` minus the total angle at a vertex.
    #[inline]
    pub fn defect(&self, v: VertexId) -> f64 {
        TAU - self.total(v)
    }

    /// All corner angles, indexed by corner.
    pub fn corner_angles(&self) -> &[f64] {
        &self.corners
    }

    /// All vertex totals, indexed by vertex.
    pub fn vertex_totals(&self) -> &[f64] {
        &self.totals
    }
}

/// Angle at `here` between the directions to `next` and `prev`.
///
/// `None` if either direction has zero length.
pub fn corner_angle(here: &Point3<f64>, next: &Point3<f64>, prev: &Point3<f64>) -> Option<f64> {
    let a = (next - here).try_normalize(0.0)?;
    let b = (prev - here).try_normalize(0.0)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

/// Cotangent of an angle, with the sine clamped away from zero.
#[inline]
pub fn cot(angle: f64) -> f64 {
    angle.cos() / angle.sin().max(SIN_EPSILON)
}

/// The three corner angles of the triangle of `c`, starting at `c`.
fn triangle_angles(mesh: &Mesh, c: CornerId) -> [f64; 3] {
    let angles = mesh.angles();
    [
        angles.angle(c),
        angles.angle(c.next()),
        angles.angle(c.previous()),
    ]
}

/// Positions of the triangle of `c`, starting at `c`.
fn triangle_positions(mesh: &Mesh, c: CornerId) -> [Point3<f64>; 3] {
    [
        *mesh.corner_position(c),
        *mesh.corner_position(c.next()),
        *mesh.corner_position(c.previous()),
    ]
}

/// Share of the triangle of `c` that belongs to the mixed area of its vertex.
pub fn corner_mixed_area(mesh: &Mesh, c: CornerId) -> f64 {
    let area = mesh.triangle(c.triangle()).area;
    let [here, next, prev] = triangle_angles(mesh, c);

    if next > FRAC_PI_2 || prev > FRAC_PI_2 {
        0.25 * area
    } else if here > FRAC_PI_2 {
        0.5 * area
    } else {
        let [p, n, q] = triangle_positions(mesh, c);
        // Edge opposite `next` is p-q, edge opposite `prev` is p-n.
        0.125 * ((q - p).norm_squared() * cot(next) + (n - p).norm_squared() * cot(prev))
    }
}

/// Length of the mixed-cell boundary of the vertex of `c` inside its triangle.
pub fn corner_mixed_perimeter(mesh: &Mesh, c: CornerId) -> f64 {
    let tri = mesh.triangle(c.triangle());
    let [here, next, prev] = triangle_angles(mesh, c);
    let [p, n, q] = triangle_positions(mesh, c);
    let to_next = (n - p).norm();
    let to_prev = (q - p).norm();
    let opposite = (q - n).norm();

    if next > FRAC_PI_2 || prev > FRAC_PI_2 {
        // Midline parallel to the opposite edge.
        0.5 * opposite
    } else if here > FRAC_PI_2 {
        0.5 * (to_next + to_prev)
    } else if tri.is_degenerate() {
        0.0
    } else {
        let r = to_next * to_prev * opposite / (4.0 * tri.area);
        let half_chord = |e: f64| (r * r - 0.25 * e * e).max(0.0).sqrt();
        half_chord(to_next) + half_chord(to_prev)
    }
}

/// Mixed Voronoi area of a vertex.
///
/// `None` at boundary or isolated vertices, or when the accumulated area is
/// not positive.
pub fn mixed_area(mesh: &Mesh, v: VertexId) -> Option<f64> {
    let star = mesh.star(v);
    if !star.is_closed() {
        return None;
    }
    let area: f64 = star.corners.iter().map(|&c| corner_mixed_area(mesh, c)).sum();
    (area > 0.0).then_some(area)
}

/// Mixed perimeter of a vertex: the length of its mixed cell's boundary.
///
/// `None` under the same conditions as [`mixed_area`].
pub fn mixed_perimeter(mesh: &Mesh, v: VertexId) -> Option<f64> {
    let star = mesh.star(v);
    if !star.is_closed() {
        return None;
    }
    let perimeter: f64 = star
        .corners
        .iter()
        .map(|&c| corner_mixed_perimeter(mesh, c))
        .sum();
    (perimeter > 0.0).then_some(perimeter)
}

/// Unit normal of the triangle of a corner.
#[inline]
pub(crate) fn corner_normal(mesh: &Mesh, c: CornerId) -> Vector3<f64> {
    mesh.triangle(c.triangle()).normal
}
