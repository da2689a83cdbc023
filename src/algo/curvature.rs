//! Mean and Gaussian curvature from the cotangent Laplacian and angle defect.
//!
//! All operators take a vertex and return `None` where the value is undefined:
//! boundary vertices, isolated vertices, and vertices whose mixed area is not
//! positive.
//!
//! # Curvature Types
//!
//! - **Gaussian curvature K**: angle defect divided by the mixed area
//! - **Mean curvature H**: half the length of the discrete Laplace-Beltrami
//!   vector; the signed variant projects it onto the vertex normal
//!
//! # Example
//!
//! ```
//! use curvmap::mesh::{primitives, VertexId};
//! use curvmap::algo::curvature::{gaussian, mean};
//!
//! let sphere = primitives::icosphere(3).unwrap();
//! let v = VertexId::new(0);
//! assert!((gaussian(&sphere, v).unwrap() - 1.0).abs() < 0.05);
//! assert!((mean(&sphere, v).unwrap() - 1.0).abs() < 0.05);
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use nalgebra::Vector3;

use super::angles::{cot, mixed_area};
use crate::mesh::{Mesh, VertexId};

/// The mean curvature normal `K(x) = 2H n`.
///
/// `(1 / 2A) Σ (cot α + cot β) (x - x_j)` over the neighbours `x_j`, where
/// `α` and `β` are the angles opposite the edge `x x_j` in its two triangles.
pub fn laplacian(mesh: &Mesh, v: VertexId) -> Option<Vector3<f64>> {
    let area = mixed_area(mesh, v)?;
    let corners = mesh.corners();
    let angles = mesh.angles();
    let star = mesh.star(v);
    let here = mesh.position(v);

    let mut sum = Vector3::zeros();
    for &c in &star.corners {
        // The edge from v to next(c) is opposite previous(c).
        let apex = corners.previous(c);
        let across = corners.opposite(apex)?;
        let weight = cot(angles.angle(apex)) + cot(angles.angle(across));
        sum += weight * (here - mesh.corner_position(corners.next(c)));
    }

    Some(sum / (2.0 * area))
}

/// Unsigned mean curvature `|K| / 2`.
pub fn mean(mesh: &Mesh, v: VertexId) -> Option<f64> {
    laplacian(mesh, v).map(|k| 0.5 * k.norm())
}

/// Mean curvature signed by the vertex normal: positive where the surface
/// bends away from its normal, as on a sphere with outward normals.
pub fn mean_signed(mesh: &Mesh, v: VertexId) -> Option<f64> {
    laplacian(mesh, v).map(|k| 0.5 * k.dot(mesh.vertex_normal(v)))
}

/// Gaussian curvature, the angle defect over the mixed area.
pub fn gaussian(mesh: &Mesh, v: VertexId) -> Option<f64> {
    let area = mixed_area(mesh, v)?;
    Some(mesh.angles().defect(v) / area)
}

/// Raw angle defect `2π - Σθ`.
///
/// `None` at boundary and isolated vertices, where the defect does not measure
/// curvature.
pub fn angle_defect(mesh: &Mesh, v: VertexId) -> Option<f64> {
    mesh.star(v)
        .is_closed()
        .then(|| mesh.angles().defect(v))
}

/// Principal curvatures from H and K: `H ± sqrt(H² - K)`.
///
/// A negative discriminant (possible on coarse meshes) collapses both to `H`.
pub fn principal_from_mean_gaussian(h: f64, k: f64) -> (f64, f64) {
    let discriminant = h * h - k;
    if discriminant >= 0.0 {
        let root = discriminant.sqrt();
        (h + root, h - root)
    } else {
        (h, h)
    }
}
