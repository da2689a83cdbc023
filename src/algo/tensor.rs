//! Curvature tensor fitting, smoothing and principal directions.
//!
//! For each interior vertex a tangent frame `{e1, e2}` is built from the
//! first neighbour edge projected onto the tangent plane. Every neighbour `w`
//! gives one normal-curvature sample `2 (v - w)·n / |v - w|²` along the unit
//! tangent direction `(x, y)` of the edge, and the symmetric tensor
//! `[[a, b], [b, c]]` is the least-squares solution of
//! `a x² + 2b xy + c y² = κ`.
//!
//! The tensor is also kept in the ambient frame (`B T Bᵀ` with `B = [e1 e2]`)
//! so neighbouring tensors can be averaged before the eigen-decomposition.
//!
//! # Example
//!
//! ```
//! use curvmap::mesh::primitives;
//! use curvmap::algo::tensor::{CurvatureTensorField, TensorSmoothing};
//!
//! let sphere = primitives::icosphere(2).unwrap();
//! let field = CurvatureTensorField::compute(&sphere, &TensorSmoothing::default(), true).unwrap();
//! let k1 = field.k1_values();
//! assert!(k1.iter().all(|k| (k - 1.0).abs() < 0.05));
//! ```

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Matrix3x2, Vector2, Vector3};
use rayon::prelude::*;

use super::angles::corner_mixed_area;
use crate::error::{MeshError, Result};
use crate::mesh::{CornerId, Mesh, TriangleId, VertexId};

/// Tolerance passed to the SVD least-squares solve.
const SVD_EPSILON: f64 = 1e-12;

/// Principal curvatures and directions at a vertex, `k1 >= k2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalCurvature {
    /// Maximum principal curvature.
    pub k1: f64,
    /// Minimum principal curvature.
    pub k2: f64,
    /// Unit direction of `k1`, in the ambient frame.
    pub d1: Vector3<f64>,
    /// Unit direction of `k2`, in the ambient frame.
    pub d2: Vector3<f64>,
}

/// The tangent plane of a vertex with its fitted curvature tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentSpace {
    /// The vertex this frame belongs to.
    pub vertex: VertexId,
    /// Unit vertex normal.
    pub normal: Vector3<f64>,
    /// First tangent axis.
    pub e1: Vector3<f64>,
    /// Second tangent axis, `normal × e1`.
    pub e2: Vector3<f64>,
    /// Tensor in `{e1, e2}` coordinates.
    pub tensor: Matrix2<f64>,
    /// The same tensor in the ambient frame.
    pub global: Matrix3<f64>,
}

impl TangentSpace {
    /// Build an orthonormal frame for `normal` whose first axis follows
    /// `reference` projected onto the tangent plane.
    ///
    /// `None` if `reference` is parallel to `normal` or `normal` is zero.
    pub fn new(vertex: VertexId, normal: Vector3<f64>, reference: Vector3<f64>) -> Option<Self> {
        let normal = normal.try_normalize(0.0)?;
        let e1 = (reference - reference.dot(&normal) * normal).try_normalize(1e-12)?;
        let e2 = normal.cross(&e1);
        Some(Self {
            vertex,
            normal,
            e1,
            e2,
            tensor: Matrix2::zeros(),
            global: Matrix3::zeros(),
        })
    }

    /// The 3x2 matrix `[e1 e2]`.
    #[inline]
    pub fn basis(&self) -> Matrix3x2<f64> {
        Matrix3x2::from_columns(&[self.e1, self.e2])
    }

    /// Coordinates of `d` projected onto the tangent plane.
    #[inline]
    pub fn local_coordinates(&self, d: &Vector3<f64>) -> Vector2<f64> {
        Vector2::new(d.dot(&self.e1), d.dot(&self.e2))
    }

    /// Lift tangent-plane coordinates back to the ambient frame.
    #[inline]
    pub fn to_global(&self, local: &Vector2<f64>) -> Vector3<f64> {
        self.basis() * local
    }

    /// Express a tangent-plane tensor in the ambient frame.
    pub fn to_global_tensor(&self, local: &Matrix2<f64>) -> Matrix3<f64> {
        let b = self.basis();
        b * local * b.transpose()
    }

    /// Restrict an ambient tensor to the tangent plane.
    pub fn to_local_tensor(&self, global: &Matrix3<f64>) -> Matrix2<f64> {
        let b = self.basis();
        b.transpose() * global * b
    }

    /// Set the local tensor and refresh its ambient copy.
    pub fn set_tensor(&mut self, tensor: Matrix2<f64>) {
        self.global = self.to_global_tensor(&tensor);
        self.tensor = tensor;
    }

    /// Eigen-decompose the local tensor.
    pub fn principal(&self) -> PrincipalCurvature {
        let eigen = self.tensor.symmetric_eigen();
        let (max, min) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };
        let d1: Vector2<f64> = eigen.eigenvectors.column(max).into_owned();
        let d2: Vector2<f64> = eigen.eigenvectors.column(min).into_owned();
        PrincipalCurvature {
            k1: eigen.eigenvalues[max],
            k2: eigen.eigenvalues[min],
            d1: self.to_global(&d1),
            d2: self.to_global(&d2),
        }
    }
}

/// Normal curvature along the edge from `v` to `w`, `2 (v - w)·n / |v - w|²`.
pub fn normal_curvature(mesh: &Mesh, v: VertexId, w: VertexId) -> f64 {
    let d = mesh.position(v) - mesh.position(w);
    let len2 = d.norm_squared();
    if len2 > 0.0 {
        2.0 * d.dot(mesh.vertex_normal(v)) / len2
    } else {
        0.0
    }
}

/// Fit the curvature tensor at `v`.
///
/// `None` for boundary vertices, vertices with fewer than three usable
/// neighbours, and when the least-squares solve fails.
pub fn tangent_space(mesh: &Mesh, v: VertexId) -> Option<TangentSpace> {
    if !mesh.star(v).is_closed() {
        return None;
    }
    let neighbors = mesh.neighbors(v);
    let here = mesh.position(v);
    let first = mesh.position(*neighbors.first()?) - here;
    let mut space = TangentSpace::new(v, *mesh.vertex_normal(v), first)?;

    let mut rows = Vec::with_capacity(3 * neighbors.len());
    let mut targets = Vec::with_capacity(neighbors.len());
    for &w in &neighbors {
        let Some(dir) = space
            .local_coordinates(&(mesh.position(w) - here))
            .try_normalize(1e-12)
        else {
            continue;
        };
        rows.extend_from_slice(&[dir.x * dir.x, 2.0 * dir.x * dir.y, dir.y * dir.y]);
        targets.push(normal_curvature(mesh, v, w));
    }
    if targets.len() < 3 {
        return None;
    }

    let a = DMatrix::from_row_slice(targets.len(), 3, &rows);
    let b = DVector::from_vec(targets);
    let x = a.svd(true, true).solve(&b, SVD_EPSILON).ok()?;

    space.set_tensor(Matrix2::new(x[0], x[1], x[1], x[2]));
    Some(space)
}

/// Principal curvatures at `v` from its unsmoothed tensor.
pub fn principal_curvature(mesh: &Mesh, v: VertexId) -> Option<PrincipalCurvature> {
    tangent_space(mesh, v).map(|s| s.principal())
}

/// Diffusion of the ambient-frame tensors over the vertex graph.
///
/// Each iteration moves every tensor toward the mean of its neighbours'
/// tensors by `time_step`. Zero iterations leaves the fit untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorSmoothing {
    /// Step size, in `[0, 1]`.
    pub time_step: f64,
    /// Number of diffusion steps.
    pub iterations: usize,
}

impl Default for TensorSmoothing {
    fn default() -> Self {
        Self {
            time_step: 0.5,
            iterations: 0,
        }
    }
}

impl TensorSmoothing {
    /// Set the diffusion step size.
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set the number of diffusion steps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.time_step) {
            return Err(MeshError::invalid_param(
                "time_step",
                self.time_step,
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Average the ambient tensors of neighbouring vertices, then re-project
/// each onto its own tangent plane.
///
/// Vertices without a tangent space neither change nor contribute.
pub fn smooth_tensors(mesh: &Mesh, spaces: &mut [Option<TangentSpace>], smoothing: &TensorSmoothing) {
    if smoothing.iterations == 0 {
        return;
    }
    let neighbors: Vec<Vec<VertexId>> = mesh.vertex_ids().map(|v| mesh.neighbors(v)).collect();

    for _ in 0..smoothing.iterations {
        let updated: Vec<Option<Matrix3<f64>>> = spaces
            .iter()
            .enumerate()
            .map(|(i, space)| {
                let space = space.as_ref()?;
                let (sum, count) = neighbors[i]
                    .iter()
                    .filter_map(|w| spaces[w.index()].as_ref())
                    .fold((Matrix3::zeros(), 0usize), |(s, n), w| (s + w.global, n + 1));
                if count == 0 {
                    return Some(space.global);
                }
                let mean = sum / count as f64;
                Some(space.global + smoothing.time_step * (mean - space.global))
            })
            .collect();

        for (space, global) in spaces.iter_mut().zip(updated) {
            if let (Some(space), Some(global)) = (space.as_mut(), global) {
                space.global = global;
            }
        }
    }

    for space in spaces.iter_mut().flatten() {
        space.tensor = space.to_local_tensor(&space.global);
    }
}

/// Tensors and principal curvatures of every vertex of a mesh.
#[derive(Debug, Clone)]
pub struct CurvatureTensorField {
    spaces: Vec<Option<TangentSpace>>,
    principal: Vec<Option<PrincipalCurvature>>,
}

impl CurvatureTensorField {
    /// Fit, optionally smooth, and decompose the tensor of every vertex.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidParameter`] if the smoothing step is outside `[0, 1]`.
    pub fn compute(mesh: &Mesh, smoothing: &TensorSmoothing, parallel: bool) -> Result<Self> {
        smoothing.validate()?;

        let mut spaces: Vec<Option<TangentSpace>> = if parallel {
            (0..mesh.num_vertices())
                .into_par_iter()
                .map(|i| tangent_space(mesh, VertexId::new(i)))
                .collect()
        } else {
            mesh.vertex_ids().map(|v| tangent_space(mesh, v)).collect()
        };

        let missing = spaces.iter().filter(|s| s.is_none()).count();
        log::debug!(
            "fitted {} curvature tensors ({} vertices without one)",
            spaces.len() - missing,
            missing
        );

        smooth_tensors(mesh, &mut spaces, smoothing);

        let principal = spaces
            .iter()
            .map(|s| s.as_ref().map(TangentSpace::principal))
            .collect();

        Ok(Self { spaces, principal })
    }

    /// The tangent space of a vertex, if it has one.
    #[inline]
    pub fn tangent_space(&self, v: VertexId) -> Option<&TangentSpace> {
        self.spaces[v.index()].as_ref()
    }

    /// Principal curvatures of a vertex, if defined.
    #[inline]
    pub fn principal(&self, v: VertexId) -> Option<&PrincipalCurvature> {
        self.principal[v.index()].as_ref()
    }

    /// Maximum principal curvature per vertex, 0 where undefined.
    pub fn k1_values(&self) -> Vec<f64> {
        self.principal.iter().map(|p| p.map_or(0.0, |p| p.k1)).collect()
    }

    /// Minimum principal curvature per vertex, 0 where undefined.
    pub fn k2_values(&self) -> Vec<f64> {
        self.principal.iter().map(|p| p.map_or(0.0, |p| p.k2)).collect()
    }

    /// Number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    /// True for an empty field.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

/// Principal directions averaged over one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Streamline {
    /// Unit direction of maximum curvature, or zero if undefined.
    pub major: Vector3<f64>,
    /// Unit direction of minimum curvature, or zero if undefined.
    pub minor: Vector3<f64>,
}

/// Per-triangle principal directions: the corner vertices' directions
/// weighted by their share of the triangle's mixed area.
///
/// Directions are sign-less, so each one is flipped to agree with the first
/// before summing.
pub fn triangle_streamlines(mesh: &Mesh, field: &CurvatureTensorField) -> Vec<Streamline> {
    mesh.triangle_ids()
        .map(|t| triangle_streamline(mesh, field, t))
        .collect()
}

fn triangle_streamline(mesh: &Mesh, field: &CurvatureTensorField, t: TriangleId) -> Streamline {
    let tri = mesh.triangle(t);
    let mut major = Vector3::zeros();
    let mut minor = Vector3::zeros();
    let mut reference: Option<(Vector3<f64>, Vector3<f64>)> = None;

    if !tri.is_degenerate() {
        for (slot, &v) in tri.vertices.iter().enumerate() {
            let Some(p) = field.principal(v) else {
                continue;
            };
            let weight = corner_mixed_area(mesh, CornerId::from_slot(t, slot)) / tri.area;
            let (r1, r2) = *reference.get_or_insert((p.d1, p.d2));
            let align = |d: Vector3<f64>, r: Vector3<f64>| if d.dot(&r) < 0.0 { -d } else { d };
            major += weight * align(p.d1, r1);
            minor += weight * align(p.d2, r2);
        }
    }

    Streamline {
        major: major.try_normalize(0.0).unwrap_or_else(Vector3::zeros),
        minor: minor.try_normalize(0.0).unwrap_or_else(Vector3::zeros),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_frame_is_orthonormal() {
        let space = TangentSpace::new(
            VertexId::new(0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(1.0, 1.0, 5.0),
        )
        .unwrap();
        assert!((space.normal - Vector3::z()).norm() < 1e-12);
        assert!((space.e1 - Vector3::new(1.0, 1.0, 0.0).normalize()).norm() < 1e-12);
        assert!(space.e1.dot(&space.e2).abs() < 1e-12);
        assert!(space.e2.dot(&space.normal).abs() < 1e-12);
        assert!((space.e2.norm() - 1.0).abs() < 1e-12);

        assert!(TangentSpace::new(VertexId::new(0), Vector3::z(), Vector3::z()).is_none());
    }

    #[test]
    fn test_global_local_roundtrip() {
        let mut space =
            TangentSpace::new(VertexId::new(0), Vector3::new(1.0, 2.0, 3.0), Vector3::x()).unwrap();
        let tensor = Matrix2::new(2.0, 0.5, 0.5, -1.0);
        space.set_tensor(tensor);
        assert!((space.to_local_tensor(&space.global) - tensor).norm() < 1e-12);
        // The ambient tensor annihilates the normal.
        assert!((space.global * space.normal).norm() < 1e-12);
    }

    #[test]
    fn test_principal_ordering() {
        let mut space = TangentSpace::new(VertexId::new(0), Vector3::z(), Vector3::x()).unwrap();
        space.set_tensor(Matrix2::new(-1.0, 0.0, 0.0, 3.0));
        let p = space.principal();
        assert!((p.k1 - 3.0).abs() < 1e-12);
        assert!((p.k2 + 1.0).abs() < 1e-12);
        assert!(p.d1.dot(&Vector3::y()).abs() > 1.0 - 1e-12);
        assert!(p.d2.dot(&Vector3::x()).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_sphere_principal_curvatures() {
        let mesh = primitives::icosphere(2).unwrap();
        for v in mesh.vertex_ids() {
            let p = principal_curvature(&mesh, v).unwrap();
            assert!((p.k1 - 1.0).abs() < 0.05, "k1 at {:?} = {}", v, p.k1);
            assert!((p.k2 - 1.0).abs() < 0.05, "k2 at {:?} = {}", v, p.k2);
            assert!(p.k1 >= p.k2);
            assert!(p.d1.dot(mesh.vertex_normal(v)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_tensor_vanishes() {
        let mesh = primitives::grid(4, 4.0).unwrap();
        for v in mesh.vertex_ids() {
            match tangent_space(&mesh, v) {
                Some(space) => assert!(space.tensor.norm() < 1e-10),
                None => assert!(mesh.is_boundary_vertex(v)),
            }
        }
    }

    #[test]
    fn test_saddle_principal_signs() {
        let mesh = primitives::height_field(8, 1.0, |x, y| x * x - y * y).unwrap();
        let p = principal_curvature(&mesh, VertexId::new(40)).unwrap();
        assert!(p.k1 > 0.5);
        assert!(p.k2 < -0.5);
    }

    #[test]
    fn test_smoothing_reduces_anisotropy() {
        let mesh = primitives::icosphere(2).unwrap();
        let raw = CurvatureTensorField::compute(&mesh, &TensorSmoothing::default(), false).unwrap();
        let smoothing = TensorSmoothing::default().with_iterations(5).with_time_step(0.5);
        let smooth = CurvatureTensorField::compute(&mesh, &smoothing, true).unwrap();

        let anisotropy = |field: &CurvatureTensorField| {
            mesh.vertex_ids()
                .map(|v| field.principal(v).map_or(0.0, |p| p.k1 - p.k2))
                .fold(0.0, f64::max)
        };
        assert!(anisotropy(&raw) > 0.01);
        assert!(anisotropy(&smooth) < 0.005);
        // Neighbouring tangent planes differ, so averaging shrinks the values a little.
        assert!(smooth.k2_values().iter().all(|&k| k > 0.85 && k < 1.0));
    }

    #[test]
    fn test_zero_time_step_keeps_fit() {
        let mesh = primitives::torus(2.0, 0.5, 16, 8).unwrap();
        let raw = CurvatureTensorField::compute(&mesh, &TensorSmoothing::default(), false).unwrap();
        let smoothing = TensorSmoothing::default().with_iterations(3).with_time_step(0.0);
        let same = CurvatureTensorField::compute(&mesh, &smoothing, false).unwrap();
        for (a, b) in raw.k1_values().iter().zip(same.k1_values()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_time_step() {
        let mesh = primitives::octahedron().unwrap();
        let smoothing = TensorSmoothing::default().with_time_step(-0.1);
        assert!(matches!(
            CurvatureTensorField::compute(&mesh, &smoothing, false),
            Err(MeshError::InvalidParameter { name: "time_step", .. })
        ));
    }

    #[test]
    fn test_torus_streamlines_follow_tube() {
        let mesh = primitives::torus(2.0, 0.5, 48, 24).unwrap();
        let field = CurvatureTensorField::compute(&mesh, &TensorSmoothing::default(), true).unwrap();
        let lines = triangle_streamlines(&mesh, &field);
        assert_eq!(lines.len(), mesh.num_triangles());

        // Around the outer equator the tube circle curves most.
        let t = TriangleId::new(0);
        let line = &lines[t.index()];
        assert!((line.major.norm() - 1.0).abs() < 1e-9);
        assert!(line.major.z.abs() > 0.9, "major = {:?}", line.major);
        assert!(line.minor.y.abs() > 0.9, "minor = {:?}", line.minor);
    }
}
