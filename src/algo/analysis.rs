//! Whole-mesh curvature analysis.
//!
//! [`CurvatureKind`] names every per-vertex estimator in the crate, and
//! [`vertex_curvatures`] evaluates one of them over a mesh, producing one value
//! per vertex in vertex order. Undefined values (boundary and isolated
//! vertices) come back as `0.0`.
//!
//! # Example
//!
//! ```
//! use curvmap::algo::analysis::{vertex_curvatures, AnalysisOptions, CurvatureKind, FieldStats};
//! use curvmap::mesh::primitives;
//!
//! let sphere = primitives::icosphere(2).unwrap();
//! let values = vertex_curvatures(&sphere, CurvatureKind::Gaussian, &AnalysisOptions::default()).unwrap();
//! assert_eq!(values.len(), sphere.num_vertices());
//!
//! let stats = FieldStats::from_values(&values).unwrap();
//! assert!((stats.mean - 1.0).abs() < 0.05);
//! ```

use std::f64::consts::TAU;
use std::fmt;
use std::time::Instant;

use rayon::prelude::*;

use super::curvature;
use super::distortion::{self, RingReduction};
use super::tensor::{principal_curvature, CurvatureTensorField, TensorSmoothing};
use crate::error::Result;
use crate::mesh::{Mesh, VertexId};

/// A per-vertex curvature estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurvatureKind {
    /// Gauss-image perimeter over mixed perimeter.
    Horizon,
    /// Per-triangle horizon measure averaged onto vertices.
    TriangleHorizon,
    /// Unsigned mean curvature.
    Mean,
    /// Mean curvature signed by the vertex normal.
    MeanSigned,
    /// Angle defect over mixed area.
    Gaussian,
    /// Raw angle defect.
    AngleDefect,
    /// Sum of unsigned normal turns.
    Distortion,
    /// Sum of signed normal turns.
    DistortionSigned,
    /// Dual cone curvature, `2π` minus the unsigned normal turns.
    Cone,
    /// Largest signed normal turn.
    MaxPrincipalDistortion,
    /// Smallest signed normal turn.
    MinPrincipalDistortion,
    /// Product of the extreme turns.
    FalseGaussian,
    /// Mean of the extreme turns.
    FalseMean,
    /// Deviation of the extreme-turn edges from perpendicular.
    PrincipalDeviation,
    /// Larger eigenvalue of the fitted curvature tensor.
    PrincipalMax,
    /// Smaller eigenvalue of the fitted curvature tensor.
    PrincipalMin,
}

impl CurvatureKind {
    /// Every kind, in display order.
    pub const ALL: [CurvatureKind; 16] = [
        CurvatureKind::Horizon,
        CurvatureKind::TriangleHorizon,
        CurvatureKind::Mean,
        CurvatureKind::MeanSigned,
        CurvatureKind::Gaussian,
        CurvatureKind::AngleDefect,
        CurvatureKind::Distortion,
        CurvatureKind::DistortionSigned,
        CurvatureKind::Cone,
        CurvatureKind::MaxPrincipalDistortion,
        CurvatureKind::MinPrincipalDistortion,
        CurvatureKind::FalseGaussian,
        CurvatureKind::FalseMean,
        CurvatureKind::PrincipalDeviation,
        CurvatureKind::PrincipalMax,
        CurvatureKind::PrincipalMin,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            CurvatureKind::Horizon => "Horizon measure",
            CurvatureKind::TriangleHorizon => "Triangle horizon measure",
            CurvatureKind::Mean => "Unsigned mean curvature",
            CurvatureKind::MeanSigned => "Mean curvature",
            CurvatureKind::Gaussian => "Gaussian curvature",
            CurvatureKind::AngleDefect => "Angle defect",
            CurvatureKind::Distortion => "Unsigned distortion",
            CurvatureKind::DistortionSigned => "Distortion",
            CurvatureKind::Cone => "Cone curvature",
            CurvatureKind::MaxPrincipalDistortion => "Max principal distortion",
            CurvatureKind::MinPrincipalDistortion => "Min principal distortion",
            CurvatureKind::FalseGaussian => "False Gaussian curvature",
            CurvatureKind::FalseMean => "False mean curvature",
            CurvatureKind::PrincipalDeviation => "Principal deviation",
            CurvatureKind::PrincipalMax => "Max principal curvature",
            CurvatureKind::PrincipalMin => "Min principal curvature",
        }
    }

    /// The ring reduction behind a distortion-family kind.
    pub fn ring_reduction(self) -> Option<RingReduction> {
        match self {
            CurvatureKind::Distortion => Some(RingReduction::Unsigned),
            CurvatureKind::DistortionSigned => Some(RingReduction::Signed),
            CurvatureKind::MaxPrincipalDistortion => Some(RingReduction::Max),
            CurvatureKind::MinPrincipalDistortion => Some(RingReduction::Min),
            CurvatureKind::FalseGaussian => Some(RingReduction::FalseGaussian),
            CurvatureKind::FalseMean => Some(RingReduction::FalseMean),
            CurvatureKind::PrincipalDeviation => Some(RingReduction::PrincipalDeviation),
            _ => None,
        }
    }
}

impl fmt::Display for CurvatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options for whole-mesh analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to evaluate vertices in parallel (default: true).
    pub parallel: bool,
    /// Tensor smoothing for [`CurvatureKind::PrincipalMax`] and
    /// [`CurvatureKind::PrincipalMin`].
    pub smoothing: TensorSmoothing,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            smoothing: TensorSmoothing::default(),
        }
    }
}

impl AnalysisOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the tensor smoothing.
    pub fn with_smoothing(mut self, smoothing: TensorSmoothing) -> Self {
        self.smoothing = smoothing;
        self
    }
}

/// One curvature value at one vertex. `None` where it is undefined.
///
/// Tensor kinds use the unsmoothed fit; smoothing needs the whole mesh and is
/// only applied by [`vertex_curvatures`].
pub fn try_vertex_curvature(mesh: &Mesh, kind: CurvatureKind, v: VertexId) -> Option<f64> {
    match kind {
        CurvatureKind::Horizon => distortion::horizon(mesh, v),
        CurvatureKind::TriangleHorizon => {
            let vertex = mesh.vertex(v);
            (vertex.valence > 0).then(|| {
                let sum: f64 = vertex
                    .triangles
                    .iter()
                    .map(|&t| distortion::triangle_horizon_measure(mesh, t))
                    .sum();
                sum / vertex.valence as f64
            })
        }
        CurvatureKind::Mean => curvature::mean(mesh, v),
        CurvatureKind::MeanSigned => curvature::mean_signed(mesh, v),
        CurvatureKind::Gaussian => curvature::gaussian(mesh, v),
        CurvatureKind::AngleDefect => curvature::angle_defect(mesh, v),
        CurvatureKind::Cone => distortion::cone(mesh, v),
        CurvatureKind::PrincipalMax => principal_curvature(mesh, v).map(|p| p.k1),
        CurvatureKind::PrincipalMin => principal_curvature(mesh, v).map(|p| p.k2),
        CurvatureKind::Distortion
        | CurvatureKind::DistortionSigned
        | CurvatureKind::MaxPrincipalDistortion
        | CurvatureKind::MinPrincipalDistortion
        | CurvatureKind::FalseGaussian
        | CurvatureKind::FalseMean
        | CurvatureKind::PrincipalDeviation => {
            distortion::ring_curvature(mesh, v, kind.ring_reduction()?)
        }
    }
}

/// One curvature value at one vertex, 0 where undefined.
pub fn vertex_curvature(mesh: &Mesh, kind: CurvatureKind, v: VertexId) -> f64 {
    try_vertex_curvature(mesh, kind, v).unwrap_or(0.0)
}

/// Evaluate `kind` at every vertex.
///
/// The result has one entry per vertex in vertex order. Undefined and
/// non-finite values are reported as 0.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`](crate::error::MeshError::InvalidParameter)
/// if the tensor smoothing options are invalid.
pub fn vertex_curvatures(mesh: &Mesh, kind: CurvatureKind, options: &AnalysisOptions) -> Result<Vec<f64>> {
    let start = Instant::now();

    let mut values = match kind {
        CurvatureKind::TriangleHorizon => distortion::vertex_triangle_horizon(mesh),
        CurvatureKind::PrincipalMax => {
            CurvatureTensorField::compute(mesh, &options.smoothing, options.parallel)?.k1_values()
        }
        CurvatureKind::PrincipalMin => {
            CurvatureTensorField::compute(mesh, &options.smoothing, options.parallel)?.k2_values()
        }
        _ if options.parallel => (0..mesh.num_vertices())
            .into_par_iter()
            .map(|i| vertex_curvature(mesh, kind, VertexId::new(i)))
            .collect(),
        _ => memoized_over_corners(mesh, kind),
    };

    let non_finite = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        log::warn!("{}: {} non-finite values replaced with 0", kind, non_finite);
        for value in values.iter_mut().filter(|v| !v.is_finite()) {
            *value = 0.0;
        }
    }

    log::debug!(
        "{} over {} vertices in {:.2?}",
        kind,
        values.len(),
        start.elapsed()
    );
    Ok(values)
}

/// Walk the corner array and evaluate each vertex the first time one of its
/// corners comes up.
fn memoized_over_corners(mesh: &Mesh, kind: CurvatureKind) -> Vec<f64> {
    let mut values: Vec<Option<f64>> = vec![None; mesh.num_vertices()];
    for (_, corner) in mesh.corners().iter() {
        let slot = &mut values[corner.vertex.index()];
        if slot.is_none() {
            *slot = Some(vertex_curvature(mesh, kind, corner.vertex));
        }
    }
    values.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

/// Summary statistics of a per-vertex field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl FieldStats {
    /// Statistics over the finite entries of `values`. `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let n = finite.len() as f64;
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Largest distance of `min` or `max` from the mean.
    pub fn max_deviation(&self) -> f64 {
        (self.max - self.mean).max(self.mean - self.min)
    }
}

/// Position of `value` in `[min, max]`, clamped to `[0, 1]`.
///
/// An empty range maps everything to 0.5.
pub fn inverse_lerp(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Display range from the 5th to the 95th percentile of the finite values.
///
/// Collapsed ranges are widened by one unit each way; an empty field gives
/// `(0, 1)`.
pub fn robust_range(values: &[f64]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 1.0);
    }
    sorted.sort_by(f64::total_cmp);

    let low = (sorted.len() as f64 * 0.05) as usize;
    let high = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
    let (min, max) = (sorted[low], sorted[high]);

    if (max - min).abs() < 1e-10 {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

/// Sum of the angle defects `2π - Σθ` over all vertices with triangles.
///
/// On a closed surface this equals `2πχ`.
pub fn total_angle_deficit(mesh: &Mesh) -> f64 {
    let angles = mesh.angles();
    mesh.vertices()
        .filter(|(_, vertex)| vertex.corner.is_some())
        .map(|(v, _)| TAU - angles.total(v))
        .sum()
}

/// Sum of `6 - valence` over all vertices with triangles.
///
/// On a closed surface this equals `6χ`.
pub fn valence_deficit(mesh: &Mesh) -> i64 {
    mesh.vertices()
        .filter(|(_, vertex)| vertex.corner.is_some())
        .map(|(_, vertex)| 6 - vertex.valence as i64)
        .sum()
}

/// Global counts and deficits of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologySummary {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of edges.
    pub edges: usize,
    /// Number of triangles.
    pub triangles: usize,
    /// Vertices with an open star.
    pub boundary_vertices: usize,
    /// `V - E + F`.
    pub euler_characteristic: i64,
    /// See [`total_angle_deficit`].
    pub angle_deficit: f64,
    /// See [`valence_deficit`].
    pub valence_deficit: i64,
}

impl TopologySummary {
    /// Summarize `mesh`.
    pub fn of(mesh: &Mesh) -> Self {
        Self {
            vertices: mesh.num_vertices(),
            edges: mesh.num_edges(),
            triangles: mesh.num_triangles(),
            boundary_vertices: mesh.vertex_ids().filter(|&v| mesh.is_boundary_vertex(v)).count(),
            euler_characteristic: mesh.euler_characteristic(),
            angle_deficit: total_angle_deficit(mesh),
            valence_deficit: valence_deficit(mesh),
        }
    }
}
