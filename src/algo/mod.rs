//! Curvature operators and the passes built on them.
//!
//! - **Angles**: corner angles, angle defects, mixed Voronoi areas and perimeters
//! - **Curvature**: cotangent-Laplacian mean curvature, angle-defect Gaussian curvature
//! - **Tensor**: least-squares curvature tensors, smoothing, principal directions
//! - **Distortion**: normal-ring estimators, horizon and cone curvature
//! - **Spherical**: polar duals and Gauss-map polylines
//! - **Analysis**: per-kind dispatch over a whole mesh, field statistics
//! - **Subdivision**: Loop subdivision into a fresh mesh

pub mod analysis;
pub mod angles;
pub mod curvature;
pub mod distortion;
pub mod progress;
pub mod spherical;
pub mod subdivide;
pub mod tensor;

pub use progress::Progress;
