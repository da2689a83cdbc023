//! # curvmap
//!
//! Discrete differential geometry on triangle meshes.
//!
//! curvmap builds an indexed triangle mesh with a corner table and evaluates
//! a family of per-vertex curvature estimators on it, from the classic
//! cotangent-Laplacian mean curvature and angle-defect Gaussian curvature to
//! Gauss-map based measures that look at how triangle normals turn around a
//! vertex.
//!
//! ## Features
//!
//! - **Corner table**: `next`/`previous`/`opposite` as index lookups, vertex
//!   stars with explicit boundary detection
//! - **Mixed Voronoi weights**: per-vertex areas and perimeters that stay
//!   positive on obtuse triangles
//! - **Curvature**: mean, Gaussian, principal (tensor fit), distortion, horizon
//!   and cone curvature through one dispatch enum
//! - **Gauss map**: polar duals and great-circle polylines of normal rings
//! - **Loop subdivision**: refine a mesh before analysis
//!
//! ## Quick Start
//!
//! ```
//! use curvmap::prelude::*;
//!
//! let mesh = primitives::icosphere(2).unwrap();
//!
//! let options = AnalysisOptions::default();
//! let gaussian = vertex_curvatures(&mesh, CurvatureKind::Gaussian, &options).unwrap();
//! let mean = vertex_curvatures(&mesh, CurvatureKind::Mean, &options).unwrap();
//!
//! // A unit sphere has K = H = 1 everywhere.
//! assert!(gaussian.iter().all(|k| (k - 1.0).abs() < 0.05));
//! assert!(mean.iter().all(|h| (h - 1.0).abs() < 0.05));
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use curvmap::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh = Mesh::build(&vertices, &triangles).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_triangles(), 4);
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use curvmap::prelude::*;
//!
//! let mesh = primitives::octahedron().unwrap();
//! let corners = mesh.corners();
//!
//! // Walk the triangles around a vertex.
//! let star = mesh.star(VertexId::new(0));
//! assert!(star.is_closed());
//! for &c in &star.corners {
//!     let t = c.triangle();
//!     let next = corners.vertex(corners.next(c));
//!     println!("triangle {:?}, outgoing edge to {:?}", t, next);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use curvmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::analysis::{
        vertex_curvature, vertex_curvatures, AnalysisOptions, CurvatureKind, FieldStats,
    };
    pub use crate::error::{MeshError, Result, TopologyError};
    pub use crate::mesh::{
        primitives, Corner, CornerId, CornerTable, Edge, EdgeId, Mesh, Triangle, TriangleId,
        Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;
    use std::f64::consts::PI;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh = Mesh::build(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.corners().len(), 12);
        assert!(mesh.is_closed());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "vertex {:?} should not be on boundary", v);
            assert_eq!(mesh.vertex(v).valence, 3);
        }
    }

    #[test]
    fn test_octahedron_end_to_end() {
        let mesh = primitives::octahedron().unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_triangles(), 8);

        let options = AnalysisOptions::default();
        let defects = vertex_curvatures(&mesh, CurvatureKind::AngleDefect, &options).unwrap();
        for d in &defects {
            assert!((d - 2.0 * PI / 3.0).abs() < 1e-12);
        }

        let total: f64 = defects.iter().sum();
        let chi = mesh.euler_characteristic() as f64;
        assert!((total - 2.0 * PI * chi).abs() < 1e-12);
    }
}
