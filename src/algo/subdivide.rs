//! Loop subdivision.
//!
//! Loop subdivision (Loop, 1987) is an approximating scheme for triangle
//! meshes. Each iteration:
//!
//! 1. Inserts a new vertex on every edge (weighted positions)
//! 2. Updates original vertex positions based on their neighbours
//! 3. Splits each triangle into 4 smaller triangles
//!
//! The input mesh is never modified. Every iteration builds a fresh [`Mesh`],
//! so its corner table and angle cache are rebuilt from scratch.
//!
//! # Example
//!
//! ```
//! use curvmap::algo::subdivide::{loop_subdivide, SubdivideOptions};
//! use curvmap::mesh::primitives;
//!
//! let coarse = primitives::octahedron().unwrap();
//! let fine = loop_subdivide(&coarse, &SubdivideOptions::new(2)).unwrap();
//! assert_eq!(fine.num_triangles(), 8 * 16);
//! assert_eq!(fine.euler_characteristic(), 2);
//! ```
//!
//! # References
//!
//! - Loop, C. (1987). "Smooth Subdivision Surfaces Based on Triangles."
//!   Master's thesis, University of Utah.

use std::f64::consts::TAU;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::Progress;
use crate::error::Result;
use crate::mesh::{Mesh, VertexId};

/// Options for Loop subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            parallel: true,
        }
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
}

/// Subdivide `mesh` and return the refined mesh.
///
/// Each iteration quadruples the number of triangles.
///
/// # Vertex Rules
///
/// - **Interior edge vertex**: `3/8 * (v0 + v1) + 1/8 * (v_left + v_right)`
/// - **Boundary edge vertex**: `1/2 * (v0 + v1)`
/// - **Interior vertex**: `(1 - n*β) * v + β * Σ(neighbors)`
/// - **Boundary vertex**: `1/8 * (left + right) + 3/4 * v`
///
/// # Errors
///
/// Propagates [`Mesh::build`] errors, which cannot occur for a mesh that was
/// itself built successfully.
pub fn loop_subdivide(mesh: &Mesh, options: &SubdivideOptions) -> Result<Mesh> {
    loop_subdivide_with_progress(mesh, options, &Progress::none())
}

/// Loop subdivision with progress reporting.
pub fn loop_subdivide_with_progress(
    mesh: &Mesh,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<Mesh> {
    let mut current = mesh.clone();
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Loop subdivision");
        current = loop_subdivide_once(&current, options.parallel)?;
        log::debug!(
            "subdivision {}: {} vertices, {} triangles",
            iter + 1,
            current.num_vertices(),
            current.num_triangles()
        );
    }
    if options.iterations > 0 {
        progress.report(options.iterations, options.iterations, "Loop subdivision");
    }
    Ok(current)
}

fn loop_subdivide_once(mesh: &Mesh, parallel: bool) -> Result<Mesh> {
    let edge_points = edge_points(mesh);

    let updated: Vec<Point3<f64>> = if parallel {
        (0..mesh.num_vertices())
            .into_par_iter()
            .map(|i| vertex_point(mesh, VertexId::new(i)))
            .collect()
    } else {
        mesh.vertex_ids().map(|v| vertex_point(mesh, v)).collect()
    };

    let offset = updated.len();
    let mut positions = updated;
    positions.extend(edge_points);

    let mut triangles = Vec::with_capacity(mesh.num_triangles() * 4);
    for (_, tri) in mesh.triangles() {
        let [v0, v1, v2] = tri.vertices.map(VertexId::index);
        // edges[s] is opposite vertices[s].
        let e12 = offset + tri.edges[0].index();
        let e20 = offset + tri.edges[1].index();
        let e01 = offset + tri.edges[2].index();

        triangles.push([v0, e01, e20]);
        triangles.push([v1, e12, e01]);
        triangles.push([v2, e20, e12]);
        triangles.push([e01, e12, e20]);
    }

    Mesh::build(&positions, &triangles)
}

/// New vertex positions on every edge, indexed by edge.
fn edge_points(mesh: &Mesh) -> Vec<Point3<f64>> {
    let mut opposite_sums = vec![Vector3::zeros(); mesh.num_edges()];
    for (_, tri) in mesh.triangles() {
        for (&e, &v) in tri.edges.iter().zip(&tri.vertices) {
            opposite_sums[e.index()] += mesh.position(v).coords;
        }
    }

    mesh.edges()
        .map(|(e, edge)| {
            let ends = mesh.position(edge.vertices[0]).coords + mesh.position(edge.vertices[1]).coords;
            if edge.is_boundary() {
                Point3::from(ends * 0.5)
            } else {
                Point3::from(ends * (3.0 / 8.0) + opposite_sums[e.index()] * (1.0 / 8.0))
            }
        })
        .collect()
}

/// Updated position of an original vertex.
fn vertex_point(mesh: &Mesh, v: VertexId) -> Point3<f64> {
    let pos = *mesh.position(v);
    let vertex = mesh.vertex(v);

    let boundary_neighbors: Vec<VertexId> = vertex
        .triangles
        .iter()
        .flat_map(|&t| mesh.triangle(t).edges)
        .filter_map(|e| {
            let edge = mesh.edge(e);
            (edge.is_boundary() && edge.contains(v))
                .then(|| edge.other_vertex(v))
                .flatten()
        })
        .collect();

    if !boundary_neighbors.is_empty() {
        return match boundary_neighbors.as_slice() {
            [left, right] => Point3::from(
                (mesh.position(*left).coords + mesh.position(*right).coords) * (1.0 / 8.0)
                    + pos.coords * (3.0 / 4.0),
            ),
            // Corner or irregular boundary: keep position.
            _ => pos,
        };
    }

    let neighbors = mesh.neighbors(v);
    if neighbors.is_empty() {
        return pos;
    }
    let n = neighbors.len();
    let beta = loop_beta(n);
    let sum: Vector3<f64> = neighbors.iter().map(|&u| mesh.position(u).coords).sum();
    Point3::from(pos.coords * (1.0 - n as f64 * beta) + sum * beta)
}

/// The Loop weight `β` for a vertex with `n` neighbours.
fn loop_beta(n: usize) -> f64 {
    if n == 3 {
        3.0 / 16.0
    } else {
        // β = 1/n * (5/8 - (3/8 + 1/4 * cos(2π/n))²)
        let n_f = n as f64;
        let inner = 3.0 / 8.0 + 0.25 * (TAU / n_f).cos();
        (5.0 / 8.0 - inner * inner) / n_f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::curvature;
    use crate::mesh::primitives;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn create_two_triangles() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(1.0, -2.0, 0.0),
        ];
        Mesh::build(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap()
    }

    #[test]
    fn test_quadruples_triangles() {
        let mesh = primitives::tetrahedron().unwrap();
        let fine = loop_subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();
        assert_eq!(fine.num_triangles(), mesh.num_triangles() * 4);
        assert_eq!(fine.num_vertices(), mesh.num_vertices() + mesh.num_edges());

        let finer = loop_subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        assert_eq!(finer.num_triangles(), mesh.num_triangles() * 16);
    }

    #[test]
    fn test_preserves_euler() {
        let mesh = primitives::torus(2.0, 0.5, 8, 6).unwrap();
        let fine = loop_subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();
        assert_eq!(fine.euler_characteristic(), mesh.euler_characteristic());
        assert!(fine.is_closed());
    }

    #[test]
    fn test_zero_iterations() {
        let mesh = primitives::octahedron().unwrap();
        let same = loop_subdivide(&mesh, &SubdivideOptions::new(0)).unwrap();
        assert_eq!(same.num_triangles(), mesh.num_triangles());
        assert_eq!(same.num_vertices(), mesh.num_vertices());
    }

    #[test]
    fn test_two_triangles() {
        let mesh = create_two_triangles();
        let fine = loop_subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();
        // 4 original + 5 edge vertices
        assert_eq!(fine.num_vertices(), 9);
        assert_eq!(fine.num_triangles(), 8);
    }

    #[test]
    fn test_interior_edge_point() {
        let mesh = create_two_triangles();
        let points = edge_points(&mesh);
        let (e, _) = mesh
            .edges()
            .find(|(_, edge)| !edge.is_boundary())
            .unwrap();
        // 3/8 * ((0,0,0) + (2,0,0)) + 1/8 * ((1,2,0) + (1,-2,0)) = (1, 0, 0)
        assert!((points[e.index()] - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-10);
    }

    #[test]
    fn test_boundary_stays_flat() {
        let mesh = primitives::grid(2, 2.0).unwrap();
        let fine = loop_subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        assert!(fine.vertices().all(|(_, v)| v.position.z.abs() < 1e-12));

        // Corner (-1, -1) with boundary neighbours (0, -1) and (-1, 0).
        let once = loop_subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();
        assert!((once.position(VertexId::new(0)) - Point3::new(-0.875, -0.875, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_loop_beta() {
        assert!((loop_beta(3) - 3.0 / 16.0).abs() < 1e-10);
        // Regular vertex: β = 1/16
        assert!((loop_beta(6) - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = primitives::icosahedron().unwrap();
        let a = loop_subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();
        let b = loop_subdivide(&mesh, &SubdivideOptions::new(1).sequential()).unwrap();
        for v in a.vertex_ids() {
            assert_eq!(a.position(v), b.position(v));
        }
    }

    #[test]
    fn test_sphere_curvature_evens_out() {
        // Icosahedron vertices are sharp cones; after subdivision every
        // vertex carries a much smaller defect.
        let mesh = primitives::icosahedron().unwrap();
        let fine = loop_subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        let max_before = mesh
            .vertex_ids()
            .map(|v| curvature::angle_defect(&mesh, v).unwrap())
            .fold(0.0, f64::max);
        let max_after = fine
            .vertex_ids()
            .map(|v| curvature::angle_defect(&fine, v).unwrap())
            .fold(0.0, f64::max);
        assert!(max_after < 0.25 * max_before);
    }

    #[test]
    fn test_progress_reports() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress = Progress::new(move |_, total, _| {
            assert_eq!(total, 2);
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let mesh = primitives::tetrahedron().unwrap();
        loop_subdivide_with_progress(&mesh, &SubdivideOptions::new(2), &progress).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }
}
