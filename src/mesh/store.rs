//! Mesh topology store.
//!
//! [`Mesh::build`] turns a triangle soup (positions plus per-triangle index
//! triples) into deduplicated edges, per-triangle normals and areas, vertex
//! normals, and the [`CornerTable`]. Everything is computed once; the mesh is
//! immutable afterwards. Refinement produces a new mesh instead of editing
//! this one, so derived state can never go stale.

use std::collections::HashMap;
use std::sync::OnceLock;

use nalgebra::{Point3, Vector3};

use super::corner::{CornerTable, VertexStar};
use super::index::{CornerId, EdgeId, TriangleId, VertexId};
use crate::algo::angles::AngleTable;
use crate::error::{MeshError, Result, TopologyError};

/// Triangles with less area than this are reported as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// A vertex of the mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
    /// Area-weighted unit normal. Zero for isolated vertices.
    pub normal: Vector3<f64>,
    /// Number of incident edges.
    pub valence: usize,
    /// One corner at this vertex, used as the seed for star traversal.
    /// `None` for isolated vertices.
    pub corner: Option<CornerId>,
    /// Incident triangles, in input order.
    pub triangles: Vec<TriangleId>,
}

/// An undirected edge of the mesh.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Endpoints, smaller index first.
    pub vertices: [VertexId; 2],
    /// The first triangle that referenced this edge.
    pub triangle: TriangleId,
    /// The second incident triangle; `None` on the boundary.
    pub twin_triangle: Option<TriangleId>,
    /// Euclidean length.
    pub length: f64,
}

impl Edge {
    /// Return true if only one triangle is attached to this edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.twin_triangle.is_none()
    }

    /// The triangle across this edge from `t`, if any.
    pub fn other_triangle(&self, t: TriangleId) -> Option<TriangleId> {
        if self.triangle == t {
            self.twin_triangle
        } else if self.twin_triangle == Some(t) {
            Some(self.triangle)
        } else {
            None
        }
    }

    /// The endpoint other than `v`, if `v` is on this edge.
    pub fn other_vertex(&self, v: VertexId) -> Option<VertexId> {
        match self.vertices {
            [a, b] if a == v => Some(b),
            [a, b] if b == v => Some(a),
            _ => None,
        }
    }

    /// Check whether `v` is an endpoint.
    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }
}

/// A triangle of the mesh.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices in input order.
    pub vertices: [VertexId; 3],
    /// `edges[s]` is the edge opposite `vertices[s]`.
    pub edges: [EdgeId; 3],
    /// Unit normal, following the vertex order. Unreliable when `area` is ~0.
    pub normal: Vector3<f64>,
    /// Area, `0.5 * |(p1 - p0) x (p2 - p0)|`.
    pub area: f64,
}

impl Triangle {
    /// Local slot of `v` in this triangle.
    pub fn slot_of(&self, v: VertexId) -> Option<usize> {
        self.vertices.iter().position(|&w| w == v)
    }

    /// Whether the triangle is too small to carry a meaningful normal.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.area < DEGENERATE_AREA
    }
}

/// An indexed, manifold, consistently oriented triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,
    corners: CornerTable,
    angles: OnceLock<AngleTable>,
}

impl Mesh {
    /// Build a mesh from positions and triangle index triples.
    ///
    /// # Errors
    ///
    /// - [`MeshError::EmptyMesh`] if `triangles` is empty.
    /// - [`MeshError::InvalidTopology`] for out-of-range or repeated indices,
    ///   edges shared by more than two triangles, and edges traversed in the
    ///   same direction by two triangles.
    ///
    /// Triangles must be consistently oriented: a manifold soup with a
    /// flipped triangle is rejected rather than repaired, so loaders are
    /// expected to orient their output before calling this. Corner rotation
    /// around a vertex relies on every shared edge being traversed once in
    /// each direction.
    ///
    /// # Example
    ///
    /// ```
    /// use curvmap::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let positions = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    ///     Point3::new(0.5, 0.5, 1.0),
    /// ];
    /// let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    ///
    /// let mesh = Mesh::build(&positions, &triangles).unwrap();
    /// assert_eq!(mesh.num_edges(), 6);
    /// assert_eq!(mesh.euler_characteristic(), 2);
    /// ```
    pub fn build(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        for (ti, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi >= positions.len() {
                    return Err(TopologyError::VertexOutOfRange {
                        triangle: ti,
                        vertex: vi,
                        vertex_count: positions.len(),
                    }
                    .into());
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(TopologyError::RepeatedVertex { triangle: ti }.into());
            }
        }

        let (edges, tri_edges) = build_edges(positions, triangles)?;

        let mut faces = Vec::with_capacity(triangles.len());
        let mut degenerate = 0usize;
        for (tri, edges) in triangles.iter().zip(tri_edges) {
            let [p0, p1, p2] = tri.map(|i| positions[i]);
            let cross = (p1 - p0).cross(&(p2 - p0));
            let area = 0.5 * cross.norm();
            if area < DEGENERATE_AREA {
                degenerate += 1;
            }
            faces.push(Triangle {
                vertices: tri.map(VertexId::new),
                edges,
                // Keep the raw cross product direction even when it is tiny.
                normal: cross.try_normalize(0.0).unwrap_or(cross),
                area,
            });
        }
        if degenerate > 0 {
            log::warn!("{} of {} triangles are degenerate", degenerate, faces.len());
        }

        let corners = CornerTable::build(&faces, &edges);

        let mut vertices: Vec<Vertex> = positions
            .iter()
            .map(|&position| Vertex {
                position,
                normal: Vector3::zeros(),
                valence: 0,
                corner: None,
                triangles: Vec::new(),
            })
            .collect();

        let mut weighted_normals = vec![Vector3::zeros(); positions.len()];
        for (ti, tri) in faces.iter().enumerate() {
            for (slot, &v) in tri.vertices.iter().enumerate() {
                let vertex = &mut vertices[v.index()];
                vertex.triangles.push(TriangleId::new(ti));
                vertex
                    .corner
                    .get_or_insert(CornerId::from_slot(TriangleId::new(ti), slot));
                weighted_normals[v.index()] += tri.normal * tri.area;
            }
        }

        let mut partial_stars = 0usize;
        for (vertex, n) in vertices.iter_mut().zip(weighted_normals) {
            vertex.normal = n.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            if let Some(seed) = vertex.corner {
                let star = corners.star(seed);
                if star.len() != vertex.triangles.len() {
                    partial_stars += 1;
                }
                vertex.valence = star.len() + usize::from(star.boundary);
            }
        }
        if partial_stars > 0 {
            log::warn!(
                "{} vertices have stars that do not reach every incident triangle",
                partial_stars
            );
        }

        log::debug!(
            "built mesh: {} vertices, {} edges, {} triangles, {} corners",
            vertices.len(),
            edges.len(),
            faces.len(),
            corners.len()
        );

        Ok(Self {
            vertices,
            edges,
            triangles: faces,
            corners,
            angles: OnceLock::new(),
        })
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a triangle by ID.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }

    /// The corner table.
    #[inline]
    pub fn corners(&self) -> &CornerTable {
        &self.corners
    }

    /// Corner angles and per-vertex angle totals, computed on first use.
    pub fn angles(&self) -> &AngleTable {
        self.angles.get_or_init(|| AngleTable::compute(self))
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Get the position of the vertex at a corner.
    #[inline]
    pub fn corner_position(&self, c: CornerId) -> &Point3<f64> {
        self.position(self.corners.vertex(c))
    }

    /// Get the unit normal of a vertex.
    #[inline]
    pub fn vertex_normal(&self, v: VertexId) -> &Vector3<f64> {
        &self.vertex(v).normal
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i), e))
    }

    /// Iterate over all triangle IDs.
    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        (0..self.triangles.len()).map(TriangleId::new)
    }

    /// Iterate over all triangles with their IDs.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .map(|(i, t)| (TriangleId::new(i), t))
    }

    // ==================== Topology Queries ====================

    /// The star of a vertex. Empty for isolated vertices.
    pub fn star(&self, v: VertexId) -> VertexStar {
        match self.vertex(v).corner {
            Some(seed) => self.corners.star(seed),
            None => VertexStar {
                corners: Vec::new(),
                boundary: true,
            },
        }
    }

    /// Vertices adjacent to `v`, in star order.
    ///
    /// For boundary vertices the list starts and ends with the two boundary
    /// neighbours.
    pub fn neighbors(&self, v: VertexId) -> Vec<VertexId> {
        let star = self.star(v);
        let mut out: Vec<VertexId> = star
            .corners
            .iter()
            .map(|&c| self.corners.vertex(self.corners.next(c)))
            .collect();
        if star.boundary {
            if let Some(&last) = star.corners.last() {
                out.push(self.corners.vertex(self.corners.previous(last)));
            }
        }
        out
    }

    /// Check if a vertex touches the boundary (or is isolated).
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.star(v).boundary
    }

    /// True if no edge of the mesh is a boundary edge.
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(|e| !e.is_boundary())
    }

    // ==================== Geometry ====================

    /// Euler characteristic `V - E + F`.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices.len() as i64 - self.edges.len() as i64 + self.triangles.len() as i64
    }

    /// Total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.triangles.iter().map(|t| t.area).sum()
    }

    /// Perimeter of a triangle.
    pub fn triangle_perimeter(&self, t: TriangleId) -> f64 {
        self.triangle(t)
            .edges
            .iter()
            .map(|&e| self.edge(e).length)
            .sum()
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(&v.position), max.sup(&v.position))
        }))
    }

    /// Mean edge length.
    pub fn average_edge_length(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }
        self.edges.iter().map(|e| e.length).sum::<f64>() / self.edges.len() as f64
    }

    /// Convert back to a triangle soup.
    pub fn to_triangle_soup(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let positions = self.vertices.iter().map(|v| v.position).collect();
        let triangles = self
            .triangles
            .iter()
            .map(|t| t.vertices.map(VertexId::index))
            .collect();
        (positions, triangles)
    }
}

/// Deduplicate edges and return, per triangle, the edge opposite each slot.
fn build_edges(
    positions: &[Point3<f64>],
    triangles: &[[usize; 3]],
) -> Result<(Vec<Edge>, Vec<[EdgeId; 3]>)> {
    let mut edges: Vec<Edge> = Vec::with_capacity(triangles.len() * 3 / 2 + 1);
    let mut lookup: HashMap<(usize, usize), EdgeId> = HashMap::with_capacity(edges.capacity());
    let mut directed: HashMap<(usize, usize), TriangleId> = HashMap::with_capacity(triangles.len() * 3);
    let mut tri_edges = Vec::with_capacity(triangles.len());

    for (ti, tri) in triangles.iter().enumerate() {
        let t = TriangleId::new(ti);
        let mut ids = [EdgeId::new(0); 3];

        for slot in 0..3 {
            let a = tri[(slot + 1) % 3];
            let b = tri[(slot + 2) % 3];
            let key = (a.min(b), a.max(b));

            let id = match lookup.get(&key) {
                Some(&id) => {
                    let edge = &mut edges[id.index()];
                    if edge.twin_triangle.is_some() {
                        return Err(TopologyError::NonManifoldEdge { v0: key.0, v1: key.1 }.into());
                    }
                    edge.twin_triangle = Some(t);
                    id
                }
                None => {
                    let id = EdgeId::new(edges.len());
                    edges.push(Edge {
                        vertices: [VertexId::new(key.0), VertexId::new(key.1)],
                        triangle: t,
                        twin_triangle: None,
                        length: (positions[key.1] - positions[key.0]).norm(),
                    });
                    lookup.insert(key, id);
                    id
                }
            };

            if directed.insert((a, b), t).is_some() {
                return Err(TopologyError::InconsistentOrientation { v0: a, v1: b }.into());
            }
            ids[slot] = id;
        }

        tri_edges.push(ids);
    }

    Ok((edges, tri_edges))
}
