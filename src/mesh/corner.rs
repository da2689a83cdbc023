//! Corner table.
//!
//! A corner is one (vertex, triangle) incidence. Every triangle contributes
//! three corners, stored at `3 * triangle + slot`, so `next` and `previous`
//! are index arithmetic and `opposite` is a single stored link.
//!
//! # Traversal
//!
//! For a corner `c` at vertex `v`, `rotate(c) = previous(opposite(previous(c)))`
//! is the corner at `v` in the neighbouring triangle across the edge from `v`
//! to `next(c).vertex`. On a consistently oriented mesh, repeatedly rotating
//! walks the star of `v` clockwise (seen from the normal side) and returns to
//! `c` for interior vertices. At a boundary edge `opposite` is `None` and the
//! walk stops; [`CornerTable::star`] then walks the other way with
//! `rotate_back(c) = next(opposite(next(c)))` so boundary stars are gathered in
//! one consistent order.

use super::index::{CornerId, EdgeId, TriangleId, VertexId};
use super::store::{Edge, Triangle};

/// A (vertex, triangle) incidence with its adjacency links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    /// The vertex at this corner.
    pub vertex: VertexId,
    /// The triangle containing this corner.
    pub triangle: TriangleId,
    /// The edge of the triangle opposite this corner.
    pub edge: EdgeId,
    /// The next corner in the triangle, following its orientation.
    pub next: CornerId,
    /// The previous corner in the triangle.
    pub previous: CornerId,
    /// The corner across `edge` in the other triangle sharing it.
    /// `None` when `edge` is a boundary edge.
    pub opposite: Option<CornerId>,
}

/// The ordered fan of corners around one vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexStar {
    /// Corners at the vertex in rotation order. For boundary vertices the
    /// first corner sits against one boundary edge and the last against the other.
    pub corners: Vec<CornerId>,
    /// Whether the walk hit a boundary edge.
    pub boundary: bool,
}

impl VertexStar {
    /// Number of triangles in the star.
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// True for isolated vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// True if the star closes up around the vertex.
    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.boundary && !self.corners.is_empty()
    }
}

/// The corner table of a mesh. Built once, immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct CornerTable {
    corners: Vec<Corner>,
}

impl CornerTable {
    /// Build the corner table over finalized triangles and edges.
    ///
    /// Triangle `t` must store in `edges[s]` the edge opposite `vertices[s]`,
    /// and every edge must list its incident triangles.
    pub(crate) fn build(triangles: &[Triangle], edges: &[Edge]) -> Self {
        let mut corners = Vec::with_capacity(3 * triangles.len());

        for (ti, tri) in triangles.iter().enumerate() {
            let t = TriangleId::new(ti);
            for slot in 0..3 {
                let id = CornerId::from_slot(t, slot);
                let edge = tri.edges[slot];

                // The corner across `edge` is the one in the other triangle
                // whose own opposite edge is `edge`; its index follows from the slot.
                let opposite = edges[edge.index()].other_triangle(t).and_then(|s| {
                    triangles[s.index()]
                        .edges
                        .iter()
                        .position(|&e| e == edge)
                        .map(|j| CornerId::from_slot(s, j))
                });

                corners.push(Corner {
                    vertex: tri.vertices[slot],
                    triangle: t,
                    edge,
                    next: id.next(),
                    previous: id.previous(),
                    opposite,
                });
            }
        }

        Self { corners }
    }

    /// Number of corners (three per triangle).
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// True if the table has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Get a corner by ID.
    #[inline]
    pub fn get(&self, c: CornerId) -> &Corner {
        &self.corners[c.index()]
    }

    /// Iterate over all corners with their IDs, in triangle order.
    pub fn iter(&self) -> impl Iterator<Item = (CornerId, &Corner)> + '_ {
        self.corners
            .iter()
            .enumerate()
            .map(|(i, c)| (CornerId::new(i), c))
    }

    /// The vertex at a corner.
    #[inline]
    pub fn vertex(&self, c: CornerId) -> VertexId {
        self.get(c).vertex
    }

    /// The next corner in the same triangle.
    #[inline]
    pub fn next(&self, c: CornerId) -> CornerId {
        self.get(c).next
    }

    /// The previous corner in the same triangle.
    #[inline]
    pub fn previous(&self, c: CornerId) -> CornerId {
        self.get(c).previous
    }

    /// The opposite corner, or `None` across a boundary edge.
    #[inline]
    pub fn opposite(&self, c: CornerId) -> Option<CornerId> {
        self.get(c).opposite
    }

    /// The corner at the same vertex in the next triangle of the star.
    #[inline]
    pub fn rotate(&self, c: CornerId) -> Option<CornerId> {
        self.opposite(self.previous(c)).map(|o| self.previous(o))
    }

    /// The corner at the same vertex in the previous triangle of the star.
    #[inline]
    pub fn rotate_back(&self, c: CornerId) -> Option<CornerId> {
        self.opposite(self.next(c)).map(|o| self.next(o))
    }

    /// Gather the star around the vertex of `seed`.
    ///
    /// Interior vertices are walked forward until the walk returns to `seed`.
    /// If a boundary edge is hit, the walk restarts from the backward boundary
    /// so the result is one contiguous fan.
    pub fn star(&self, seed: CornerId) -> VertexStar {
        let limit = self.corners.len();
        let mut corners = vec![seed];
        let mut current = seed;

        for _ in 0..limit {
            match self.rotate(current) {
                Some(c) if c == seed => {
                    return VertexStar {
                        corners,
                        boundary: false,
                    };
                }
                Some(c) => {
                    corners.push(c);
                    current = c;
                }
                None => break,
            }
        }

        // Open fan: rewind to the first corner after the backward boundary.
        let mut first = seed;
        for _ in 0..limit {
            match self.rotate_back(first) {
                Some(c) if c != seed => first = c,
                _ => break,
            }
        }

        let mut corners = vec![first];
        let mut current = first;
        for _ in 0..limit {
            match self.rotate(current) {
                Some(c) if c != first => {
                    corners.push(c);
                    current = c;
                }
                _ => break,
            }
        }

        VertexStar {
            corners,
            boundary: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::mesh::{primitives, Mesh};

    use super::*;

    fn fan_with_hole() -> Mesh {
        // Hexagonal fan around vertex 0 with one wedge removed.
        let mut positions = vec![Point3::origin()];
        for k in 0..6 {
            let a = k as f64 * std::f64::consts::PI / 3.0;
            positions.push(Point3::new(a.cos(), a.sin(), 0.0));
        }
        let triangles = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5], [0, 5, 6]];
        Mesh::build(&positions, &triangles).unwrap()
    }

    #[test]
    fn test_next_previous_cycle() {
        let mesh = primitives::icosphere(1).unwrap();
        let corners = mesh.corners();
        for (c, _) in corners.iter() {
            assert_eq!(corners.next(corners.next(corners.next(c))), c);
            assert_eq!(corners.next(corners.previous(c)), c);
            assert_eq!(corners.previous(corners.next(c)), c);
        }
    }

    #[test]
    fn test_opposite_is_involution() {
        let mesh = fan_with_hole();
        let corners = mesh.corners();
        let mut defined = 0;
        for (c, corner) in corners.iter() {
            if let Some(o) = corner.opposite {
                defined += 1;
                assert_eq!(corners.opposite(o), Some(c));
                // Opposite corners face the same edge.
                assert_eq!(corners.get(o).edge, corner.edge);
            } else {
                assert!(mesh.edge(corner.edge).is_boundary());
            }
        }
        // 4 interior spokes, each seen from both sides.
        assert_eq!(defined, 8);
    }

    #[test]
    fn test_closed_star_returns_to_seed() {
        let mesh = primitives::octahedron().unwrap();
        let corners = mesh.corners();
        for (c, corner) in corners.iter() {
            let star = corners.star(c);
            assert!(star.is_closed());
            assert_eq!(star.len(), 4);
            assert_eq!(star.corners[0], c);
            for &s in &star.corners {
                assert_eq!(corners.vertex(s), corner.vertex);
            }
            let last = *star.corners.last().unwrap();
            assert_eq!(corners.rotate(last), Some(c));
        }
    }

    #[test]
    fn test_rotation_is_inverse_of_rotate_back() {
        let mesh = primitives::icosphere(1).unwrap();
        let corners = mesh.corners();
        for (c, _) in corners.iter() {
            let r = corners.rotate(c).unwrap();
            assert_eq!(corners.rotate_back(r), Some(c));
        }
    }

    #[test]
    fn test_boundary_star_is_contiguous_from_any_seed() {
        let mesh = fan_with_hole();
        let corners = mesh.corners();
        let center = VertexId::new(0);

        let seeds: Vec<CornerId> = corners
            .iter()
            .filter(|(_, corner)| corner.vertex == center)
            .map(|(c, _)| c)
            .collect();
        assert_eq!(seeds.len(), 5);

        let reference = corners.star(seeds[0]);
        assert!(reference.boundary);
        assert_eq!(reference.len(), 5);
        assert_eq!(corners.rotate_back(reference.corners[0]), None);
        assert_eq!(corners.rotate(*reference.corners.last().unwrap()), None);

        for &seed in &seeds {
            assert_eq!(corners.star(seed), reference);
        }
    }
}
