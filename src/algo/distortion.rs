//! Gauss-map distortion estimators.
//!
//! Walking the closed star of a vertex visits its triangle normals in order.
//! The turn between consecutive normals, signed by which way the surface
//! bends across the shared edge, is a sample of normal curvature along that
//! edge. A family of estimators reduces the sequence of turns in different
//! ways; the horizon measure and the cone curvature reuse the same ring.

use std::f64::consts::{FRAC_PI_2, TAU};

use nalgebra::Vector3;

use super::angles::{corner_normal, mixed_perimeter};
use super::spherical::spherical_angle;
use crate::mesh::{Mesh, TriangleId, VertexId};

/// Turns smaller than this are treated as equal when picking the extremes.
const TURN_EPSILON: f64 = 1e-12;

/// One step of the normal ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingTurn {
    /// Signed angle between the normals on either side of `edge`; positive
    /// where the surface is convex across it.
    pub angle: f64,
    /// The shared edge, from the center vertex outward.
    pub edge: Vector3<f64>,
}

/// The ordered triangle normals around a closed vertex star and the turns
/// between them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalRing {
    /// Unit vertex normal of the center.
    pub normal: Vector3<f64>,
    /// Triangle normals in star order.
    pub normals: Vec<Vector3<f64>>,
    /// `turns[i]` goes from `normals[i]` to `normals[i + 1]`, wrapping.
    pub turns: Vec<RingTurn>,
}

impl NormalRing {
    /// Walk the star of `v`. `None` unless the star is closed.
    pub fn around(mesh: &Mesh, v: VertexId) -> Option<Self> {
        let star = mesh.star(v);
        if !star.is_closed() {
            return None;
        }
        let corners = mesh.corners();
        let here = mesh.position(v);
        let normals: Vec<Vector3<f64>> = star.corners.iter().map(|&c| corner_normal(mesh, c)).collect();

        let n = normals.len();
        let turns = star
            .corners
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let a = &normals[i];
                let b = &normals[(i + 1) % n];
                // Rotation crosses the edge from v to next(c).
                let edge = mesh.corner_position(corners.next(c)) - here;
                let magnitude = spherical_angle(a, b);
                let angle = if a.cross(b).dot(&edge) < 0.0 {
                    -magnitude
                } else {
                    magnitude
                };
                RingTurn { angle, edge }
            })
            .collect();

        Some(Self {
            normal: *mesh.vertex_normal(v),
            normals,
            turns,
        })
    }

    /// Sum of unsigned turns: the perimeter of the Gauss image.
    pub fn total_turn(&self) -> f64 {
        self.turns.iter().map(|t| t.angle.abs()).sum()
    }

    /// Sum of signed turns.
    pub fn signed_turn(&self) -> f64 {
        self.turns.iter().map(|t| t.angle).sum()
    }

    fn extreme(&self, pick: impl Fn(f64, f64) -> bool) -> Option<&RingTurn> {
        self.turns
            .iter()
            .reduce(|best, t| if pick(t.angle, best.angle) { t } else { best })
    }

    /// The largest signed turn.
    pub fn max_turn(&self) -> Option<&RingTurn> {
        self.extreme(|a, b| a > b)
    }

    /// The smallest signed turn.
    pub fn min_turn(&self) -> Option<&RingTurn> {
        self.extreme(|a, b| a < b)
    }

    /// Reduce the ring with `reduction`.
    pub fn reduce(&self, reduction: RingReduction) -> f64 {
        let (Some(max), Some(min)) = (self.max_turn(), self.min_turn()) else {
            return 0.0;
        };
        match reduction {
            RingReduction::Unsigned => self.total_turn(),
            RingReduction::Signed => self.signed_turn(),
            RingReduction::Max => max.angle,
            RingReduction::Min => min.angle,
            RingReduction::FalseGaussian => max.angle * min.angle,
            RingReduction::FalseMean => 0.5 * (max.angle + min.angle),
            RingReduction::PrincipalDeviation => {
                if max.angle - min.angle < TURN_EPSILON {
                    return 0.0;
                }
                match (self.tangent(&max.edge), self.tangent(&min.edge)) {
                    (Some(a), Some(b)) => FRAC_PI_2 - a.dot(&b).abs().min(1.0).acos(),
                    _ => 0.0,
                }
            }
        }
    }

    fn tangent(&self, edge: &Vector3<f64>) -> Option<Vector3<f64>> {
        (edge - edge.dot(&self.normal) * self.normal).try_normalize(TURN_EPSILON)
    }
}

/// How a [`NormalRing`] is collapsed to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingReduction {
    /// Sum of unsigned turns.
    Unsigned,
    /// Sum of signed turns.
    Signed,
    /// Largest signed turn.
    Max,
    /// Smallest signed turn.
    Min,
    /// Product of the largest and smallest turns.
    FalseGaussian,
    /// Mean of the largest and smallest turns.
    FalseMean,
    /// How far the edges carrying the largest and smallest turns are from
    /// perpendicular, `π/2 - angle`. Zero when all turns are equal.
    PrincipalDeviation,
}

/// Reduce the normal ring of `v`. `None` at boundary and isolated vertices.
pub fn ring_curvature(mesh: &Mesh, v: VertexId, reduction: RingReduction) -> Option<f64> {
    NormalRing::around(mesh, v).map(|ring| ring.reduce(reduction))
}

/// Horizon measure: twice the Gauss-image perimeter over the mixed perimeter.
pub fn horizon(mesh: &Mesh, v: VertexId) -> Option<f64> {
    let ring = NormalRing::around(mesh, v)?;
    let perimeter = mixed_perimeter(mesh, v)?;
    Some(2.0 * ring.total_turn() / perimeter)
}

/// Dual cone curvature: `2π` minus the unsigned turns of the normal ring,
/// closed from the last triangle back to the first.
///
/// A flat star gives `2π`. Unlike the angle defect this stays positive at
/// hyperbolic vertices.
pub fn cone(mesh: &Mesh, v: VertexId) -> Option<f64> {
    NormalRing::around(mesh, v).map(|ring| TAU - ring.total_turn())
}

/// Horizon area of a triangle: twice the sum of the acute angles between
/// each pair of its vertex normals.
pub fn triangle_horizon_area(mesh: &Mesh, t: TriangleId) -> f64 {
    let [n0, n1, n2] = mesh.triangle(t).vertices.map(|v| *mesh.vertex_normal(v));
    let acute = |a: &Vector3<f64>, b: &Vector3<f64>| {
        let angle = spherical_angle(a, b);
        angle.min((std::f64::consts::PI - angle).abs())
    };
    2.0 * (acute(&n0, &n1) + acute(&n1, &n2) + acute(&n2, &n0))
}

/// Horizon area of a triangle relative to its size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHorizon {
    /// See [`triangle_horizon_area`].
    pub area: f64,
    /// Horizon area over the triangle perimeter.
    pub per_perimeter: f64,
    /// Horizon area over the triangle area, 0 for degenerate triangles.
    pub per_area: f64,
}

/// Horizon area and its ratios for every triangle.
pub fn triangle_horizons(mesh: &Mesh) -> Vec<TriangleHorizon> {
    mesh.triangles()
        .map(|(t, tri)| {
            let area = triangle_horizon_area(mesh, t);
            let perimeter = mesh.triangle_perimeter(t);
            TriangleHorizon {
                area,
                per_perimeter: if perimeter > 0.0 { area / perimeter } else { 0.0 },
                per_area: if tri.is_degenerate() { 0.0 } else { area / tri.area },
            }
        })
        .collect()
}

/// Per-triangle horizon measure `Σ acos(nᵢ·nⱼ) / 2π` over the vertex-normal
/// pairs of a triangle.
pub fn triangle_horizon_measure(mesh: &Mesh, t: TriangleId) -> f64 {
    let [n0, n1, n2] = mesh.triangle(t).vertices.map(|v| *mesh.vertex_normal(v));
    let arc = |a: &Vector3<f64>, b: &Vector3<f64>| a.dot(b).clamp(-1.0, 1.0).acos();
    (arc(&n1, &n2) + arc(&n0, &n2) + arc(&n0, &n1)) / TAU
}

/// Triangle horizon measure summed onto each vertex and divided by its
/// valence. Isolated vertices get 0.
pub fn vertex_triangle_horizon(mesh: &Mesh) -> Vec<f64> {
    let mut values = vec![0.0; mesh.num_vertices()];
    for t in mesh.triangle_ids() {
        let measure = triangle_horizon_measure(mesh, t);
        for v in mesh.triangle(t).vertices {
            values[v.index()] += measure;
        }
    }
    for (v, value) in mesh.vertices().map(|(_, v)| v).zip(values.iter_mut()) {
        if v.valence > 0 {
            *value /= v.valence as f64;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_octahedron_ring() {
        let mesh = primitives::octahedron().unwrap();
        let turn = (1.0_f64 / 3.0).acos();

        for v in mesh.vertex_ids() {
            let ring = NormalRing::around(&mesh, v).unwrap();
            assert_eq!(ring.turns.len(), 4);
            for t in &ring.turns {
                assert!((t.angle - turn).abs() < 1e-12, "convex turns are positive");
            }
            assert!((ring.reduce(RingReduction::Unsigned) - 4.0 * turn).abs() < 1e-12);
            assert!((ring.reduce(RingReduction::Signed) - 4.0 * turn).abs() < 1e-12);
            assert!((ring.reduce(RingReduction::FalseGaussian) - turn * turn).abs() < 1e-12);
            assert!((ring.reduce(RingReduction::FalseMean) - turn).abs() < 1e-12);
            assert_eq!(ring.reduce(RingReduction::PrincipalDeviation), 0.0);

            assert!((cone(&mesh, v).unwrap() - (TAU - 4.0 * turn)).abs() < 1e-12);
            assert!(horizon(&mesh, v).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_flat_ring_is_zero() {
        let mesh = primitives::grid(4, 1.0).unwrap();
        for v in mesh.vertex_ids() {
            let Some(ring) = NormalRing::around(&mesh, v) else {
                assert!(mesh.is_boundary_vertex(v));
                continue;
            };
            for reduction in [
                RingReduction::Unsigned,
                RingReduction::Signed,
                RingReduction::Max,
                RingReduction::Min,
                RingReduction::FalseGaussian,
                RingReduction::FalseMean,
                RingReduction::PrincipalDeviation,
            ] {
                assert_eq!(ring.reduce(reduction), 0.0, "{:?}", reduction);
            }
            assert_eq!(horizon(&mesh, v), Some(0.0));
            assert_eq!(cone(&mesh, v), Some(TAU));
        }
    }

    #[test]
    fn test_boundary_is_undefined() {
        let mesh = primitives::grid(2, 1.0).unwrap();
        let corner = VertexId::new(0);
        assert!(NormalRing::around(&mesh, corner).is_none());
        assert!(horizon(&mesh, corner).is_none());
        assert!(cone(&mesh, corner).is_none());
        assert!(ring_curvature(&mesh, corner, RingReduction::Max).is_none());
    }

    #[test]
    fn test_torus_inner_ring_has_negative_turns() {
        let mesh = primitives::torus(2.0, 0.5, 32, 16).unwrap();

        let outer = NormalRing::around(&mesh, VertexId::new(0)).unwrap();
        assert!(outer.reduce(RingReduction::Min) > -1e-9);
        assert!(outer.reduce(RingReduction::Max) > 0.3);

        let inner = NormalRing::around(&mesh, VertexId::new(8)).unwrap();
        assert!(inner.reduce(RingReduction::Min) < -0.1);
        assert!(inner.reduce(RingReduction::FalseGaussian) < 0.0);

        // Turns on a hyperbolic vertex partly cancel.
        assert!(inner.signed_turn().abs() < inner.total_turn());
    }

    #[test]
    fn test_cone_at_hyperbolic_vertex() {
        let mesh = primitives::torus(2.0, 0.5, 32, 16).unwrap();
        let inner = VertexId::new(8);
        let ring = NormalRing::around(&mesh, inner).unwrap();
        let value = cone(&mesh, inner).unwrap();

        assert!((value - (TAU - ring.total_turn())).abs() < 1e-12);
        assert!(value > 5.0 && value < 5.2, "cone = {}", value);
        // The angle defect is negative here; the cone is not.
        assert!(crate::algo::curvature::angle_defect(&mesh, inner).unwrap() < 0.0);
    }

    #[test]
    fn test_horizon_on_unit_sphere() {
        let mesh = primitives::icosphere(2).unwrap();
        for v in mesh.vertex_ids() {
            let h = horizon(&mesh, v).unwrap();
            assert!((h - 2.0).abs() < 0.03, "horizon at {:?} = {}", v, h);
        }
    }

    #[test]
    fn test_principal_deviation_range() {
        let mesh = primitives::torus(2.0, 0.5, 32, 16).unwrap();
        for v in mesh.vertex_ids() {
            let d = ring_curvature(&mesh, v, RingReduction::PrincipalDeviation).unwrap();
            assert!((0.0..=FRAC_PI_2).contains(&d), "deviation at {:?} = {}", v, d);
        }
        // On the inner equator the extreme turns sit on perpendicular edges.
        let inner = ring_curvature(&mesh, VertexId::new(8), RingReduction::PrincipalDeviation).unwrap();
        assert!(inner.abs() < 1e-6);
    }

    #[test]
    fn test_triangle_horizon_on_sphere() {
        let mesh = primitives::icosphere(2).unwrap();
        let values = vertex_triangle_horizon(&mesh);
        assert_eq!(values.len(), mesh.num_vertices());
        assert!(values.iter().all(|&h| h > 0.0 && h < 0.5));

        let horizons = triangle_horizons(&mesh);
        for (t, h) in mesh.triangle_ids().zip(&horizons) {
            assert!(h.area > 0.0);
            assert!((h.per_perimeter * mesh.triangle_perimeter(t) - h.area).abs() < 1e-12);
            assert!((h.per_area * mesh.triangle(t).area - h.area).abs() < 1e-12);
        }
    }

    #[test]
    fn test_triangle_horizon_flat() {
        let mesh = primitives::grid(3, 1.0).unwrap();
        assert!(vertex_triangle_horizon(&mesh).iter().all(|&h| h.abs() < 1e-12));
        assert!(triangle_horizons(&mesh).iter().all(|h| h.area.abs() < 1e-12));
    }
}
