//! Procedural test shapes.
//!
//! All shapes are consistently oriented with outward normals (the grid faces
//! `+z`) and are returned already built.

use std::collections::HashMap;
use std::f64::consts::TAU;

use nalgebra::Point3;

use super::Mesh;
use crate::error::{MeshError, Result};

/// Regular tetrahedron inscribed in the unit sphere.
pub fn tetrahedron() -> Result<Mesh> {
    let s = 1.0 / 3.0_f64.sqrt();
    let vertices = vec![
        Point3::new(s, s, s),
        Point3::new(s, -s, -s),
        Point3::new(-s, s, -s),
        Point3::new(-s, -s, s),
    ];
    let faces = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    Mesh::build(&vertices, &faces)
}

/// Regular octahedron with vertices at `±x`, `±y`, `±z`.
pub fn octahedron() -> Result<Mesh> {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    Mesh::build(&vertices, &faces)
}

fn icosahedron_soup() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let scale = 1.0 / (1.0 + phi * phi).sqrt();

    let vertices = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::new(x * scale, y * scale, z * scale))
    .collect();

    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    (vertices, faces)
}

/// Regular icosahedron inscribed in the unit sphere.
pub fn icosahedron() -> Result<Mesh> {
    let (vertices, faces) = icosahedron_soup();
    Mesh::build(&vertices, &faces)
}

/// Unit icosphere: an icosahedron split `subdivisions` times, each new vertex
/// projected onto the sphere.
///
/// Level `n` has `10 * 4^n + 2` vertices.
pub fn icosphere(subdivisions: usize) -> Result<Mesh> {
    let (mut vertices, mut faces) = icosahedron_soup();

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();

        for face in &faces {
            let mut mids = [0usize; 3];
            for i in 0..3 {
                let v0 = face[i];
                let v1 = face[(i + 1) % 3];
                let key = (v0.min(v1), v0.max(v1));
                mids[i] = *midpoints.entry(key).or_insert_with(|| {
                    let mid = (vertices[v0].coords + vertices[v1].coords).normalize();
                    vertices.push(Point3::from(mid));
                    vertices.len() - 1
                });
            }

            new_faces.push([face[0], mids[0], mids[2]]);
            new_faces.push([face[1], mids[1], mids[0]]);
            new_faces.push([face[2], mids[2], mids[1]]);
            new_faces.push([mids[0], mids[1], mids[2]]);
        }

        faces = new_faces;
    }

    Mesh::build(&vertices, &faces)
}

/// Flat `n x n` grid of squares in the `z = 0` plane, centered on the origin
/// with side `size`. Each square is split along its `(i, j) -> (i+1, j+1)`
/// diagonal. Vertex `(i, j)` has index `j * (n + 1) + i`.
pub fn grid(n: usize, size: f64) -> Result<Mesh> {
    height_field(n, size, |_, _| 0.0)
}

/// Like [`grid`], with each vertex lifted to `z = height(x, y)`.
pub fn height_field<F>(n: usize, size: f64, height: F) -> Result<Mesh>
where
    F: Fn(f64, f64) -> f64,
{
    if n == 0 {
        return Err(MeshError::invalid_param("n", n, "must be at least 1"));
    }
    if !(size > 0.0) {
        return Err(MeshError::invalid_param("size", size, "must be positive"));
    }

    let step = size / n as f64;
    let half = size / 2.0;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let x = i as f64 * step - half;
            let y = j as f64 * step - half;
            vertices.push(Point3::new(x, y, height(x, y)));
        }
    }

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    Mesh::build(&vertices, &faces)
}

/// Torus around the `z` axis with tube center radius `major` and tube radius
/// `minor`, sampled `nu` times around the axis and `nv` times around the tube.
pub fn torus(major: f64, minor: f64, nu: usize, nv: usize) -> Result<Mesh> {
    if !(minor > 0.0) {
        return Err(MeshError::invalid_param("minor", minor, "must be positive"));
    }
    if !(major > minor) {
        return Err(MeshError::invalid_param(
            "major",
            major,
            "must exceed the minor radius",
        ));
    }
    if nu < 3 {
        return Err(MeshError::invalid_param("nu", nu, "must be at least 3"));
    }
    if nv < 3 {
        return Err(MeshError::invalid_param("nv", nv, "must be at least 3"));
    }

    let mut vertices = Vec::with_capacity(nu * nv);
    for i in 0..nu {
        let u = TAU * i as f64 / nu as f64;
        for j in 0..nv {
            let w = TAU * j as f64 / nv as f64;
            let ring = major + minor * w.cos();
            vertices.push(Point3::new(ring * u.cos(), ring * u.sin(), minor * w.sin()));
        }
    }

    let mut faces = Vec::with_capacity(2 * nu * nv);
    for i in 0..nu {
        let i1 = (i + 1) % nu;
        for j in 0..nv {
            let j1 = (j + 1) % nv;
            let a = i * nv + j;
            let b = i1 * nv + j;
            let c = i1 * nv + j1;
            let d = i * nv + j1;
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }

    Mesh::build(&vertices, &faces)
}
