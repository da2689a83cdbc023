//! Core mesh data structures.
//!
//! This module provides the indexed triangle mesh and the corner table that
//! every curvature operator walks.
//!
//! # Overview
//!
//! The primary type is [`Mesh`], built once from a triangle soup. It owns flat
//! arenas of [`Vertex`], [`Edge`] and [`Triangle`] records plus a
//! [`CornerTable`] holding one [`Corner`] per (vertex, triangle) incidence.
//! All cross references are typed indices, so the cyclic
//! `next`/`previous`/`opposite` relations cost a lookup, never a borrow.
//!
//! # Index Types
//!
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`TriangleId`] - Identifies a triangle
//! - [`CornerId`] - Identifies a corner, `3 * triangle + slot`
//!
//! # Construction
//!
//! ```
//! use curvmap::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let triangles = vec![[0, 1, 2]];
//!
//! let mesh = Mesh::build(&vertices, &triangles).unwrap();
//! assert_eq!(mesh.corners().len(), 3);
//! ```
//!
//! Test shapes are available in [`primitives`].

mod corner;
mod index;
pub mod primitives;
mod store;

pub use corner::{Corner, CornerTable, VertexStar};
pub use index::{CornerId, EdgeId, TriangleId, VertexId};
pub use store::{Edge, Mesh, Triangle, Vertex, DEGENERATE_AREA};
