//! Error types for curvmap.
//!
//! Only malformed input is an error. Values that are undefined at boundary
//! vertices are reported as `None` by the operators, and degenerate geometry is
//! logged and evaluated on a best-effort basis.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building or analyzing a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// The triangle soup does not describe an oriented 2-manifold.
    #[error("invalid topology: {0}")]
    InvalidTopology(#[from] TopologyError),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

/// Reasons a triangle soup is rejected at build time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A triangle references a vertex index past the end of the vertex list.
    #[error("triangle {triangle} references vertex {vertex}, but there are only {vertex_count} vertices")]
    VertexOutOfRange {
        /// The triangle index.
        triangle: usize,
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertices supplied.
        vertex_count: usize,
    },

    /// A triangle names the same vertex more than once.
    #[error("triangle {triangle} repeats a vertex")]
    RepeatedVertex {
        /// The triangle index.
        triangle: usize,
    },

    /// An edge has more than two incident triangles.
    #[error("edge ({v0}, {v1}) has more than two incident triangles")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Two triangles traverse a shared edge in the same direction.
    #[error("edge ({v0}, {v1}) is traversed in the same direction by two triangles")]
    InconsistentOrientation {
        /// Origin of the directed edge.
        v0: usize,
        /// Destination of the directed edge.
        v1: usize,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
