//! Index types for mesh elements.
//!
//! Vertices, edges, triangles and corners live in flat arenas owned by the
//! [`Mesh`](super::Mesh). They refer to each other through these typed indices
//! instead of references, so the cyclic `next`/`previous`/`opposite` relations
//! of the corner table are plain lookups.

use std::fmt::{self, Debug};

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TriangleId(u32);

/// A type-safe corner index.
///
/// Corners are laid out three per triangle, so corner `3 * t + s` is the corner
/// at local slot `s` of triangle `t`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct CornerId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(EdgeId, "E");
impl_index_type!(TriangleId, "T");
impl_index_type!(CornerId, "C");

impl CornerId {
    /// The corner at local `slot` (0, 1 or 2) of triangle `t`.
    #[inline]
    pub fn from_slot(t: TriangleId, slot: usize) -> Self {
        debug_assert!(slot < 3);
        Self::new(3 * t.index() + slot)
    }

    /// The triangle this corner belongs to.
    #[inline]
    pub fn triangle(self) -> TriangleId {
        TriangleId::new(self.index() / 3)
    }

    /// Local slot of this corner within its triangle.
    #[inline]
    pub fn slot(self) -> usize {
        self.index() % 3
    }

    /// The next corner in the same triangle, following its orientation.
    #[inline]
    pub fn next(self) -> Self {
        Self::from_slot(self.triangle(), (self.slot() + 1) % 3)
    }

    /// The previous corner in the same triangle.
    #[inline]
    pub fn previous(self) -> Self {
        Self::from_slot(self.triangle(), (self.slot() + 2) % 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(VertexId::from(42), v);
    }

    #[test]
    fn test_corner_slots() {
        let c = CornerId::from_slot(TriangleId::new(5), 2);
        assert_eq!(c.index(), 17);
        assert_eq!(c.triangle(), TriangleId::new(5));
        assert_eq!(c.slot(), 2);
        assert_eq!(c.next().index(), 15);
        assert_eq!(c.previous().index(), 16);
    }

    #[test]
    fn test_corner_cycle() {
        for i in 0..12 {
            let c = CornerId::new(i);
            assert_eq!(c.next().next().next(), c);
            assert_eq!(c.next().previous(), c);
            assert_eq!(c.previous().next(), c);
        }
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(42)), "V(42)");
        assert_eq!(format!("{:?}", CornerId::new(7)), "C(7)");
    }
}
