//! Arena index types for the flat entity arrays of a built network.
//!
//! The solver represents channels, cells, junctions and boundaries as plain
//! `u32` indices into flat `Vec`s rather than as owning references, so that
//! the cyclic cell ↔ channel ↔ junction ↔ boundary relationships described
//! in the network topology never need `Rc`/`RefCell` or lifetimes threaded
//! through the solver. See `arena` for the backing storage.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! index_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Construct from a raw flat index.
            #[inline]
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            /// The raw flat index.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v as u32)
            }
        }

        impl From<$name> for usize {
            fn from(v: $name) -> usize {
                v.index()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_id!(CellId, "Index of a cell in the flat mesh cell arena.");
index_id!(ChannelId, "Index of a channel in the network.");
index_id!(JunctionId, "Index of a junction (node) in the network.");
index_id!(BoundaryId, "Index of a boundary condition attached to a channel end or interval.");
index_id!(TransportId, "Index of a solute in the transport array.");
index_id!(ThreadId, "Index of a worker partition of the flat cell arena.");

/// An inclusive-start, exclusive-end range of cell indices, as used to
/// record which cells belong to a channel or to a worker thread partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellId,
    pub end: CellId,
}

impl CellRange {
    pub fn new(start: CellId, end: CellId) -> Self {
        debug_assert!(start.0 <= end.0);
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.0 == self.end.0
    }

    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        cell.0 >= self.start.0 && cell.0 < self.end.0
    }

    pub fn iter(&self) -> impl Iterator<Item = CellId> {
        (self.start.0..self.end.0).map(CellId)
    }
}
