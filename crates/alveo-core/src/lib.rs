//! # alveo-core
//!
//! Arena-indexed id types, a minimal typed arena, shared fatal-error kinds
//! and the handful of physical constants used by every other crate in the
//! workspace. This crate is kernel-agnostic: it has no knowledge of
//! sections, meshes or the Saint-Venant equations, only of the indexing
//! scheme they are all built on.
//!
//! ## Modules
//!
//! - [`id`] - Arena index types (`CellId`, `ChannelId`, `JunctionId`, ...)
//! - [`arena`] - The `Arena<Id, T>` backing store
//! - [`error`] - Fatal error kinds shared across crates
//! - [`constants`] - Physical constants (gravity, von Kármán)

pub mod arena;
pub mod constants;
pub mod error;
pub mod id;

pub use arena::Arena;
pub use constants::{G, KAPPA};
pub use error::{FatalError, FatalResult};
pub use id::{BoundaryId, CellId, CellRange, ChannelId, JunctionId, ThreadId, TransportId};
