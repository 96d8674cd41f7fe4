//! # alveo-mesh
//!
//! Turns a user-authored [`network::Network`] into the flat, arena-indexed
//! cell/channel/junction/boundary arrays the driver steps every tick
//! ([`builder::Mesh`]).
//!
//! ## Modules
//!
//! - [`network`] - serializable network topology input (channels, stations,
//!   initial conditions, boundary placements)
//! - [`builder`] - the discretisation/resolution algorithm that builds a
//!   [`builder::Mesh`] from a [`network::Network`]
//! - [`error`] - error kinds raised while building a mesh

pub mod builder;
pub mod error;
pub mod network;

pub use builder::{BuiltChannel, ChannelEnd, JunctionMembership, Mesh, ResolvedBoundary};
pub use error::{MeshError, Result};
pub use network::{
    BoundarySpec, ChannelSpec, DiscretizationMode, InitialFlow, InitialTransport, JunctionPeer, Network, StationSpec,
};
