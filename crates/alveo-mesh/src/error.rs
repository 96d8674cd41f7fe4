//! Error kinds raised while building a [`crate::builder::Mesh`] from a
//! [`crate::network::Network`].

use thiserror::Error;

/// Result type alias for mesh-building operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors raised while discretising a network into a flat mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A channel's geometry failed to build (propagated from
    /// `alveo_hydraulics::HydraulicError`).
    #[error("channel '{channel}' has bad geometry: {reason}")]
    BadGeometry { channel: String, reason: String },

    /// A channel could not be discretised into at least one cell.
    #[error("channel '{channel}' could not be discretised: {reason}")]
    BadDiscretization { channel: String, reason: String },

    /// A boundary's `(pos, pos2)` interval does not resolve to a valid
    /// cell range within its channel.
    #[error("boundary '{boundary}' on channel '{channel}' has an invalid position: {reason}")]
    BadBoundaryPosition {
        boundary: String,
        channel: String,
        reason: String,
    },

    /// A junction reference names an unknown channel or position, or mixes
    /// frontal and lateral linkage incompatibly (§4.C.8 / §7 `BadTopology`).
    #[error("bad topology between '{left}' and '{right}': {reason}")]
    BadTopology {
        left: String,
        right: String,
        reason: String,
    },

    /// Propagated from the hydraulics crate's own fallible constructors.
    #[error(transparent)]
    Hydraulic(#[from] alveo_hydraulics::HydraulicError),
}
