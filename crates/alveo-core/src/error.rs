//! Fatal error kinds shared across the workspace.
//!
//! Every crate defines its own `thiserror` enum for its own concerns
//! (`alveo-hydraulics::HydraulicError`, `alveo-mesh::MeshError`,
//! `alveo-driver::DriverError`); this module holds the handful of kinds that
//! are genuinely shared because they propagate unchanged across crate
//! boundaries: out-of-memory, bad geometry and bad topology are all fatal
//! at start-up and bubble straight to the caller of `simulate`.

use thiserror::Error;

/// Fatal, start-up-time errors that abort mesh construction or section
/// building and propagate to the driver without local recovery.
#[derive(Debug, Error)]
pub enum FatalError {
    /// Allocation failed while building a section, mesh or junction table.
    #[error("out of memory while building {context}")]
    OutOfMemory { context: String },

    /// A cross-section polygon or transient section is degenerate.
    #[error("bad geometry in section {id}: {reason}")]
    BadGeometry { id: String, reason: String },

    /// A junction or boundary reference does not resolve, or mixes
    /// frontal/lateral linkage incompatibly.
    #[error("bad topology between {left} and {right}: {reason}")]
    BadTopology {
        left: String,
        right: String,
        reason: String,
    },
}

pub type FatalResult<T> = std::result::Result<T, FatalError>;
