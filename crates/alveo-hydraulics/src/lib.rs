//! alveo-hydraulics
//!
//! The numerical core of the simulator: cross-section geometry tables,
//! the Roe-linearized TVD finite-volume decomposition, explicit and
//! semi-implicit time integration, advection-diffusion solute transport,
//! the boundary-condition taxonomy, and junction coupling between channels.
//!
//! This crate has no notion of a network topology, a mesh file or a CLI —
//! it operates on flat cell/edge arrays handed to it by `alveo-mesh` and
//! orchestrated by `alveo-driver`. See each module for the stage of the
//! per-step pipeline it implements.

pub mod boundary;
pub mod decomposition;
pub mod friction;
pub mod junction;
pub mod parameters;
pub mod scheme;
pub mod section;
pub mod segment;
pub mod step;
pub mod transport;

pub use boundary::BoundaryFlow;
pub use junction::Junction;
pub use parameters::Parameters;
pub use scheme::SchemeConfig;
pub use section::{FrictionLaw, FrictionParameters, GeometryConfig, Section, SectionParameters, SectionPoint, TransientSection};
pub use segment::ChannelSegment;

/// Errors raised while building or evaluating hydraulic geometry. Errors
/// that originate from the numerical solver itself (unrecoverable state,
/// broken topology) live in `alveo_core::FatalError` instead — this enum
/// is for problems with the *input data* a caller can fix and retry.
#[derive(Debug, thiserror::Error)]
pub enum HydraulicError {
    #[error("bad geometry in section '{id}': {reason}")]
    BadGeometry { id: String, reason: String },

    #[error("bad channel segment '{id}': {reason}")]
    BadSegment { id: String, reason: String },

    #[error("bad boundary condition '{id}': {reason}")]
    BadBoundary { id: String, reason: String },

    #[error("bad junction '{id}': {reason}")]
    BadJunction { id: String, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, HydraulicError>;
