//! Error and warning kinds raised while driving a simulation (§7).
//!
//! `DriverError` is fatal: it aborts `simulate` and propagates to the
//! caller. `StepWarning` is not: the driver records it (via `tracing::warn!`
//! and, where the option is configured, the contributions log) and
//! continues the time loop, matching §7's split between the three fatal
//! kinds and the three recoverable ones.

use thiserror::Error;

/// Fatal errors that abort `simulate` (§7 kinds 1-3, plus I/O).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Mesh(#[from] alveo_mesh::MeshError),

    #[error(transparent)]
    Hydraulic(#[from] alveo_hydraulics::HydraulicError),

    #[error(transparent)]
    Fatal(#[from] alveo_core::FatalError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;

/// Non-fatal conditions recovered in place during the step loop (§7 kinds
/// 4-6). The driver accumulates these for the end-of-run warning summary
/// rather than aborting.
#[derive(Debug, Clone, Error)]
pub enum StepWarning {
    /// A cell's stage rose above its section's configured `zmax`.
    #[error("channel '{channel}' overflowed at t={time} (cell {cell})")]
    Overflow { channel: String, cell: usize, time: f64 },

    /// A boundary's prescribed condition was inconsistent with the
    /// incoming characteristic; recovered by clamping to 0.99x critical.
    #[error("boundary '{boundary}' clamped to critical discharge at t={time}")]
    SupercriticalClamped { boundary: String, time: f64 },

    /// The steady-state initialiser exceeded `max_steady_time`.
    #[error("steady initialisation timed out at pseudo-time={pseudo_time} (error={error})")]
    SteadyTimeout { pseudo_time: f64, error: f64 },
}
