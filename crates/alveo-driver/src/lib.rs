//! # alveo-driver
//!
//! The simulation driver: turns a built [`alveo_mesh::builder::Mesh`] and a
//! [`config::SystemConfig`] into a running 1-D unsteady free-surface flow
//! and solute transport simulation (§4.J), and writes its binary
//! snapshot/ASCII diagnostic output (§6).
//!
//! ## Modules
//!
//! - [`config`] - numeric run options (§4.L, §6 "Configuration input")
//! - [`driver`] - the time-stepping pipeline, steady initialiser and
//!   parallel stage scheduling (§4.D-§4.J, §5)
//! - [`io`] - solution/advances/plumes/contributions file writers (§6)
//! - [`error`] - fatal errors and recoverable step warnings (§7)

pub mod config;
pub mod driver;
pub mod error;
pub mod io;

pub use config::SystemConfig;
pub use driver::{NullObserver, SimulationObserver, SimulationReport, SolverState};
pub use error::{DriverError, Result, StepWarning};
pub use io::OutputWriters;
