//! Physical and numerical constants shared by every stage of the solver.

/// Gravitational acceleration (m/s²).
pub const G: f64 = 9.81;

/// Von Kármán constant, used by the logarithmic friction law integration.
pub const KAPPA: f64 = 0.41;
