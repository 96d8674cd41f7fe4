//! Run configuration (§4.L, §6 "Configuration input") — the numeric
//! tunables that configure the solver rather than describe the physical
//! network. Kept out of [`alveo_mesh::network::Network`] on purpose: a
//! `SystemConfig` is a run setting (can change between two runs of the same
//! network), the network is the thing being simulated.
//!
//! Mirrors `SaintVenantConfig`'s one-`impl Default`-block-per-field style:
//! every option from the option table gets a doc comment stating its unit
//! and a `#[serde(default = "...")]` fallback so a config file only needs
//! to override what it cares about.

use serde::{Deserialize, Serialize};

/// Numeric options controlling one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SystemConfig {
    /// t0: simulation start time (s).
    #[serde(default)]
    pub initial_time: f64,
    /// End of the observed window (s); informational, does not affect the
    /// loop bounds.
    #[serde(default = "default_observation_time")]
    pub observation_time: Option<f64>,
    /// tf: simulation end time (s).
    pub final_time: f64,
    /// ti: snapshot interval (s). Defaults to the whole run as one snapshot.
    #[serde(default)]
    pub measured_interval: Option<f64>,
    /// CFL number bounding the explicit time step.
    #[serde(default = "default_cfl")]
    pub cfl: f64,
    /// theta: implicit weighting of the friction integrator, in `[0, 1]`
    /// (0.5 = Crank-Nicolson).
    #[serde(default = "default_implicit")]
    pub implicit: f64,
    /// Steady-state residual tolerance below which `simulate_steady` stops.
    #[serde(default = "default_steady_error")]
    pub steady_error: f64,
    /// Steady-state wall-clock timeout (s of simulated pseudo-time); `None`
    /// for no limit.
    #[serde(default)]
    pub max_steady_time: Option<f64>,
    /// Minimum allowed ratio `B / B_max` passed to the section builder.
    #[serde(default = "default_section_width_min")]
    pub section_width_min: f64,
    /// Wet/dry area cut-off `Amin` (m²).
    #[serde(default = "default_depth_min")]
    pub depth_min: f64,
    /// Aerodynamical/granulometric coefficient for the logarithmic friction law.
    #[serde(default = "default_granulometric_coefficient")]
    pub granulometric_coefficient: f64,
    /// Binary snapshot output path.
    pub solution_file: String,
    /// Optional ASCII wavefront-advance diagnostic output path.
    #[serde(default)]
    pub advances_file: Option<String>,
    /// Optional ASCII solute-plume diagnostic output path.
    #[serde(default)]
    pub plumes_file: Option<String>,
    /// Optional ASCII boundary-contribution diagnostic output path.
    #[serde(default)]
    pub contributions_file: Option<String>,
    /// Fraction of a solute's `solubility` above which a cell counts as
    /// "inside the plume" for the plumes file (§6 "Plumes file").
    #[serde(default = "default_plume_threshold_fraction")]
    pub plume_threshold_fraction: f64,
}

fn default_observation_time() -> Option<f64> {
    None
}

fn default_cfl() -> f64 {
    0.9
}

fn default_implicit() -> f64 {
    0.5
}

fn default_steady_error() -> f64 {
    1e-12
}

fn default_section_width_min() -> f64 {
    1e-3
}

fn default_depth_min() -> f64 {
    alveo_hydraulics::parameters::DEFAULT_AMIN
}

fn default_granulometric_coefficient() -> f64 {
    alveo_hydraulics::section::GeometryConfig::default().granulometric_coefficient
}

fn default_plume_threshold_fraction() -> f64 {
    0.8
}

impl SystemConfig {
    /// Minimal config for a given run length and output path, with every
    /// other option at its table default.
    pub fn new(final_time: f64, solution_file: impl Into<String>) -> Self {
        Self {
            initial_time: 0.0,
            observation_time: default_observation_time(),
            final_time,
            measured_interval: None,
            cfl: default_cfl(),
            implicit: default_implicit(),
            steady_error: default_steady_error(),
            max_steady_time: None,
            section_width_min: default_section_width_min(),
            depth_min: default_depth_min(),
            granulometric_coefficient: default_granulometric_coefficient(),
            solution_file: solution_file.into(),
            advances_file: None,
            plumes_file: None,
            contributions_file: None,
            plume_threshold_fraction: default_plume_threshold_fraction(),
        }
    }

    /// Snapshot interval, defaulting to the full run (one snapshot at the end).
    pub fn snapshot_interval(&self) -> f64 {
        self.measured_interval.unwrap_or(self.final_time - self.initial_time).max(1e-9)
    }

    /// The `GeometryConfig` this run's section builder should use.
    pub fn geometry_config(&self) -> alveo_hydraulics::section::GeometryConfig {
        alveo_hydraulics::section::GeometryConfig {
            section_width_min: self.section_width_min,
            granulometric_coefficient: self.granulometric_coefficient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_every_option_with_its_table_default() {
        let cfg = SystemConfig::new(3600.0, "out.bin");
        assert_eq!(cfg.cfl, 0.9);
        assert_eq!(cfg.implicit, 0.5);
        assert_eq!(cfg.steady_error, 1e-12);
        assert!(cfg.advances_file.is_none());
    }

    #[test]
    fn snapshot_interval_defaults_to_the_whole_run() {
        let cfg = SystemConfig::new(1000.0, "out.bin");
        assert_eq!(cfg.snapshot_interval(), 1000.0);
    }

    #[test]
    fn config_round_trips_through_json_with_only_required_fields() {
        let json = r#"{"final_time": 500.0, "solution_file": "sol.bin"}"#;
        let cfg: SystemConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.final_time, 500.0);
        assert_eq!(cfg.cfl, 0.9);
        assert_eq!(cfg.depth_min, alveo_hydraulics::parameters::DEFAULT_AMIN);
    }
}
