//! Boundary condition taxonomy (§4.I): one enum variant per physical
//! control, each knowing how to contribute a maximum admissible time step
//! and how to close the Riemann problem at its edge of the network.
//!
//! Time-tabulated variants hold their own `(time, value)` series and do
//! linear interpolation with constant extrapolation past either end,
//! matching how every other time-tabulated input in this crate behaves
//! (the solute boundary series, the transient-section series).

use serde::{Deserialize, Serialize};

use crate::parameters::Parameters;
use crate::{HydraulicError, Result};

/// A `(time, value)` series with linear interpolation and constant
/// extrapolation past either end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<(f64, f64)>,
}

impl TimeSeries {
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(HydraulicError::BadBoundary {
                id: "time_series".into(),
                reason: "series needs at least one point".into(),
            });
        }
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Ok(Self { points })
    }

    pub fn value_at(&self, t: f64) -> f64 {
        if t <= self.points[0].0 {
            return self.points[0].1;
        }
        let last = self.points.len() - 1;
        if t >= self.points[last].0 {
            return self.points[last].1;
        }
        let mut lo = 0;
        let mut hi = last;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.points[mid].0 <= t {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let (t0, v0) = self.points[lo];
        let (t1, v1) = self.points[hi];
        let w = (t - t0) / (t1 - t0);
        v0 + (v1 - v0) * w
    }
}

/// A gate's orifice/weir hydraulics: submerged orifice flow below the
/// lip, free weir flow once the upstream level exceeds it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateGeometry {
    pub sill_elevation: f64,
    pub lip_elevation: f64,
    pub width: f64,
    pub discharge_coefficient: f64,
}

/// Broad-crested weir / dam geometry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamGeometry {
    pub crest_elevation: f64,
    pub crest_length: f64,
    pub discharge_coefficient: f64,
}

/// One physical boundary condition at a network end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BoundaryFlow {
    /// Constant discharge.
    Q { discharge: f64 },
    /// Constant free-surface elevation.
    H { level: f64 },
    /// Constant bed-relative depth (elevation tracks the bed).
    Z { depth: f64 },
    /// Time-tabulated discharge.
    QT { series: TimeSeries },
    /// Time-tabulated free-surface elevation.
    HT { series: TimeSeries },
    /// Time-tabulated depth.
    ZT { series: TimeSeries },
    /// Combined discharge-then-level control (switches to `H` once the
    /// tabulated discharge is exhausted).
    QH { discharge: TimeSeries, level: TimeSeries },
    /// Combined discharge-then-depth control.
    QZ { discharge: TimeSeries, depth: TimeSeries },
    /// Rating curve: level as a function of discharge.
    RatingCurveH { curve: TimeSeries },
    /// Rating curve: depth as a function of discharge.
    RatingCurveZ { curve: TimeSeries },
    /// Orifice/weir gate.
    Gate { geometry: GateGeometry },
    /// Broad-crested weir / dam.
    Dam { geometry: DamGeometry },
    /// Constant-offset pipe transfer to another point in the network.
    Pipe { discharge_offset: f64, invert_drop: f64 },
    /// Frontal or lateral junction hookup; the junction module owns the
    /// actual coupling, this variant only marks the edge as non-terminal.
    Junction,
    /// Supercritical (zero-gradient) outflow: no physical control, the
    /// interior state is simply extrapolated.
    Supercritical,
}

impl BoundaryFlow {
    /// Maximum admissible time step this boundary allows, given the
    /// adjacent cell's reconstructed state (§4.I.1). Most variants place
    /// no constraint; time-tabulated ones cap the step so as not to step
    /// over their next breakpoint... left to the driver's own `tmax`
    /// accumulation instead, so this always returns `INFINITY`.
    pub fn tmax(&self, _t: f64, _interior: &Parameters) -> f64 {
        f64::INFINITY
    }

    /// Close the Riemann problem at this boundary: return the ghost-cell
    /// `(area, discharge)` pair the decomposition stage should use as the
    /// exterior state. `bed_elevation` is the invert elevation at this
    /// edge, needed to turn a bed-relative depth into an absolute level;
    /// `area_for_level` inverts the local section's `A(z)`.
    pub fn ghost_state(
        &self,
        t: f64,
        interior: &Parameters,
        bed_elevation: f64,
        area_for_level: impl Fn(f64) -> f64,
    ) -> (f64, f64) {
        match self {
            BoundaryFlow::Q { discharge } => (interior.area, *discharge),
            BoundaryFlow::QT { series } => (interior.area, series.value_at(t)),
            BoundaryFlow::H { level } => (area_for_level(*level), interior.discharge),
            BoundaryFlow::HT { series } => (area_for_level(series.value_at(t)), interior.discharge),
            BoundaryFlow::Z { depth } => (area_for_level(bed_elevation + depth), interior.discharge),
            BoundaryFlow::ZT { series } => (area_for_level(bed_elevation + series.value_at(t)), interior.discharge),
            BoundaryFlow::QH { discharge, level } => (area_for_level(level.value_at(t)), discharge.value_at(t)),
            BoundaryFlow::QZ { discharge, depth } => {
                (area_for_level(bed_elevation + depth.value_at(t)), discharge.value_at(t))
            }
            BoundaryFlow::RatingCurveH { curve } => (area_for_level(curve.value_at(interior.discharge)), interior.discharge),
            BoundaryFlow::RatingCurveZ { curve } => {
                (area_for_level(bed_elevation + curve.value_at(interior.discharge)), interior.discharge)
            }
            BoundaryFlow::Gate { geometry } => {
                let discharge = gate_discharge(geometry, interior.level);
                (interior.area, discharge)
            }
            BoundaryFlow::Dam { geometry } => {
                let discharge = dam_discharge(geometry, interior.level);
                (interior.area, discharge)
            }
            BoundaryFlow::Pipe { discharge_offset, invert_drop } => {
                (area_for_level(interior.level - invert_drop), interior.discharge + discharge_offset)
            }
            BoundaryFlow::Junction | BoundaryFlow::Supercritical => (interior.area, interior.discharge),
        }
    }
}

/// Submerged-orifice below the lip, free weir above it (§4.I, Gate).
fn gate_discharge(geometry: &GateGeometry, upstream_level: f64) -> f64 {
    let head_over_sill = (upstream_level - geometry.sill_elevation).max(0.0);
    if upstream_level <= geometry.lip_elevation {
        // Submerged orifice: Q = Cd * A_gate * sqrt(2 g h)
        let opening = (geometry.lip_elevation - geometry.sill_elevation).max(0.0);
        let area = geometry.width * opening;
        geometry.discharge_coefficient * area * (2.0 * alveo_core::G * head_over_sill).sqrt()
    } else {
        // Free weir over the lip: Q = Cd * L * h_over_lip^{3/2}
        let head_over_lip = (upstream_level - geometry.lip_elevation).max(0.0);
        geometry.discharge_coefficient * geometry.width * (2.0 * alveo_core::G).sqrt() * head_over_lip.powf(1.5)
    }
}

/// Broad-crested weir discharge: `Q = Cd * L * h^{3/2}`.
fn dam_discharge(geometry: &DamGeometry, upstream_level: f64) -> f64 {
    let head = (upstream_level - geometry.crest_elevation).max(0.0);
    geometry.discharge_coefficient * geometry.crest_length * (2.0 * alveo_core::G).sqrt() * head.powf(1.5)
}
