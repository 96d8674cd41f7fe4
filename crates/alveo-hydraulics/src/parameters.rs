//! Per-cell hydraulic state and stage D: reconstruction of derived
//! parameters from the conserved variables `(A, Q)` ahead of each step's
//! flux decomposition.
//!
//! `Parameters` is the unit the rest of the solver passes around instead
//! of the bare conserved pair: it carries everything the Roe
//! decomposition, the friction integrator and the transport stage need so
//! none of them has to re-derive depth, width or wave speed from scratch.
//! Cheap to recompute, so it is rebuilt every step rather than patched
//! incrementally, the same per-step `FlowState` reconstruction pattern a
//! Saint-Venant solver's hot loop always needs.

use alveo_core::G;

use crate::segment::ChannelSegment;

/// Dry-cell threshold: cells with `area < Amin` are treated as dry for
/// wave-speed and friction purposes, and are candidates for the local
/// mass-redistribution walk in `step.rs`.
pub const DEFAULT_AMIN: f64 = 1e-4;

/// Reconstructed per-cell state, rebuilt every step from `(area, discharge)`.
///
/// `Default` is a zeroed, `dry` placeholder only ever used to size a cell
/// array before the first reconstruction pass fills it in (§4.D); nothing
/// reads it as a real hydraulic state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Parameters {
    /// Wetted area (m²).
    pub area: f64,
    /// Discharge (m³/s).
    pub discharge: f64,
    /// Free-surface elevation (m).
    pub level: f64,
    /// Top width (m).
    pub width: f64,
    /// Wetted perimeter (m).
    pub perimeter: f64,
    /// Mean velocity `Q/A` (m/s), zero when dry.
    pub velocity: f64,
    /// Wave celerity used by the Riemann decomposition. Equal to
    /// `sqrt(g A / B)` when wet; falls back to `sqrt(g * hmin)` when the
    /// cell is at or below `Amin`, per the dry-cell convention resolved
    /// from the source this solver is modelled on (using the local
    /// minimum uniform-flow depth rather than a vanishing `A/B`).
    pub wave_velocity: f64,
    /// Composite Manning roughness at the current level.
    pub roughness: f64,
    /// Boussinesq momentum coefficient at the current level.
    pub beta: f64,
    /// `dβ/dA`, needed by the momentum-flux Jacobian.
    pub d_beta_a: f64,
    /// true if `area <= Amin`.
    pub dry: bool,
}

impl Parameters {
    /// Reconstruct parameters at chainage `x` from the conserved pair,
    /// matching the "dry" fallback to the segment's own `hmin`.
    pub fn reconstruct(segment: &ChannelSegment, x: f64, area: f64, discharge: f64, amin: f64) -> Self {
        let area = area.max(0.0);
        let dry = area <= amin;
        let level = segment.level_at(x, area);
        let width = segment.width_at(x, level).max(1e-9);
        let perimeter = segment.perimeter_at(x, level).max(1e-9);
        let velocity = if dry { 0.0 } else { discharge / area };

        let wave_velocity = if dry {
            (G * segment.hmin_at(x)).sqrt()
        } else {
            (G * area / width).sqrt()
        };

        let fric = segment.friction_at(x, level);

        Parameters {
            area,
            discharge,
            level,
            width,
            perimeter,
            velocity,
            wave_velocity,
            roughness: fric.r,
            beta: fric.beta,
            d_beta_a: fric.d_beta_a,
            dry,
        }
    }

    /// Froude number, `|V| / wave_velocity`. Zero when dry.
    pub fn froude(&self) -> f64 {
        if self.dry || self.wave_velocity <= 0.0 {
            0.0
        } else {
            self.velocity.abs() / self.wave_velocity
        }
    }

    /// Local CFL-limited time step for a cell of length `dx`.
    pub fn cfl_time_step(&self, dx: f64, courant_max: f64) -> f64 {
        let speed = self.velocity.abs() + self.wave_velocity;
        if speed <= 0.0 {
            f64::INFINITY
        } else {
            courant_max * dx / speed
        }
    }

    /// Manning quadratic friction coefficient `K` such that the friction
    /// slope is `Sf = K * |Q| * Q`: `K = g n^2 / (A^2 R^{4/3})`.
    pub fn friction_coefficient(&self) -> f64 {
        if self.dry {
            return 0.0;
        }
        let hydraulic_radius = self.area / self.perimeter;
        G * self.roughness.powi(2) / (self.area.powi(2) * hydraulic_radius.powf(4.0 / 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{FrictionLaw, GeometryConfig, Section, SectionPoint, TransientSection};
    use crate::segment::{ChannelSegment, Station};

    fn rect_segment(width: f64, depth: f64, n: f64) -> ChannelSegment {
        let build = || {
            let ts = TransientSection {
                time: 0.0,
                points: vec![
                    SectionPoint::new(0.0, depth, n, FrictionLaw::Pressure),
                    SectionPoint::new(1e-6, 0.0, n, FrictionLaw::Pressure),
                    SectionPoint::new(width - 1e-6, 0.0, n, FrictionLaw::Pressure),
                    SectionPoint::new(width, depth, n, FrictionLaw::Pressure),
                ],
                hmax: depth,
                contraction: 0.1,
                dz: depth / 10.0,
            };
            Section::build(&ts, "rect", &GeometryConfig::default()).unwrap()
        };
        ChannelSegment::new(
            "reach",
            vec![
                Station { x: 0.0, section: build() },
                Station { x: 100.0, section: build() },
            ],
        )
        .unwrap()
    }

    #[test]
    fn wet_cell_has_positive_velocity_and_wave_speed() {
        let seg = rect_segment(5.0, 2.0, 0.03);
        let p = Parameters::reconstruct(&seg, 50.0, 5.0, 10.0, DEFAULT_AMIN);
        assert!(!p.dry);
        assert!(p.velocity > 0.0);
        assert!(p.wave_velocity > 0.0);
    }

    #[test]
    fn dry_cell_has_zero_velocity_and_finite_wave_speed() {
        let seg = rect_segment(5.0, 2.0, 0.03);
        let p = Parameters::reconstruct(&seg, 50.0, 0.0, 0.0, DEFAULT_AMIN);
        assert!(p.dry);
        assert_eq!(p.velocity, 0.0);
        assert!(p.wave_velocity.is_finite() && p.wave_velocity > 0.0);
    }

    #[test]
    fn cfl_time_step_shrinks_as_discharge_grows() {
        let seg = rect_segment(5.0, 2.0, 0.03);
        let slow = Parameters::reconstruct(&seg, 50.0, 5.0, 2.0, DEFAULT_AMIN);
        let fast = Parameters::reconstruct(&seg, 50.0, 5.0, 20.0, DEFAULT_AMIN);
        assert!(fast.cfl_time_step(10.0, 0.8) < slow.cfl_time_step(10.0, 0.8));
    }
}
