//! Solute transport scheme (§4.H) — upwind plus TVD advection, a diffusive
//! correction and solubility-limited saturation bookkeeping, for an
//! arbitrary number of passive solutes.
//!
//! Like `step.rs`, this module is a library of pure functions over plain
//! values: the per-solute concentration/bound-mass arrays are owned by the
//! mesh's flat cell arena, this module only knows how to advance one
//! cell's or one edge's numbers given its own inputs.

use serde::{Deserialize, Serialize};

use alveo_core::G;

use crate::scheme::Limiter;

/// A passive, solubility-limited solute tracked by the transport stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solute {
    pub name: String,
    /// Saturation concentration (kg/m³); concentration above this is
    /// shifted into the cell's bound reservoir rather than advected.
    pub solubility: f64,
    /// Nominal dispersion coefficient (m²/s), used when the cell's local
    /// diffusivity isn't otherwise derived from shear.
    pub diffusivity: f64,
}

/// §4.H.1 node stage: clip `concentration` to `solubility`, moving any
/// excess mass into `bound`; if `bound` is already positive and the cell
/// has spare capacity, transfer mass back out of the reservoir toward
/// `solubility`. Returns the corrected `(concentration, bound)`.
pub fn apply_saturation(concentration: f64, volume: f64, bound: f64, solubility: f64) -> (f64, f64) {
    if volume <= 1e-12 {
        return (0.0, bound.max(0.0));
    }
    let mut c = concentration;
    let mut b = bound.max(0.0);
    if c > solubility {
        let excess_mass = (c - solubility) * volume;
        b += excess_mass;
        c = solubility;
    } else if b > 0.0 {
        let spare_mass = (solubility - c) * volume;
        let transfer = spare_mass.min(b);
        b -= transfer;
        c += transfer / volume;
    }
    (c.clamp(0.0, solubility), b.max(0.0))
}

/// §4.H.2 upwind advective mass flux at one edge: carried by whichever
/// cell the local discharge flows *from*, the same sign rule the flow
/// decomposition uses so advection stays consistent with the mass flux
/// that moved it. Returns the mass flux in the direction of positive `q`
/// (i.e. the amount added to the right cell's budget, subtracted from the
/// left's).
pub fn upwind_mass_flux(q_edge: f64, c_left: f64, c_right: f64) -> f64 {
    if q_edge >= 0.0 {
        q_edge * c_left
    } else {
        q_edge * c_right
    }
}

/// §4.H.2 TVD second-order correction to the upwind mass flux, in the
/// classical Sweby flux-limited form: `0.5 * (1 - |Courant|) * psi(r) *
/// dc_far`, where `r` is the ratio of the upwind jump to the far-side jump
/// (the same limiter family as the flow decomposition's wave correction).
pub fn tvd_mass_flux_correction(dc_upwind: f64, dc_far: f64, courant: f64, limiter: Limiter) -> f64 {
    if dc_far.abs() < 1e-12 {
        return 0.0;
    }
    let r = dc_upwind / dc_far;
    let psi = limiter.psi(r);
    0.5 * (1.0 - courant.abs()).max(0.0) * psi * dc_far
}

/// §4.H.3 diffusive mass flux at one edge: `min(nu_L, nu_R) * A / ix *
/// (c_left - c_right)` — positive when mass moves from the higher- to the
/// lower-concentration side, i.e. added to the right cell's budget. Taking
/// the minimum of the two diffusivities (rather than an average) prevents
/// spurious upstream transport leaking through a nearly-dry neighbour
/// whose own diffusivity estimate is unreliable.
pub fn diffusive_mass_flux(nu_left: f64, nu_right: f64, area: f64, edge_length: f64, c_left: f64, c_right: f64) -> f64 {
    let nu = nu_left.min(nu_right).max(0.0);
    let edge_length = edge_length.max(1e-9);
    nu * area / edge_length * (c_left - c_right)
}

/// Shear velocity `u* = sqrt(g * R * Sf)`, with the Manning friction slope
/// `Sf = K * |Q| * Q` supplying the magnitude. Used by
/// `DiffusionMode::ShearScaled` to augment a solute's nominal dispersion
/// coefficient with the local turbulent mixing an Elder-type formula would
/// predict from bed shear.
pub fn shear_velocity(hydraulic_radius: f64, friction_coefficient: f64, discharge: f64) -> f64 {
    (G * hydraulic_radius.max(0.0) * friction_coefficient.max(0.0)).sqrt() * discharge.abs()
}

/// §4.H.4 inlet boundary mass flux: `Q * c_in`.
pub fn inlet_mass_flux(discharge: f64, c_in: f64) -> f64 {
    discharge * c_in
}

/// §4.H.4 outlet boundary mass flux: carried by the upstream (interior)
/// concentration, regardless of discharge sign at the boundary.
pub fn outlet_mass_flux(discharge: f64, c_upstream: f64) -> f64 {
    discharge * c_upstream
}

/// How one solute behaves at a network boundary (§4.H.4, §4.I "apply_transport").
/// Kept as a separate per-solute rule from [`crate::boundary::BoundaryFlow`]
/// because a single hydraulic boundary (e.g. a `Q` inlet) may carry
/// different solutes differently (one tracer injected, another absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BoundaryTransport {
    /// Inflow concentration time series: mass flux is `Q * c_in(t)`.
    InletConcentration { series: crate::boundary::TimeSeries },
    /// Pointwise mass injection `M(t)` (kg/s), independent of `Q`.
    MassInjection { series: crate::boundary::TimeSeries },
    /// Outflow: carries the interior cell's own concentration.
    Outlet,
    /// This boundary carries no solute (e.g. an impermeable wall).
    None,
}

impl BoundaryTransport {
    /// Mass flux contributed by this boundary at time `t`, given the
    /// hydraulic discharge and the adjacent interior concentration.
    pub fn mass_flux(&self, t: f64, discharge: f64, c_interior: f64) -> f64 {
        match self {
            BoundaryTransport::InletConcentration { series } => inlet_mass_flux(discharge, series.value_at(t)),
            BoundaryTransport::MassInjection { series } => series.value_at(t),
            BoundaryTransport::Outlet => outlet_mass_flux(discharge, c_interior),
            BoundaryTransport::None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_shifts_excess_into_bound_reservoir() {
        let (c, b) = apply_saturation(5.0, 10.0, 0.0, 3.0);
        assert!((c - 3.0).abs() < 1e-9);
        assert!((b - 20.0).abs() < 1e-9); // (5-3)*10
    }

    #[test]
    fn saturation_refills_concentration_from_bound_reservoir() {
        let (c, b) = apply_saturation(1.0, 10.0, 15.0, 3.0);
        // spare capacity mass = (3-1)*10 = 20, bound has 15 -> all transferred
        assert!((b - 0.0).abs() < 1e-9);
        assert!((c - 2.5).abs() < 1e-9); // 1 + 15/10
    }

    #[test]
    fn saturation_is_a_no_op_within_bounds_and_no_reservoir() {
        let (c, b) = apply_saturation(1.0, 10.0, 0.0, 3.0);
        assert_eq!(c, 1.0);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn upwind_flux_uses_the_source_side_concentration() {
        assert_eq!(upwind_mass_flux(2.0, 5.0, 9.0), 10.0);
        assert_eq!(upwind_mass_flux(-2.0, 5.0, 9.0), -18.0);
    }

    #[test]
    fn diffusive_flux_moves_towards_lower_concentration() {
        let f = diffusive_mass_flux(1.0, 1.0, 5.0, 10.0, 8.0, 2.0);
        assert!(f > 0.0, "mass should flow from high (left) to low (right)");
    }

    #[test]
    fn diffusive_flux_uses_the_smaller_of_the_two_diffusivities() {
        let mixed = diffusive_mass_flux(0.0, 5.0, 5.0, 10.0, 8.0, 2.0);
        assert_eq!(mixed, 0.0, "a dry neighbour (nu=0) should block diffusion entirely");
    }

    #[test]
    fn shear_velocity_grows_with_discharge_and_friction() {
        let calm = shear_velocity(1.0, 0.001, 2.0);
        let rough = shear_velocity(1.0, 0.01, 2.0);
        let faster = shear_velocity(1.0, 0.001, 8.0);
        assert!(rough > calm);
        assert!(faster > calm);
    }

    #[test]
    fn outlet_flux_uses_the_upstream_concentration_regardless_of_q_sign() {
        assert_eq!(outlet_mass_flux(3.0, 4.0), 12.0);
    }

    #[test]
    fn boundary_transport_mass_injection_ignores_discharge() {
        let series = crate::boundary::TimeSeries::new(vec![(0.0, 7.0)]).unwrap();
        let bt = BoundaryTransport::MassInjection { series };
        assert_eq!(bt.mass_flux(0.0, 0.0, 99.0), 7.0);
    }

    #[test]
    fn boundary_transport_none_carries_no_mass() {
        assert_eq!(BoundaryTransport::None.mass_flux(0.0, 10.0, 5.0), 0.0);
    }
}
