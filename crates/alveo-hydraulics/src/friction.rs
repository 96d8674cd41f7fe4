//! Composite friction laws used to collapse a mixed-roughness, possibly
//! compound cross section into a single equivalent Manning coefficient and
//! Boussinesq momentum coefficient, on the regular elevation grid of the
//! `FP` table (§4.A.3).
//!
//! Two wall-level laws are supported, selected per [`crate::section::SectionPoint`]:
//!
//! - [`FrictionLaw::Pressure`](crate::section::FrictionLaw::Pressure): a
//!   Manning power-law velocity profile, the ordinary case for an alluvial
//!   or lined bed.
//! - [`FrictionLaw::Logarithmic`](crate::section::FrictionLaw::Logarithmic):
//!   a Keulegan logarithmic profile for a fully-rough turbulent boundary,
//!   converted to an equivalent Manning `n` via the Manning-Chezy relation
//!   so it can be combined with `Pressure` zones on equal footing.
//!
//! The zones are combined with Lotter's equivalent-roughness formula and
//! Chow's conveyance-cubed Boussinesq coefficient, the same divided-channel
//! approach used for compound-section resistance throughout open-channel
//! hydraulics. This crate's own cross-section builder (`section.rs`) is the
//! only caller; the function is split out here so the two roughness laws
//! and their combination rule can be tested independently of the polygon
//! sweep that produces the zones.

use alveo_core::{G, KAPPA};

/// A single wetted sub-zone contributing to the composite friction at one
/// elevation: its own area, wetted perimeter and conveyance.
#[derive(Debug, Clone, Copy)]
pub struct FrictionZone {
    pub area: f64,
    pub perimeter: f64,
    /// Equivalent Manning `n` for this zone (already converted from the
    /// logarithmic law if that is what the wall uses).
    pub n_eff: f64,
}

impl FrictionZone {
    pub fn hydraulic_radius(&self) -> f64 {
        if self.perimeter > 0.0 {
            self.area / self.perimeter
        } else {
            0.0
        }
    }

    pub fn conveyance(&self) -> f64 {
        (1.0 / self.n_eff) * self.area * self.hydraulic_radius().powf(2.0 / 3.0)
    }
}

/// Equivalent Manning `n` for a logarithmic (Keulegan) wall, via the
/// Manning-Chezy relation `n = R^(1/6) / C`.
pub fn log_law_equivalent_n(hydraulic_radius: f64, sand_roughness: f64, granulometric_coefficient: f64) -> f64 {
    let r_h = hydraulic_radius.max(1e-9);
    let ks = sand_roughness.max(1e-6);
    let arg = (granulometric_coefficient * r_h / ks).max(1.000_1);
    let chezy = (8.0 * G).sqrt() * arg.ln() / KAPPA;
    r_h.powf(1.0 / 6.0) / chezy.max(1e-6)
}

/// Semi-implicit friction integrator (§4.G): advance discharge one step
/// under the quadratic Manning sink alone, holding area fixed.
///
/// The friction ODE for the step is `dQ/dt = -K |Q| Q`. A fully implicit
/// treatment would need the sign of `Q` at the unknown new time; instead
/// this uses the same Crank-Nicolson-like linearisation as the source this
/// solver's numerics are grounded on: freeze `|Q|` at the predictor value
/// `q_pred` and solve the resulting *linear* equation in `Q_new`,
///
/// ```text
/// Q_new = Q_pred / (1 + theta * dt * K * |Q_pred|)
/// ```
///
/// which is the closed-form root of the implicit quadratic once `|Q|` is
/// held fixed at the explicit predictor. `theta` is the implicit weighting
/// (`0` = fully explicit, `1` = fully implicit); the System-level default
/// is `0.5`.
pub fn semi_implicit_discharge(q_pred: f64, k: f64, theta: f64, dt: f64) -> f64 {
    if k <= 0.0 || !k.is_finite() {
        return q_pred;
    }
    let denom = 1.0 + theta * dt * k * q_pred.abs();
    q_pred / denom
}

/// Combine zones into a single equivalent roughness (Lotter's formula) and
/// Boussinesq coefficient (Chow's conveyance-cubed sum), clamped to
/// physical bounds (`beta >= 1`).
pub fn combine(zones: &[FrictionZone]) -> (f64, f64) {
    if zones.is_empty() {
        return (0.03, 1.0);
    }
    let total_perimeter: f64 = zones.iter().map(|z| z.perimeter).sum();
    if total_perimeter <= 0.0 {
        return (zones[0].n_eff, 1.0);
    }

    let sum_p_over_n15: f64 = zones.iter().map(|z| z.perimeter / z.n_eff.powf(1.5)).sum();
    let n_eq = if sum_p_over_n15 > 0.0 {
        (total_perimeter / sum_p_over_n15).powf(2.0 / 3.0)
    } else {
        zones[0].n_eff
    };

    let total_area: f64 = zones.iter().map(|z| z.area).sum();
    let conveyances: Vec<f64> = zones.iter().map(|z| z.conveyance()).collect();
    let total_k: f64 = conveyances.iter().sum();

    let beta = if total_area > 0.0 && total_k > 0.0 {
        let sum_k2_a: f64 = zones
            .iter()
            .zip(&conveyances)
            .filter(|(z, _)| z.area > 0.0)
            .map(|(z, k)| k.powi(2) / z.area)
            .sum();
        (sum_k2_a * total_area / total_k.powi(2)).max(1.0)
    } else {
        1.0
    };

    (n_eq, beta)
}
