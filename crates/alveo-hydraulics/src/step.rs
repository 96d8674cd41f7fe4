//! Step integrator (§4.F) — applies the decomposition stage's `(iA, iQ)`
//! increments to the conserved volume, runs the channel-level dry
//! redistribution walk, solves each junction's node level, and finishes
//! with the semi-implicit friction update (§4.G).
//!
//! Every function here is a pure transform over plain slices rather than
//! over a `Cell` type: the flat cell arena, the channel partitioning and
//! the junction membership are all mesh-building concerns owned by
//! `alveo-mesh`, which calls into this module per stage. Keeping the
//! numerics free of that bookkeeping is what lets each piece be tested in
//! isolation here.

use crate::friction::semi_implicit_discharge;

/// §4.F.1: apply the accumulated area increment to the conserved volume.
/// Returns the updated volume and whether it went negative (candidate for
/// the dry-redistribution walk).
pub fn apply_volume_increment(volume: f64, i_area: f64) -> (f64, bool) {
    let updated = volume + i_area;
    (updated, updated < 0.0)
}

/// §4.F.2: channel-level dry correction. Scans the channel's cells
/// left-to-right; whenever a negative volume is found, donates from the
/// wetter of its two immediate neighbours until the deficit is absorbed.
/// `volumes` must be exactly one channel's contiguous cell range — the
/// walk never crosses a junction, per the no-propagation-across-junction
/// rule.
///
/// Returns the volume that could not be recovered because both neighbours
/// were themselves dry. §9 Open Question 3 notes that the source this
/// solver's numerics are grounded on does not attempt a global solve in
/// this case — it leaves the cell at zero and loses the deficit. That
/// lossy behaviour is kept here rather than "fixed", so the loss is
/// returned for callers (and the mass-conservation property test) to
/// observe rather than silently hidden.
pub fn redistribute_dry(volumes: &mut [f64]) -> f64 {
    let mut lost = 0.0;
    for i in 0..volumes.len() {
        if volumes[i] >= 0.0 {
            continue;
        }
        let deficit = -volumes[i];
        volumes[i] = 0.0;

        let left = i.checked_sub(1);
        let right = if i + 1 < volumes.len() { Some(i + 1) } else { None };
        let donor = match (left, right) {
            (Some(l), Some(r)) => Some(if volumes[l] >= volumes[r] { l } else { r }),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        };

        match donor {
            Some(donor) => {
                let available = volumes[donor].max(0.0);
                let take = available.min(deficit);
                volumes[donor] -= take;
                let remaining = deficit - take;
                if remaining > 0.0 {
                    lost += remaining;
                }
            }
            None => lost += deficit,
        }
    }
    lost
}

/// §4.F.3: total wetted volume available to a junction's node this step,
/// clipped at zero. `cell_volumes` are the participating cells' current
/// volumes, `inlet_q`/`outlet_q` their boundary discharges; the caller
/// inverts the result through [`crate::junction::Junction::level_for_volume`]
/// to get the node's free-surface elevation.
pub fn junction_total_volume(cell_volumes: &[f64], inlet_q: &[f64], outlet_q: &[f64], dt: f64) -> f64 {
    let base: f64 = cell_volumes.iter().sum();
    let net_inflow: f64 = inlet_q.iter().sum::<f64>() - outlet_q.iter().sum::<f64>();
    (base + dt * net_inflow).max(0.0)
}

/// §4.G: semi-implicit friction update for one cell. Dry cells are pinned
/// to zero discharge rather than evaluated (the friction coefficient is
/// undefined / infinite as area vanishes).
pub fn apply_friction(discharge: f64, friction_coefficient: f64, theta: f64, dt: f64, dry: bool) -> f64 {
    if dry {
        0.0
    } else {
        semi_implicit_discharge(discharge, friction_coefficient, theta, dt)
    }
}
