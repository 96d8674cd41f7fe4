//! Junction coupling (§3 `Junction`, §4.F.3) — conservative redistribution
//! of volume and solute mass among the channel-ends meeting at a node.
//!
//! A [`Junction`] itself holds no cell storage: the mesh builder discovers
//! which cells participate (frontal channel ends or lateral/tributary taps)
//! and owns that bookkeeping, since a junction's membership is a network
//! topology fact that belongs with the mesh, not the numerics. What this
//! module owns is the one genuinely reusable piece of numerics: the
//! monotone `(z, V, A, dA/dz)` volume table and its inversion, which is
//! exactly as local a concern as a `Section`'s own `level_at` and is built
//! the same way (binary search then a local quadratic solve).

use serde::{Deserialize, Serialize};

use crate::section::Section;

/// One row of the volume-vs-level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTableRow {
    pub z: f64,
    pub volume: f64,
    pub area: f64,
    pub d_area_z: f64,
}

/// Whether a channel end participates in a junction head-on (the channel
/// terminates at the node) or as a mid-channel side tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    Frontal,
    Tributary,
}

/// A node at which one or more channels meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    pub id: String,
    pub kind: JunctionKind,
    /// Orientation of each arriving/leaving branch (radians), in the same
    /// order as the mesh builder's per-branch cell list.
    pub angle: Vec<f64>,
    pub volume_table: Vec<VolumeTableRow>,
}

impl Junction {
    pub fn new(id: impl Into<String>, kind: JunctionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            angle: Vec::new(),
            volume_table: Vec::new(),
        }
    }

    /// Build the monotone volume table for this node by merging the
    /// elevation breakpoints of every participating section (§4.C.8: "a
    /// coordinated sweep through all participating sections, advancing the
    /// pointer with the smallest current z at each step"). Each entry is a
    /// `(section, footprint_length)` pair — the cell length contributed by
    /// that branch to the node's storage.
    ///
    /// Implemented as a global sort of the union of breakpoints rather than
    /// a literal multi-pointer walk: the two give the same monotone table,
    /// and a single sort is simpler to get right than a k-way merge for the
    /// handful of branches (rarely more than four) a junction actually has.
    pub fn build_volume_table(entries: &[(&Section, f64)]) -> Vec<VolumeTableRow> {
        if entries.is_empty() {
            return Vec::new();
        }
        let mut breaks: Vec<f64> = entries
            .iter()
            .flat_map(|(s, _)| s.sp.iter().map(|row| row.z))
            .collect();
        breaks.sort_by(|a, b| a.partial_cmp(b).unwrap());
        breaks.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

        let mut table = Vec::with_capacity(breaks.len());
        for &z in &breaks {
            let mut volume = 0.0;
            let mut area = 0.0;
            for (section, length) in entries {
                let a = section.area_at(z);
                volume += a * length;
                area += section.width_at(z) * length;
            }
            table.push(VolumeTableRow {
                z,
                volume,
                area,
                d_area_z: 0.0,
            });
        }
        for i in 0..table.len().saturating_sub(1) {
            let dz = table[i + 1].z - table[i].z;
            if dz > 1e-12 {
                table[i].d_area_z = (table[i + 1].area - table[i].area) / dz;
            }
        }
        if let Some(last) = table.len().checked_sub(2) {
            table[last + 1].d_area_z = table[last].d_area_z;
        }
        table
    }

    /// Invert total node volume to a free-surface elevation: binary search
    /// the bracketing row, then a local quadratic solve using that row's
    /// area and `dA/dz` (the same scheme as [`Section::level_at`]).
    pub fn level_for_volume(&self, volume: f64) -> f64 {
        let table = &self.volume_table;
        if table.is_empty() {
            return 0.0;
        }
        let volume = volume.clamp(table[0].volume, table[table.len() - 1].volume);
        let mut lo = 0usize;
        let mut hi = table.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if table[mid].volume <= volume {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let row = &table[lo];
        let next = &table[hi];
        let span = next.z - row.z;
        let target = volume - row.volume;
        if span <= 0.0 || row.area.abs() < 1e-12 && row.d_area_z.abs() < 1e-12 {
            return row.z;
        }
        if row.d_area_z.abs() < 1e-12 {
            let slope = if row.area.abs() > 1e-12 { row.area } else { 1e-9 };
            return (row.z + target / slope).clamp(row.z, next.z);
        }
        let disc = (row.area * row.area + 2.0 * row.d_area_z * target).max(0.0);
        let dh = (-row.area + disc.sqrt()) / row.d_area_z;
        row.z + dh.clamp(0.0, span)
    }
}

/// Mass-weighted node-average concentration for one solute, given each
/// participating cell's volume and concentration (§4.F.3: "every solute to
/// the mass-weighted node-average concentration").
pub fn mixed_concentration(volumes: &[f64], concentrations: &[f64]) -> f64 {
    let total_mass: f64 = volumes.iter().zip(concentrations).map(|(v, c)| v * c).sum();
    let total_volume: f64 = volumes.iter().sum();
    if total_volume > 1e-12 {
        total_mass / total_volume
    } else {
        0.0
    }
}
