//! Network topology input (§3 `System`, `ChannelGeometry`, `InitialFlow`/
//! `InitialTransport`, `BoundaryFlow` placement) — the user-authored,
//! serializable description [`crate::builder::Mesh::build`] consumes.
//!
//! Nothing in this module does any numerics: it is pure data, the same
//! separation of "what the user authored" from "what the solver computed"
//! a project-file format always needs. `alveo_hydraulics` owns the actual
//! geometry/flux/transport math; this module only owns the shape of a
//! network and where its boundary conditions sit.

use serde::{Deserialize, Serialize};

use alveo_hydraulics::boundary::BoundaryFlow;
use alveo_hydraulics::section::TransientSection;
use alveo_hydraulics::transport::{BoundaryTransport, Solute};

/// How a channel's axis is cut into cells (§4.C.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscretizationMode {
    /// Equal-width bands, with a half-width cell at each channel end so
    /// the end cross sections still sit on a cell boundary.
    Uniform,
    /// Cross sections lie exactly on cell centres; cell edges fall at the
    /// midpoint between consecutive surveyed stations.
    SectionAligned,
}

/// A surveyed station along a channel axis: its chainage and the
/// time-ordered sequence of [`TransientSection`]s active there. Most
/// stations have exactly one (time-invariant geometry); a station with
/// more than one models a gate leaf, a sediment deposit schedule, or any
/// other programmed bed change (§3 `CrossSection`: "a sequence of
/// TransientSections ordered by time").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSpec {
    pub x: f64,
    pub sections: Vec<TransientSection>,
}

impl StationSpec {
    pub fn new(x: f64, section: TransientSection) -> Self {
        Self {
            x,
            sections: vec![section],
        }
    }

    /// The section active at time `t`: the last one whose `time <= t`,
    /// falling back to the first if `t` precedes every entry.
    pub fn active_at(&self, t: f64) -> &TransientSection {
        self.sections
            .iter()
            .rev()
            .find(|s| s.time <= t)
            .unwrap_or(&self.sections[0])
    }

    /// The next time, strictly after `t`, at which this station's active
    /// section changes. `None` if no further change is scheduled.
    pub fn next_change_after(&self, t: f64) -> Option<f64> {
        self.sections.iter().map(|s| s.time).find(|&time| time > t)
    }
}

/// Initial flow condition for a channel (§3 `InitialFlow`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InitialFlow {
    /// No water: `A = Amin`, `Q = 0`.
    Dry,
    /// Run the steady-state initialiser (§4.J `simulate_steady`) before the
    /// unsteady time loop starts.
    Steady,
    /// Prescribe area/discharge directly from a tabulated longitudinal
    /// profile, linearly interpolated in chainage.
    Profile {
        x: Vec<f64>,
        discharge: Vec<f64>,
        depth: Vec<f64>,
    },
}

/// Initial transport condition for one solute on a channel (§3
/// `InitialTransport`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InitialTransport {
    Dry,
    Steady,
    Profile { x: Vec<f64>, concentration: Vec<f64> },
}

/// A reference to another channel's end or interior cross section, used to
/// resolve `Junction`-kind boundaries into a shared node (§4.C.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JunctionPeer {
    pub channel: String,
    pub pos: usize,
}

/// A named boundary condition applied to the cross-section interval
/// `[pos, pos2]` of one channel (§3 `BoundaryFlow`). `pos`/`pos2` index
/// into the channel's stations, not yet into the flat mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySpec {
    pub id: String,
    pub pos: usize,
    pub pos2: usize,
    pub flow: BoundaryFlow,
    /// Per-solute boundary transport rule, same length/order as
    /// [`Network::solutes`]. Empty if this boundary carries no solutes
    /// (e.g. a pure `Supercritical` outlet with `nt == 0`).
    #[serde(default)]
    pub transport: Vec<BoundaryTransport>,
    /// Present only when `flow` is [`BoundaryFlow::Junction`]: the other
    /// end this boundary links to. Two `Junction` boundaries referencing
    /// each other resolve to one shared node at mesh-build time.
    #[serde(default)]
    pub junction_peer: Option<JunctionPeer>,
}

/// One open channel: its surveyed geometry, discretisation target, initial
/// conditions and boundary placements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub stations: Vec<StationSpec>,
    pub cell_size: f64,
    #[serde(default = "default_mode")]
    pub mode: DiscretizationMode,
    pub initial_flow: InitialFlow,
    #[serde(default)]
    pub initial_transport: Vec<InitialTransport>,
    #[serde(default)]
    pub boundaries: Vec<BoundarySpec>,
}

fn default_mode() -> DiscretizationMode {
    DiscretizationMode::Uniform
}

impl ChannelSpec {
    pub fn length(&self) -> f64 {
        let first = self.stations.first().map(|s| s.x).unwrap_or(0.0);
        let last = self.stations.last().map(|s| s.x).unwrap_or(0.0);
        last - first
    }
}

/// The flat universe (§3 `System`): every channel and every solute tracked
/// by the transport stage. Numeric tunables (CFL, `theta`, steady
/// tolerance, ...) are *not* part of this type — they live in
/// `alveo_driver::config::SystemConfig`, since they configure the solver
/// rather than describe the physical network (see SPEC_FULL §4.L).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Network {
    pub channels: Vec<ChannelSpec>,
    #[serde(default)]
    pub solutes: Vec<Solute>,
}

impl Network {
    pub fn channel(&self, id: &str) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.id == id)
    }
}
