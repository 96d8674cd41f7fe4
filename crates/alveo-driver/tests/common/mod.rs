#![allow(dead_code)]
//! Shared network-building helpers for the driver's integration tests.
//! Extends the rectangular-fixture convention used by `alveo_mesh::builder`'s
//! and `alveo_hydraulics::section`'s own unit tests with a couple of
//! end-to-end scenario builders (sloped bed, terminal boundaries, a tributary
//! junction) so each scenario file only has to describe what's different
//! about it.

use alveo_driver::{NullObserver, OutputWriters, SimulationReport, SolverState, SystemConfig};
use alveo_hydraulics::boundary::{BoundaryFlow, TimeSeries};
use alveo_hydraulics::scheme::SchemeConfig;
use alveo_hydraulics::section::{FrictionLaw, GeometryConfig, SectionPoint, TransientSection};
use alveo_hydraulics::transport::Solute;
use alveo_mesh::network::{
    BoundarySpec, ChannelSpec, DiscretizationMode, InitialFlow, InitialTransport, JunctionPeer, Network, StationSpec,
};

/// A rectangular channel cross section `width` metres wide, `depth` metres
/// deep, with bed invert at `bed_z` (m). Mirrors the four-point-polygon
/// fixture every hydraulics/mesh unit test module builds, just with the bed
/// elevation pulled out as a parameter so a channel can be given a slope by
/// varying it station to station.
pub fn rect_ts(width: f64, depth: f64, bed_z: f64, n: f64) -> TransientSection {
    TransientSection {
        time: 0.0,
        points: vec![
            SectionPoint::new(0.0, bed_z + depth, n, FrictionLaw::Pressure),
            SectionPoint::new(0.0 + 1e-6, bed_z, n, FrictionLaw::Pressure),
            SectionPoint::new(width - 1e-6, bed_z, n, FrictionLaw::Pressure),
            SectionPoint::new(width, bed_z + depth, n, FrictionLaw::Pressure),
        ],
        hmax: depth,
        contraction: 0.1,
        dz: depth / 20.0,
    }
}

/// A single-reach channel with two stations (flat bed at `bed_z`), no
/// boundaries, dry by default. Callers push boundaries/initial conditions
/// onto the returned spec.
pub fn flat_channel(id: &str, length: f64, cell_size: f64, width: f64, depth: f64, bed_z: f64, n: f64) -> ChannelSpec {
    ChannelSpec {
        id: id.to_string(),
        stations: vec![
            StationSpec::new(0.0, rect_ts(width, depth, bed_z, n)),
            StationSpec::new(length, rect_ts(width, depth, bed_z, n)),
        ],
        cell_size,
        mode: DiscretizationMode::Uniform,
        initial_flow: InitialFlow::Dry,
        initial_transport: vec![],
        boundaries: vec![],
    }
}

/// A channel whose bed drops linearly from `bed_z0` (upstream) to `bed_z1`
/// (downstream) over its length, otherwise identical to [`flat_channel`].
pub fn sloped_channel(
    id: &str,
    length: f64,
    cell_size: f64,
    width: f64,
    depth: f64,
    bed_z0: f64,
    bed_z1: f64,
    n: f64,
) -> ChannelSpec {
    ChannelSpec {
        id: id.to_string(),
        stations: vec![
            StationSpec::new(0.0, rect_ts(width, depth, bed_z0, n)),
            StationSpec::new(length, rect_ts(width, depth, bed_z1, n)),
        ],
        cell_size,
        mode: DiscretizationMode::Uniform,
        initial_flow: InitialFlow::Dry,
        initial_transport: vec![],
        boundaries: vec![],
    }
}

/// Attach a constant-discharge boundary to a channel's upstream end
/// (first station).
pub fn upstream_q(mut channel: ChannelSpec, id: &str, discharge: f64) -> ChannelSpec {
    channel.boundaries.push(BoundarySpec {
        id: id.to_string(),
        pos: 0,
        pos2: 0,
        flow: BoundaryFlow::Q { discharge },
        transport: vec![],
        junction_peer: None,
    });
    channel
}

/// Attach a discharge-time-series boundary to a channel's upstream end.
pub fn upstream_qt(mut channel: ChannelSpec, id: &str, points: Vec<(f64, f64)>) -> ChannelSpec {
    let series = TimeSeries::new(points).expect("monotone time series");
    channel.boundaries.push(BoundarySpec {
        id: id.to_string(),
        pos: 0,
        pos2: 0,
        flow: BoundaryFlow::QT { series },
        transport: vec![],
        junction_peer: None,
    });
    channel
}

/// Attach a constant-level boundary to a channel's downstream end
/// (last station).
pub fn downstream_h(mut channel: ChannelSpec, id: &str, level: f64) -> ChannelSpec {
    let last = channel.stations.len() - 1;
    channel.boundaries.push(BoundarySpec {
        id: id.to_string(),
        pos: last,
        pos2: last,
        flow: BoundaryFlow::H { level },
        transport: vec![],
        junction_peer: None,
    });
    channel
}

/// Push one half of a junction node onto `channel`: its station `pos`
/// joins `peer_channel`'s station `peer_pos`. Call once per participating
/// channel end with the same `node` name to build a node with any number
/// of branches (two for a confluence, three or more for a tributary).
pub fn add_junction_end(mut channel: ChannelSpec, node: &str, pos: usize, peer_channel: &str, peer_pos: usize) -> ChannelSpec {
    channel.boundaries.push(BoundarySpec {
        id: format!("{node}@{}", channel.id),
        pos,
        pos2: pos,
        flow: BoundaryFlow::Junction,
        transport: vec![],
        junction_peer: Some(JunctionPeer {
            channel: peer_channel.to_string(),
            pos: peer_pos,
        }),
    });
    channel
}

/// Link two channels' ends into one shared junction node, named `node`:
/// `a`'s last station joins `b`'s station `b_pos` (0 = upstream, last =
/// downstream). The two halves are named `"{node}@{a.id}"` /
/// `"{node}@{b.id}"`, the prefix-before-`@` convention junction discovery
/// groups by.
pub fn join_at_junction(mut a: ChannelSpec, mut b: ChannelSpec, node: &str, b_pos: usize) -> (ChannelSpec, ChannelSpec) {
    let a_pos = a.stations.len() - 1;
    a.boundaries.push(BoundarySpec {
        id: format!("{node}@{}", a.id),
        pos: a_pos,
        pos2: a_pos,
        flow: BoundaryFlow::Junction,
        transport: vec![],
        junction_peer: Some(JunctionPeer { channel: b.id.clone(), pos: b_pos }),
    });
    b.boundaries.push(BoundarySpec {
        id: format!("{node}@{}", b.id),
        pos: b_pos,
        pos2: b_pos,
        flow: BoundaryFlow::Junction,
        transport: vec![],
        junction_peer: Some(JunctionPeer { channel: a.id.clone(), pos: a_pos }),
    });
    (a, b)
}

pub fn solute(name: &str, solubility: f64, diffusivity: f64) -> Solute {
    Solute {
        name: name.to_string(),
        solubility,
        diffusivity,
    }
}

/// A minimal [`SystemConfig`] writing its solution file into a fresh temp
/// directory that outlives the returned handle (the caller keeps it alive
/// for the duration of the test so the file isn't cleaned up mid-run).
pub fn temp_config(final_time: f64) -> (SystemConfig, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("solution.bin");
    (SystemConfig::new(final_time, path.to_string_lossy().into_owned()), dir)
}

/// Build a [`SolverState`] with the default numerical scheme, drive it to
/// `config.final_time` against a `NullObserver`, and return the finished
/// state, run report and the temp directory its output was written into
/// (kept alive for the caller in case a test wants to read a diagnostic
/// file back).
pub fn run_to_completion(network: Network, config: SystemConfig) -> (SolverState, SimulationReport, tempfile::TempDir) {
    run_with_scheme(network, config, SchemeConfig::default())
}

pub fn run_with_scheme(network: Network, config: SystemConfig, scheme: SchemeConfig) -> (SolverState, SimulationReport, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = config;
    config.solution_file = dir.path().join("solution.bin").to_string_lossy().into_owned();
    let mut state = SolverState::new(network, config, scheme).expect("mesh builds");
    let mut writers = OutputWriters::create(&state.config, state.mesh.n_cells).expect("writers open");
    let mut observer = NullObserver;
    let report = state.simulate(&mut observer, &mut writers).expect("simulation runs");
    (state, report, dir)
}
