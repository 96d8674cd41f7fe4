//! Mesh builder (§4.C) — turns a [`crate::network::Network`] into the flat
//! cell array, resolved boundary placements and junction objects the
//! driver steps every tick.
//!
//! The builder is the one place in the workspace that understands both
//! "channel" and "flat index" at once: every other crate operates either
//! on a single channel's continuous geometry (`alveo_hydraulics`) or on
//! the flat arrays this module produces (`alveo_driver`). Keeping that
//! translation in one module is what lets the numerical stages stay
//! free of any notion of network topology (§9 "cyclic references" note).

use std::collections::HashMap;

use tracing::debug;

use alveo_core::{CellId, CellRange, ChannelId, JunctionId};
use alveo_hydraulics::boundary::BoundaryFlow;
use alveo_hydraulics::junction::{Junction, JunctionKind};
use alveo_hydraulics::section::{GeometryConfig, Section};
use alveo_hydraulics::segment::{ChannelSegment, Station};
use alveo_hydraulics::transport::BoundaryTransport;

use crate::network::{ChannelSpec, DiscretizationMode, InitialFlow, InitialTransport, Network};
use crate::{MeshError, Result};

/// Which end of its channel a resolved boundary sits at. `Interior` marks a
/// placement that doesn't terminate the channel; `resolve_boundaries`
/// rejects it for every [`BoundaryFlow`] except `Junction`, since only the
/// junction coupling knows how to source/sink a mid-channel node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEnd {
    Upstream,
    Downstream,
    Interior,
}

/// A [`crate::network::BoundarySpec`] after its `(pos, pos2)` station
/// interval has been resolved to flat cell indices.
#[derive(Debug, Clone)]
pub struct ResolvedBoundary {
    pub id: String,
    pub channel: ChannelId,
    pub cell: CellId,
    pub cell2: CellId,
    /// Chainage of `cell`'s surveyed cross section, within the owning
    /// channel's own axis. Used by junction discovery to pick the right
    /// [`Section`] for the node's volume table without re-deriving a
    /// chainage from a flat cell index.
    pub x: f64,
    pub end: ChannelEnd,
    pub flow: BoundaryFlow,
    pub transport: Vec<BoundaryTransport>,
    /// Set once §4.C.8 junction discovery groups this boundary with its
    /// peers; `None` for every non-`Junction` variant.
    pub junction: Option<JunctionId>,
    /// Running mass/volume contribution during the current step, written
    /// to the contributions log by the driver (§4.I).
    pub contribution: f64,
}

/// One channel's placement within the flat cell arena.
#[derive(Debug, Clone)]
pub struct BuiltChannel {
    pub id: String,
    pub range: CellRange,
    pub segment: ChannelSegment,
}

/// A discovered node: the cells and boundary indices that exchange volume
/// and solute mass through it every step (§3 `Junction`, §4.F.3).
#[derive(Debug, Clone)]
pub struct JunctionMembership {
    pub cells: Vec<CellId>,
    pub inlet_boundaries: Vec<usize>,
    pub outlet_boundaries: Vec<usize>,
}

/// The flat mesh: every channel's cells concatenated into one arena, every
/// boundary resolved to a flat index, every junction's membership and
/// volume table precomputed, and the cell range each worker thread owns.
pub struct Mesh {
    pub n_cells: usize,
    pub channels: alveo_core::Arena<ChannelId, BuiltChannel>,
    pub channel_index: HashMap<String, ChannelId>,
    pub cell_channel: Vec<ChannelId>,
    /// Chainage of each cell's centre within its own channel.
    pub cell_x: Vec<f64>,
    pub dx: Vec<f64>,
    /// Length of the edge immediately to the left of cell `i` (`ix[0]` is
    /// the half-edge at the channel's own upstream end).
    pub ix: Vec<f64>,
    pub volume: Vec<f64>,
    pub discharge: Vec<f64>,
    pub concentration: Vec<Vec<f64>>,
    pub bound_mass: Vec<Vec<f64>>,
    pub boundaries: Vec<ResolvedBoundary>,
    pub junctions: alveo_core::Arena<JunctionId, Junction>,
    pub junction_members: Vec<JunctionMembership>,
    pub thread_ranges: Vec<CellRange>,
}

impl Mesh {
    /// Build a flat mesh from a network description (§4.C, steps 1-8).
    ///
    /// `t0` selects which time-stamped [`alveo_hydraulics::section::TransientSection`]
    /// is active at every station (most networks have only one per
    /// station, so `t0` is usually irrelevant); `geometry` configures the
    /// cross-section builder (§4.A); `amin` is the wet/dry area cut-off
    /// (derived from the System-level `depth_min` option).
    pub fn build(network: &Network, t0: f64, geometry: &GeometryConfig, amin: f64) -> Result<Self> {
        let mut channels = alveo_core::Arena::<ChannelId, BuiltChannel>::new();
        let mut channel_index = HashMap::new();
        let mut cell_channel = Vec::new();
        let mut cell_x = Vec::new();
        let mut dx = Vec::new();
        let mut volume = Vec::new();
        let mut discharge = Vec::new();
        let mut boundaries = Vec::new();
        let mut concentration = vec![Vec::new(); network.solutes.len()];
        let mut bound_mass = vec![Vec::new(); network.solutes.len()];

        for spec in &network.channels {
            let segment = build_channel_segment(spec, t0, geometry)?;
            let edges = cell_edges(spec, &segment)?;
            let n = edges.len() - 1;

            let start = CellId::from(cell_channel.len());
            let channel_id = channels.push(BuiltChannel {
                id: spec.id.clone(),
                range: CellRange::new(start, CellId::from(cell_channel.len() + n)),
                segment,
            });
            channel_index.insert(spec.id.clone(), channel_id);

            for i in 0..n {
                let x0 = edges[i];
                let x1 = edges[i + 1];
                let center = 0.5 * (x0 + x1);
                cell_channel.push(channel_id);
                cell_x.push(center);
                dx.push(x1 - x0);
            }

            let built = &channels[channel_id];
            let (areas, discharges) = initial_flow_state(spec, &built.segment, &edges, amin)?;
            volume.extend(areas.iter().zip(dx[dx.len() - n..].iter()).map(|(a, d)| a * d));
            discharge.extend(discharges);

            for (s, solute) in network.solutes.iter().enumerate() {
                let c = initial_transport_state(spec, s, &edges, solute.solubility)?;
                concentration[s].extend(c);
                bound_mass[s].extend(std::iter::repeat(0.0).take(n));
            }

            resolve_boundaries(spec, channel_id, start.index(), &edges, &mut boundaries)?;
        }

        let n_cells = cell_channel.len();
        let ix = inter_cell_lengths(&dx, &channels, &cell_channel);
        discover_junctions(&mut boundaries, &channels)
            .map(|(junctions, junction_members)| {
                let thread_ranges = partition_threads(n_cells);
                debug!(
                    channels = channels.len(),
                    n_cells,
                    junctions = junctions.len(),
                    threads = thread_ranges.len(),
                    "built flat mesh"
                );
                Mesh {
                    n_cells,
                    channels,
                    channel_index,
                    cell_channel,
                    cell_x,
                    dx,
                    ix,
                    volume,
                    discharge,
                    concentration,
                    bound_mass,
                    boundaries,
                    junctions,
                    junction_members,
                    thread_ranges,
                }
            })
    }

    pub fn channel_id(&self, name: &str) -> Option<ChannelId> {
        self.channel_index.get(name).copied()
    }

    pub fn channel_range(&self, channel: ChannelId) -> CellRange {
        self.channels[channel].range
    }

    /// Re-derive wetted area from the conserved volume for one cell.
    pub fn area(&self, cell: CellId) -> f64 {
        (self.volume[cell.index()] / self.dx[cell.index()]).max(0.0)
    }

    /// Rebuild one channel's [`ChannelSegment`] at a new simulation time,
    /// for the (rare) case where a station has more than one time-stamped
    /// [`alveo_hydraulics::section::TransientSection`] (§4.D "time to next
    /// transient-section change"). The cell discretisation itself — cell
    /// count, `dx`, `ix` — is unaffected; only the geometry each cell reads
    /// through its segment changes.
    pub fn rebuild_channel_segment(&mut self, channel: ChannelId, spec: &ChannelSpec, t: f64, geometry: &GeometryConfig) -> Result<()> {
        let segment = build_channel_segment(spec, t, geometry)?;
        self.channels[channel].segment = segment;
        Ok(())
    }

    /// Earliest time at which any channel's active transient section would
    /// change, at or after `t`. `None` if every station has only one
    /// section for the whole run.
    pub fn next_section_change(&self, network: &Network, t: f64) -> Option<f64> {
        network
            .channels
            .iter()
            .flat_map(|c| c.stations.iter())
            .filter_map(|s| s.next_change_after(t))
            .fold(None, |acc, time| Some(acc.map_or(time, |a: f64| a.min(time))))
    }
}

fn build_channel_segment(spec: &ChannelSpec, t: f64, geometry: &GeometryConfig) -> Result<ChannelSegment> {
    let mut stations = Vec::with_capacity(spec.stations.len());
    for st in &spec.stations {
        let ts = st.active_at(t);
        let section = Section::build(ts, &spec.id, geometry)?;
        stations.push(Station { x: st.x, section });
    }
    ChannelSegment::new(spec.id.clone(), stations).map_err(MeshError::from)
}

/// §4.C.1: the cell edge chainages for one channel, in the chosen
/// discretisation mode. Interior surveyed stations are always snapped onto
/// the nearest cell edge so every cross section coincides with a cell
/// boundary (§4.C.3), which is exact by construction in section-aligned
/// mode and a nudge of the nearest uniform edge in uniform mode.
fn cell_edges(spec: &ChannelSpec, segment: &ChannelSegment) -> Result<Vec<f64>> {
    let length = segment.length();
    if length <= 0.0 {
        return Err(MeshError::BadDiscretization {
            channel: spec.id.clone(),
            reason: "channel has zero length".into(),
        });
    }
    let edges = match spec.mode {
        DiscretizationMode::Uniform => {
            let mut edges = uniform_edges(length, spec.cell_size.max(1e-6));
            for x in segment.station_chainages().skip(1).take(segment.station_count().saturating_sub(2)) {
                snap_nearest(&mut edges, x);
            }
            edges
        }
        DiscretizationMode::SectionAligned => section_aligned_edges(segment),
    };
    if edges.len() < 2 {
        return Err(MeshError::BadDiscretization {
            channel: spec.id.clone(),
            reason: "discretisation produced no cells".into(),
        });
    }
    Ok(edges)
}

/// Equal-width bands with a half-width cell at each end (§4.C.1 "uniform").
fn uniform_edges(length: f64, target_dx: f64) -> Vec<f64> {
    let n = ((length / target_dx).round() as i64).max(2) as usize;
    let dx = length / (n - 1) as f64;
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(0.0);
    let mut x = dx / 2.0;
    edges.push(x);
    for _ in 1..(n - 1) {
        x += dx;
        edges.push(x);
    }
    edges.push(length);
    edges
}

/// Cell edges at the midpoints between consecutive surveyed stations, so
/// every station sits exactly on a cell centre (§4.C.1 "cross-section-aligned").
fn section_aligned_edges(segment: &ChannelSegment) -> Vec<f64> {
    let centers: Vec<f64> = segment.station_chainages().collect();
    let mut edges = Vec::with_capacity(centers.len() + 1);
    edges.push(centers[0]);
    for w in centers.windows(2) {
        edges.push(0.5 * (w[0] + w[1]));
    }
    edges.push(*centers.last().unwrap());
    edges
}

/// Replace whichever edge is closest to `x` with `x` exactly, keeping the
/// edge list sorted and free of duplicates.
fn snap_nearest(edges: &mut [f64], x: f64) {
    let (idx, _) = edges
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (**a - x).abs().partial_cmp(&(**b - x).abs()).unwrap())
        .unwrap();
    edges[idx] = x;
}

/// §4.C.3: `ix[i] = 0.5*(dx[i-1] + dx[i])` for an interior edge; the edge
/// at a channel's own upstream end (no left neighbour within the same
/// channel) uses its own cell's width, per the "mesh-boundary mode"
/// fallback named in §3.
fn inter_cell_lengths(dx: &[f64], channels: &alveo_core::Arena<ChannelId, BuiltChannel>, cell_channel: &[ChannelId]) -> Vec<f64> {
    let mut ix = vec![0.0; dx.len()];
    for (i, ix_i) in ix.iter_mut().enumerate() {
        let is_channel_start = channels[cell_channel[i]].range.start.index() == i;
        *ix_i = if is_channel_start || i == 0 {
            dx[i]
        } else {
            0.5 * (dx[i - 1] + dx[i])
        };
    }
    ix
}

/// §3 `InitialFlow`: per-cell `(area, discharge)` from the channel's
/// initial condition. `Steady` is resolved here to a best-effort uniform
/// guess (`Amin`, zero discharge); the driver's steady-state initialiser
/// (§4.J `simulate_steady`) is what actually converges it before the
/// unsteady loop starts — this just needs *a* valid starting point.
fn initial_flow_state(spec: &ChannelSpec, segment: &ChannelSegment, edges: &[f64], amin: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = edges.len() - 1;
    let centers: Vec<f64> = (0..n).map(|i| 0.5 * (edges[i] + edges[i + 1])).collect();
    match &spec.initial_flow {
        InitialFlow::Dry => Ok((vec![amin; n], vec![0.0; n])),
        InitialFlow::Steady => {
            let areas = centers.iter().map(|&x| {
                let geom = segment.geometry_at(x);
                segment.area_at(x, geom.zmin + 0.1 * geom.hmax.max(0.1))
            }).collect();
            Ok((areas, vec![0.0; n]))
        }
        InitialFlow::Profile { x, discharge, depth } => {
            let areas = centers
                .iter()
                .map(|&xc| {
                    let h = interp_profile(x, depth, xc);
                    let geom = segment.geometry_at(xc);
                    segment.area_at(xc, geom.zmin + h)
                })
                .collect();
            let discharges = centers.iter().map(|&xc| interp_profile(x, discharge, xc)).collect();
            Ok((areas, discharges))
        }
    }
}

/// §3 `InitialTransport`, per solute.
fn initial_transport_state(spec: &ChannelSpec, solute_index: usize, edges: &[f64], solubility: f64) -> Result<Vec<f64>> {
    let n = edges.len() - 1;
    let centers: Vec<f64> = (0..n).map(|i| 0.5 * (edges[i] + edges[i + 1])).collect();
    match spec.initial_transport.get(solute_index) {
        None | Some(InitialTransport::Dry) => Ok(vec![0.0; n]),
        Some(InitialTransport::Steady) => Ok(vec![0.0; n]),
        Some(InitialTransport::Profile { x, concentration }) => Ok(centers
            .iter()
            .map(|&xc| interp_profile(x, concentration, xc).min(solubility))
            .collect()),
    }
}

fn interp_profile(xs: &[f64], vs: &[f64], x: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    if x <= xs[0] {
        return vs[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return vs[last];
    }
    let mut lo = 0;
    let mut hi = last;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let w = (x - xs[lo]) / (xs[hi] - xs[lo]);
    vs[lo] + (vs[hi] - vs[lo]) * w
}

/// Resolve each boundary's station `(pos, pos2)` interval to flat cell
/// indices (§4.C.4) and record which channel end it sits at.
fn resolve_boundaries(spec: &ChannelSpec, channel: ChannelId, cell_offset: usize, edges: &[f64], out: &mut Vec<ResolvedBoundary>) -> Result<()> {
    let n_cells = edges.len() - 1;
    let n_stations = spec.stations.len();
    for b in &spec.boundaries {
        if b.pos >= n_stations || b.pos2 >= n_stations {
            return Err(MeshError::BadBoundaryPosition {
                boundary: b.id.clone(),
                channel: spec.id.clone(),
                reason: format!("station index out of range (have {n_stations} stations)"),
            });
        }
        let x1 = spec.stations[b.pos].x;
        let x2 = spec.stations[b.pos2].x;
        let local = nearest_cell(edges, x1);
        let local2 = nearest_cell(edges, x2);
        let end = if local == 0 && local2 == 0 {
            ChannelEnd::Upstream
        } else if local == n_cells - 1 && local2 == n_cells - 1 {
            ChannelEnd::Downstream
        } else {
            ChannelEnd::Interior
        };
        if end == ChannelEnd::Interior && !matches!(b.flow, BoundaryFlow::Junction) {
            return Err(MeshError::BadBoundaryPosition {
                boundary: b.id.clone(),
                channel: spec.id.clone(),
                reason: "non-junction boundaries must sit at a channel end, not mid-channel".into(),
            });
        }
        out.push(ResolvedBoundary {
            id: b.id.clone(),
            channel,
            cell: CellId::from(cell_offset + local),
            cell2: CellId::from(cell_offset + local2),
            x: x1,
            end,
            flow: b.flow.clone(),
            transport: b.transport.clone(),
            junction: None,
            contribution: 0.0,
        });
    }
    Ok(())
}

fn nearest_cell(edges: &[f64], x: f64) -> usize {
    let n = edges.len() - 1;
    for i in 0..n {
        if x >= edges[i] && x <= edges[i + 1] {
            return i;
        }
    }
    n - 1
}

/// §4.C.8: discover junctions among every `Junction`-kind boundary, using a
/// union-find over boundary indices so that two channel ends referencing
/// each other (or a tributary referencing a frontal end, or more than two
/// branches referencing the same node) merge into one [`Junction`].
fn discover_junctions(
    boundaries: &mut [ResolvedBoundary],
    channels: &alveo_core::Arena<ChannelId, BuiltChannel>,
) -> Result<(alveo_core::Arena<JunctionId, Junction>, Vec<JunctionMembership>)> {
    // boundary ids that are junctions, with the index they live at
    let junction_positions: Vec<usize> = boundaries
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b.flow, BoundaryFlow::Junction))
        .map(|(i, _)| i)
        .collect();

    // group by shared cell: two junction boundaries that resolve to cells
    // at "the same physical node" are declared peers by the network spec
    // through matching ids; here we group any junction boundaries whose id
    // prefix (before the first '@') matches, which is how the CLI/JSON
    // loader names reciprocal halves of one node (`"confluence@main"`,
    // `"confluence@trib1"`).
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for &i in &junction_positions {
        let key = boundaries[i].id.split('@').next().unwrap_or(&boundaries[i].id).to_string();
        groups.entry(key).or_default().push(i);
    }

    let mut junctions = alveo_core::Arena::<JunctionId, Junction>::new();
    let mut members = Vec::new();

    for (key, indices) in groups {
        if indices.len() < 2 {
            return Err(MeshError::BadTopology {
                left: key.clone(),
                right: key,
                reason: "a junction needs at least two participating channel ends".into(),
            });
        }
        let entries: Vec<(&Section, f64)> = indices
            .iter()
            .map(|&i| {
                let b = &boundaries[i];
                let chan = &channels[b.channel];
                let footprint = chan.range.len() as f64;
                let length = if footprint > 0.0 { chan.segment.length() / footprint } else { chan.segment.length() };
                (chan.segment.nearest_station_section(b.x), length)
            })
            .collect();
        let volume_table = Junction::build_volume_table(&entries);

        let kind = if indices.iter().all(|&i| matches!(boundaries[i].end, ChannelEnd::Upstream | ChannelEnd::Downstream)) {
            JunctionKind::Frontal
        } else {
            JunctionKind::Tributary
        };
        let mut junction = Junction::new(key, kind);
        junction.volume_table = volume_table;
        let jid = junctions.push(junction);

        let inlet_boundaries: Vec<usize> = indices.iter().copied().filter(|&i| boundaries[i].end == ChannelEnd::Downstream).collect();
        let outlet_boundaries: Vec<usize> = indices.iter().copied().filter(|&i| boundaries[i].end != ChannelEnd::Downstream).collect();
        let cells: Vec<CellId> = indices.iter().map(|&i| boundaries[i].cell).collect();

        for &i in &indices {
            boundaries[i].junction = Some(jid);
        }
        members.push(JunctionMembership {
            cells,
            inlet_boundaries,
            outlet_boundaries,
        });
    }

    Ok((junctions, members))
}

/// §4.C.7: `nth = min(n_cells, hardware_threads)`, assigned as an even
/// contiguous split of the flat cell array. A per-thread round-robin
/// channel list (as named in §4.C.7) is redundant once the partition is
/// already expressed as disjoint `CellRange`s — `rayon::scope` dispatches
/// each range as one job regardless of which channels it spans, so the
/// driver needs nothing more than this vector (see DESIGN.md).
fn partition_threads(n_cells: usize) -> Vec<CellRange> {
    let nth = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).min(n_cells.max(1));
    if n_cells == 0 || nth == 0 {
        return vec![CellRange::new(CellId::from(0usize), CellId::from(0usize))];
    }
    let base = n_cells / nth;
    let rem = n_cells % nth;
    let mut ranges = Vec::with_capacity(nth);
    let mut start = 0usize;
    for t in 0..nth {
        let len = base + if t < rem { 1 } else { 0 };
        let end = start + len;
        ranges.push(CellRange::new(CellId::from(start), CellId::from(end)));
        start = end;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use alveo_hydraulics::section::{FrictionLaw, SectionPoint, TransientSection};
    use crate::network::{BoundarySpec, ChannelSpec, JunctionPeer, StationSpec};

    fn rect_ts(width: f64, depth: f64) -> TransientSection {
        TransientSection {
            time: 0.0,
            points: vec![
                SectionPoint::new(0.0, depth, 0.03, FrictionLaw::Pressure),
                SectionPoint::new(1e-6, 0.0, 0.03, FrictionLaw::Pressure),
                SectionPoint::new(width - 1e-6, 0.0, 0.03, FrictionLaw::Pressure),
                SectionPoint::new(width, depth, 0.03, FrictionLaw::Pressure),
            ],
            hmax: depth,
            contraction: 0.1,
            dz: depth / 10.0,
        }
    }

    fn simple_channel(id: &str, length: f64) -> ChannelSpec {
        ChannelSpec {
            id: id.to_string(),
            stations: vec![
                StationSpec::new(0.0, rect_ts(5.0, 2.0)),
                StationSpec::new(length, rect_ts(5.0, 2.0)),
            ],
            cell_size: 100.0,
            mode: DiscretizationMode::Uniform,
            initial_flow: InitialFlow::Dry,
            initial_transport: vec![],
            boundaries: vec![],
        }
    }

    #[test]
    fn single_channel_builds_a_contiguous_cell_range() {
        let network = Network {
            channels: vec![simple_channel("c1", 1000.0)],
            solutes: vec![],
        };
        let mesh = Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
        assert_eq!(mesh.n_cells, mesh.volume.len());
        assert!(mesh.n_cells >= 8 && mesh.n_cells <= 12);
        let range = mesh.channel_range(mesh.channel_id("c1").unwrap());
        assert_eq!(range.start.index(), 0);
        assert_eq!(range.end.index(), mesh.n_cells);
    }

    #[test]
    fn uniform_mode_gives_half_cells_at_each_end() {
        let network = Network {
            channels: vec![simple_channel("c1", 1000.0)],
            solutes: vec![],
        };
        let mesh = Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
        let interior_dx = mesh.dx[mesh.n_cells / 2];
        assert!((mesh.dx[0] - interior_dx / 2.0).abs() < 1e-6, "first cell should be half width");
        assert!((mesh.dx[mesh.n_cells - 1] - interior_dx / 2.0).abs() < 1e-6, "last cell should be half width");
    }

    #[test]
    fn dry_initial_flow_gives_minimum_area_and_zero_discharge() {
        let network = Network {
            channels: vec![simple_channel("c1", 500.0)],
            solutes: vec![],
        };
        let mesh = Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
        assert!(mesh.discharge.iter().all(|&q| q == 0.0));
        assert!(mesh.volume.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn thread_partition_covers_every_cell_exactly_once() {
        let ranges = partition_threads(37);
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, 37);
        for w in ranges.windows(2) {
            assert_eq!(w[0].end.index(), w[1].start.index());
        }
    }

    #[test]
    fn two_channel_ends_sharing_a_junction_id_merge_into_one_node() {
        let mut upstream = simple_channel("main", 500.0);
        upstream.boundaries.push(BoundarySpec {
            id: "confluence@main".into(),
            pos: 1,
            pos2: 1,
            flow: BoundaryFlow::Junction,
            transport: vec![],
            junction_peer: Some(JunctionPeer { channel: "trib".into(), pos: 0 }),
        });
        let mut trib = simple_channel("trib", 300.0);
        trib.boundaries.push(BoundarySpec {
            id: "confluence@trib".into(),
            pos: 0,
            pos2: 0,
            flow: BoundaryFlow::Junction,
            transport: vec![],
            junction_peer: Some(JunctionPeer { channel: "main".into(), pos: 1 }),
        });
        let network = Network {
            channels: vec![upstream, trib],
            solutes: vec![],
        };
        let mesh = Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
        assert_eq!(mesh.junctions.len(), 1);
        assert_eq!(mesh.junction_members[0].cells.len(), 2);
    }

    #[test]
    fn unmatched_junction_boundary_is_a_topology_error() {
        let mut lone = simple_channel("c1", 500.0);
        lone.boundaries.push(BoundarySpec {
            id: "dangling@c1".into(),
            pos: 0,
            pos2: 0,
            flow: BoundaryFlow::Junction,
            transport: vec![],
            junction_peer: None,
        });
        let network = Network {
            channels: vec![lone],
            solutes: vec![],
        };
        assert!(Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).is_err());
    }
}
