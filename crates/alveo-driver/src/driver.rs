//! The explicit time-stepping pipeline (§4.J) and the shared-scalar
//! concurrency model that parallelises it across `mesh.thread_ranges` (§5).
//!
//! Every per-cell and per-edge stage is a pure function living in
//! `alveo_hydraulics`. This module's only job is orchestration: rebuild
//! reconstructed state, decompose edges, apply the conservative update,
//! solve junctions, integrate friction, advect solute, in the order §4.J
//! lays out, dispatching the per-cell stages across worker partitions via
//! a `rayon::scope` the same way a multi-threaded finite-volume solver's
//! step loop fans work out across a thread pool.

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use alveo_core::{CellId, ChannelId, JunctionId};
use alveo_hydraulics::boundary::BoundaryFlow;
use alveo_hydraulics::decomposition::decompose_edge;
use alveo_hydraulics::junction::mixed_concentration;
use alveo_hydraulics::parameters::Parameters;
use alveo_hydraulics::scheme::{DiffusionMode, SchemeConfig};
use alveo_hydraulics::step::{apply_friction, apply_volume_increment, junction_total_volume, redistribute_dry};
use alveo_hydraulics::transport::{apply_saturation, diffusive_mass_flux, shear_velocity, tvd_mass_flux_correction, upwind_mass_flux, BoundaryTransport};
use alveo_mesh::builder::ChannelEnd;
use alveo_mesh::network::Network;
use alveo_mesh::Mesh;

use crate::config::SystemConfig;
use crate::error::{Result, StepWarning};

/// Fraction of the friction-rate bound `1/(K|Q|)` actually used as a time
/// step cap (§4.D "friction time step"); the bare reciprocal is the point
/// at which the semi-implicit integrator's linearisation breaks down, not
/// a safe step.
const FRICTION_CFL: f64 = 0.5;

/// Hook the caller implements to observe progress and request a clean
/// stop: a progress-callback/cancellation-token pair, without pulling in
/// a channel or async runtime for what is, here, a plain synchronous
/// loop.
pub trait SimulationObserver {
    /// Called once per outer snapshot interval with the pseudo-time error
    /// during `simulate_steady`, and with `None` once the unsteady loop is
    /// running.
    fn on_progress(&mut self, _t: f64, _steady_error: Option<f64>) {}

    /// Polled between snapshot intervals; returning `true` ends the run
    /// after the next snapshot is written rather than aborting mid-step.
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// An observer that never stops and ignores progress, for callers that
/// don't need either hook.
#[derive(Debug, Default)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {}

/// Outcome of a completed (or cleanly stopped) `simulate` call.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub steps: u64,
    pub final_time: f64,
    pub channel_overflow: bool,
    pub warnings: Vec<StepWarning>,
    /// Wall-clock time `simulate` started, RFC3339, for run-metadata
    /// logging alongside the solution file.
    pub started_at: String,
}

/// RFC3339 wall-clock timestamp.
fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// The full mutable state of one simulation run: the built mesh, the
/// network it was built from (kept for boundary/geometry lookups the flat
/// mesh doesn't itself own), the run configuration, the numerical scheme,
/// and the per-cell working arrays the step pipeline reads and rewrites
/// every tick.
pub struct SolverState {
    pub mesh: Mesh,
    pub network: Network,
    pub config: SystemConfig,
    pub scheme: SchemeConfig,
    pub t: f64,
    pub dt: f64,
    started: bool,
    parameters: Vec<Parameters>,
    i_volume: Vec<f64>,
    i_discharge: Vec<f64>,
}

impl SolverState {
    /// Build a mesh from `network` and reconstruct the first set of
    /// per-cell parameters from its initial condition.
    pub fn new(network: Network, config: SystemConfig, scheme: SchemeConfig) -> Result<Self> {
        let geometry = config.geometry_config();
        let mesh = Mesh::build(&network, config.initial_time, &geometry, config.depth_min)?;
        let n = mesh.n_cells;
        let mut state = Self {
            mesh,
            network,
            config,
            scheme,
            t: 0.0,
            dt: 0.0,
            started: false,
            parameters: vec![Parameters::default(); n],
            i_volume: vec![0.0; n],
            i_discharge: vec![0.0; n],
        };
        state.t = state.config.initial_time;
        state.parameters_stage();
        Ok(state)
    }

    /// §4.J `simulate_start`: mark the run as begun. Idempotent; `simulate`
    /// calls this itself if it hasn't happened yet.
    pub fn simulate_start(&mut self) {
        self.parameters_stage();
        self.started = true;
    }

    fn needs_steady_init(&self) -> bool {
        self.network.channels.iter().any(|c| {
            matches!(c.initial_flow, alveo_mesh::network::InitialFlow::Steady)
                || c.initial_transport.iter().any(|t| matches!(t, alveo_mesh::network::InitialTransport::Steady))
        })
    }

    /// §4.J `simulate_steady`: iterate the explicit pipeline at the
    /// network's own geometry (no snapshot output, no advancing
    /// `observation_time`) until the per-step residual falls below
    /// `steady_error` or `max_steady_time` pseudo-time elapses. Emits a
    /// [`StepWarning::SteadyTimeout`] on the latter rather than erroring:
    /// the caller gets whatever state the loop reached and decides whether
    /// that's usable.
    pub fn simulate_steady(&mut self, observer: &mut dyn SimulationObserver) -> Result<Option<StepWarning>> {
        let max_time = self.config.max_steady_time.unwrap_or(f64::INFINITY);
        let tol = self.config.steady_error;
        let mut pseudo_time = 0.0;
        loop {
            self.parameters_stage();
            let (dtmax, fdtmax) = self.parameters2_stage();
            let dt = dtmax.min(FRICTION_CFL * fdtmax).max(1e-9);
            self.dt = dt;
            self.decomposition_stage(pseudo_time);
            let residual = self.i_volume.iter().chain(self.i_discharge.iter()).map(|v| v * v).sum::<f64>().sqrt() / dt.max(1e-12);
            self.step_stage(pseudo_time, dt);
            pseudo_time += dt;
            observer.on_progress(pseudo_time, Some(residual));
            if residual < tol {
                debug!(pseudo_time, residual, "steady-state initialisation converged");
                return Ok(None);
            }
            if pseudo_time > max_time {
                let warning = StepWarning::SteadyTimeout { pseudo_time, error: residual };
                warn!(%warning, "steady-state initialisation timed out");
                return Ok(Some(warning));
            }
        }
    }

    /// §4.J: the outer/inner time loop. Writes a snapshot at `t0` and at
    /// every `measured_interval` thereafter (via `writers`), runs
    /// `simulate_steady` first if any channel asks for it, and returns once
    /// `final_time` is reached or the observer requests a clean stop.
    pub fn simulate(&mut self, observer: &mut dyn SimulationObserver, writers: &mut crate::io::OutputWriters) -> Result<SimulationReport> {
        let started_at = chrono_now();
        if !self.started {
            self.simulate_start();
        }
        let mut warnings = Vec::new();
        if self.needs_steady_init() {
            if let Some(w) = self.simulate_steady(observer)? {
                warnings.push(w);
            }
        }

        let mut overflow = false;
        let mut steps = 0u64;
        let ti = self.config.snapshot_interval();
        let tf = self.config.final_time;

        writers.write_snapshot(self)?;

        while self.t < tf - 1e-9 {
            if observer.should_stop() {
                break;
            }
            let at = (self.t + ti).min(tf);
            while self.t < at - 1e-9 {
                self.parameters_stage();
                let (dtmax, fdtmax) = self.parameters2_stage();
                let next_change = self.mesh.next_section_change(&self.network, self.t).unwrap_or(f64::INFINITY);
                let dt = [dtmax, FRICTION_CFL * fdtmax, at - self.t, next_change - self.t]
                    .into_iter()
                    .fold(f64::INFINITY, f64::min)
                    .max(1e-9);
                self.dt = dt;

                warnings.extend(self.decomposition_stage(self.t));
                let step_warnings = self.step_stage(self.t, dt);
                if step_warnings.iter().any(|w| matches!(w, StepWarning::Overflow { .. })) {
                    overflow = true;
                }
                warnings.extend(step_warnings);

                if !self.mesh.concentration.is_empty() {
                    self.transport_stage(self.t, dt);
                }

                self.t += dt;
                steps += 1;
                writers.observe_advance(self.t, &self.current_areas(), self.config.depth_min);
                writers.write_contributions_line(self.t, &self.boundary_contributions())?;
                writers.write_plume_line(self.t, &self.mesh.cell_x, &self.mesh.concentration, &self.plume_thresholds())?;
                trace!(t = self.t, dt, "completed inner step");
            }
            writers.write_snapshot(self)?;
            observer.on_progress(self.t, None);
        }
        writers.finish(&self.mesh.cell_x)?;

        debug!(steps, %started_at, "simulate loop finished");
        Ok(SimulationReport {
            steps,
            final_time: self.t,
            channel_overflow: overflow,
            warnings,
            started_at,
        })
    }

    pub fn parameters(&self) -> &[Parameters] {
        &self.parameters
    }

    fn current_areas(&self) -> Vec<f64> {
        (0..self.mesh.n_cells).map(|i| self.mesh.area(CellId::from(i))).collect()
    }

    fn boundary_contributions(&self) -> Vec<f64> {
        self.mesh.boundaries.iter().map(|b| b.contribution).collect()
    }

    fn plume_thresholds(&self) -> Vec<f64> {
        self.network.solutes.iter().map(|s| s.solubility * self.config.plume_threshold_fraction).collect()
    }

    /// §4.D reconstruction stage: rebuild every cell's [`Parameters`] from
    /// its conserved `(volume, discharge)`, dispatched across
    /// `mesh.thread_ranges` the way §5 describes ("each worker thread owns
    /// a disjoint `CellRange` and writes only within it").
    fn parameters_stage(&mut self) {
        let amin = self.config.depth_min;
        let mesh = &self.mesh;
        let mut remaining = self.parameters.as_mut_slice();
        let mut slices = Vec::with_capacity(mesh.thread_ranges.len());
        for range in &mesh.thread_ranges {
            let (head, tail) = remaining.split_at_mut(range.len());
            slices.push((range.start.index(), head));
            remaining = tail;
        }
        rayon::scope(|s| {
            for (start, slice) in slices {
                s.spawn(move |_| {
                    for (j, p) in slice.iter_mut().enumerate() {
                        let i = start + j;
                        let channel = &mesh.channels[mesh.cell_channel[i]];
                        let x = mesh.cell_x[i];
                        let area = mesh.area(CellId::from(i));
                        let q = mesh.discharge[i];
                        *p = Parameters::reconstruct(&channel.segment, x, area, q, amin);
                    }
                });
            }
        });
    }

    /// §4.D CFL stage: the explicit wave-speed time-step bound and the
    /// friction-rate time-step bound, reduced across worker partitions
    /// under a `parking_lot::Mutex` per §5's shared-scalar model.
    fn parameters2_stage(&self) -> (f64, f64) {
        let dtmax = Mutex::new(f64::INFINITY);
        let fdtmax = Mutex::new(f64::INFINITY);
        let params = &self.parameters;
        let dx = &self.mesh.dx;
        let cfl = self.config.cfl;
        rayon::scope(|s| {
            for range in &self.mesh.thread_ranges {
                let dtmax = &dtmax;
                let fdtmax = &fdtmax;
                s.spawn(move |_| {
                    let mut local_dt = f64::INFINITY;
                    let mut local_fdt = f64::INFINITY;
                    for cell in range.iter() {
                        let i = cell.index();
                        let p = &params[i];
                        local_dt = local_dt.min(p.cfl_time_step(dx[i], cfl));
                        let k = p.friction_coefficient();
                        if k > 0.0 {
                            let q = p.discharge.abs().max(1e-9);
                            local_fdt = local_fdt.min(1.0 / (k * q));
                        }
                    }
                    let mut g = dtmax.lock();
                    if local_dt < *g {
                        *g = local_dt;
                    }
                    drop(g);
                    let mut g = fdtmax.lock();
                    if local_fdt < *g {
                        *g = local_fdt;
                    }
                });
            }
        });
        (dtmax.into_inner(), fdtmax.into_inner())
    }

    /// §4.E: decompose every interior edge and every terminal boundary into
    /// its `(dA, dQ)` contributions, accumulating a per-cell volume
    /// increment (`i_volume`) and discharge increment (`i_discharge`) for
    /// the step stage to apply. `decompose_edge` already propagates each
    /// wave at its own eigenvalue, so the area component becomes a
    /// *volume* increment directly (`dx` cancels between the `A -> V`
    /// conversion and the `1/dx` flux-difference normalisation), while the
    /// discharge component still needs the `dt/dx` scaling since `Q`
    /// carries no implicit `dx` factor of its own.
    fn decomposition_stage(&mut self, t: f64) -> Vec<StepWarning> {
        self.i_volume.iter_mut().for_each(|v| *v = 0.0);
        self.i_discharge.iter_mut().for_each(|v| *v = 0.0);
        let dt = self.dt;
        let mut warnings = Vec::new();

        for c in 0..self.mesh.channels.len() {
            let channel_id = ChannelId::from(c);
            let range = self.mesh.channels[channel_id].range;

            for i in (range.start.index() + 1)..range.end.index() {
                let left = self.parameters[i - 1];
                let right = self.parameters[i];
                let far_left = (i >= range.start.index() + 2).then(|| self.parameters[i - 2]);
                let far_right = (i + 1 < range.end.index()).then(|| self.parameters[i + 1]);
                let edge_len = self.mesh.ix[i];
                let flux = decompose_edge(&left, &right, far_left.as_ref(), far_right.as_ref(), dt, edge_len, &self.scheme);
                self.i_volume[i - 1] += dt * flux.left_area;
                self.i_discharge[i - 1] += dt / self.mesh.dx[i - 1] * flux.left_discharge;
                self.i_volume[i] += dt * flux.right_area;
                self.i_discharge[i] += dt / self.mesh.dx[i] * flux.right_discharge;
            }

            if let Some(w) = self.apply_terminal_boundary(channel_id, range.start.index(), t, dt, true) {
                warnings.push(w);
            }
            if let Some(w) = self.apply_terminal_boundary(channel_id, range.end.index() - 1, t, dt, false) {
                warnings.push(w);
            }
        }
        warnings
    }

    /// Close the Riemann problem at one channel end against whatever
    /// [`BoundaryFlow`] is configured there. `Junction`-kind ends
    /// contribute nothing here: the node exchange is resolved after the
    /// volume update, in `step_stage`'s junction solve, from the terminal
    /// cell's own (pre-overwrite) discharge.
    fn apply_terminal_boundary(&mut self, channel_id: ChannelId, cell_idx: usize, t: f64, dt: f64, is_upstream: bool) -> Option<StepWarning> {
        let cell = CellId::from(cell_idx);
        let b_idx = self
            .mesh
            .boundaries
            .iter()
            .position(|b| b.channel == channel_id && b.cell == cell && matches!(b.end, ChannelEnd::Upstream | ChannelEnd::Downstream))?;

        let flow = self.mesh.boundaries[b_idx].flow.clone();
        if matches!(flow, BoundaryFlow::Junction) {
            self.mesh.boundaries[b_idx].contribution = self.mesh.discharge[cell_idx];
            return None;
        }

        let interior = self.parameters[cell_idx];
        let channel = &self.mesh.channels[channel_id];
        let x = self.mesh.cell_x[cell_idx];
        let bed_elevation = channel.segment.geometry_at(x).zmin;
        let segment = &channel.segment;
        let (ghost_area, mut ghost_discharge) = flow.ghost_state(t, &interior, bed_elevation, |z| segment.area_at(x, z));

        let clamped = clamp_supercritical_recovery(&interior, &mut ghost_discharge);
        self.mesh.boundaries[b_idx].contribution = ghost_discharge;
        let warning = clamped.then(|| StepWarning::SupercriticalClamped {
            boundary: self.mesh.boundaries[b_idx].id.clone(),
            time: t,
        });

        let ghost = Parameters::reconstruct(segment, x, ghost_area.max(1e-9), ghost_discharge, self.config.depth_min);
        let edge_len = self.mesh.ix[cell_idx];
        let range = self.mesh.channels[channel_id].range;
        let flux = if is_upstream {
            let far_right = (cell_idx + 1 < range.end.index()).then(|| self.parameters[cell_idx + 1]);
            decompose_edge(&ghost, &interior, None, far_right.as_ref(), dt, edge_len, &self.scheme)
        } else {
            let far_left = (cell_idx >= range.start.index() + 1).then(|| self.parameters[cell_idx - 1]);
            decompose_edge(&interior, &ghost, far_left.as_ref(), None, dt, edge_len, &self.scheme)
        };

        if is_upstream {
            self.i_volume[cell_idx] += dt * flux.right_area;
            self.i_discharge[cell_idx] += dt / self.mesh.dx[cell_idx] * flux.right_discharge;
        } else {
            self.i_volume[cell_idx] += dt * flux.left_area;
            self.i_discharge[cell_idx] += dt / self.mesh.dx[cell_idx] * flux.left_discharge;
        }

        warning
    }

    /// §4.F: apply the accumulated increments to every cell's conserved
    /// volume, recover dry cells that went negative at channel scope, solve
    /// every junction's node balance, then integrate friction. Returns any
    /// [`StepWarning`]s raised along the way.
    fn step_stage(&mut self, t: f64, dt: f64) -> Vec<StepWarning> {
        let mut warnings = Vec::new();

        for i in 0..self.mesh.n_cells {
            let (v, _went_negative) = apply_volume_increment(self.mesh.volume[i], self.i_volume[i]);
            self.mesh.volume[i] = v;
        }

        for c in 0..self.mesh.channels.len() {
            let channel_id = ChannelId::from(c);
            let range = self.mesh.channels[channel_id].range;
            let lost = redistribute_dry(&mut self.mesh.volume[range.start.index()..range.end.index()]);
            if lost > 0.0 {
                debug!(channel = %self.mesh.channels[channel_id].id, lost, "dry redistribution could not fully recover a negative volume");
            }
        }

        for j in 0..self.mesh.junctions.len() {
            self.solve_junction(JunctionId::from(j), dt);
        }

        for i in 0..self.mesh.n_cells {
            let area_now = self.mesh.area(CellId::from(i));
            let dry = area_now <= self.config.depth_min;
            let k = self.parameters[i].friction_coefficient();
            let predicted_discharge = self.mesh.discharge[i] + self.i_discharge[i];
            self.mesh.discharge[i] = apply_friction(predicted_discharge, k, self.config.implicit, dt, dry);

            let channel = &self.mesh.channels[self.mesh.cell_channel[i]];
            let x = self.mesh.cell_x[i];
            let level = channel.segment.level_at(x, area_now);
            let zmax = channel.segment.geometry_at(x).zmax();
            if level > zmax {
                warnings.push(StepWarning::Overflow {
                    channel: channel.id.clone(),
                    cell: i,
                    time: t,
                });
            }
        }

        warnings
    }

    /// §4.F.3: pool every member cell's volume plus this step's net
    /// inlet/outlet discharge into one node balance, invert the junction's
    /// volume table for the shared level, then reset every member cell's
    /// area (hence volume) to that level and mix their solute
    /// concentrations mass-weighted.
    fn solve_junction(&mut self, jid: JunctionId, dt: f64) {
        let membership = self.mesh.junction_members[jid.index()].clone();
        let cell_volumes: Vec<f64> = membership.cells.iter().map(|&c| self.mesh.volume[c.index()]).collect();
        let inlet_q: Vec<f64> = membership
            .inlet_boundaries
            .iter()
            .map(|&b| self.mesh.discharge[self.mesh.boundaries[b].cell.index()])
            .collect();
        let outlet_q: Vec<f64> = membership
            .outlet_boundaries
            .iter()
            .map(|&b| self.mesh.discharge[self.mesh.boundaries[b].cell.index()])
            .collect();
        let total_volume = junction_total_volume(&cell_volumes, &inlet_q, &outlet_q, dt);
        let z = self.mesh.junctions[jid].level_for_volume(total_volume);

        for &cell in &membership.cells {
            let channel = &self.mesh.channels[self.mesh.cell_channel[cell.index()]];
            let x = self.mesh.cell_x[cell.index()];
            let area = channel.segment.area_at(x, z);
            self.mesh.volume[cell.index()] = area * self.mesh.dx[cell.index()];
        }

        for s in 0..self.mesh.concentration.len() {
            let concs: Vec<f64> = membership.cells.iter().map(|&c| self.mesh.concentration[s][c.index()]).collect();
            let mixed = mixed_concentration(&cell_volumes, &concs);
            for &cell in &membership.cells {
                self.mesh.concentration[s][cell.index()] = mixed;
            }
        }
    }

    /// §4.H: upwind-plus-TVD advection, a diffusive correction and
    /// solubility saturation, per solute.
    fn transport_stage(&mut self, t: f64, dt: f64) {
        let n_solutes = self.mesh.concentration.len();
        for s in 0..n_solutes {
            let solubility = self.network.solutes[s].solubility;
            let nu = self.network.solutes[s].diffusivity;
            let mut i_mass = vec![0.0; self.mesh.n_cells];

            for c in 0..self.mesh.channels.len() {
                let channel_id = ChannelId::from(c);
                let range = self.mesh.channels[channel_id].range;
                for i in (range.start.index() + 1)..range.end.index() {
                    let q_edge = self.mesh.discharge[i];
                    let c_l = self.mesh.concentration[s][i - 1];
                    let c_r = self.mesh.concentration[s][i];
                    let mut flux = upwind_mass_flux(q_edge, c_l, c_r);

                    if let Some(limiter) = self.scheme.limiter() {
                        let dc_upwind = c_r - c_l;
                        let dc_far = if q_edge >= 0.0 {
                            if i >= range.start.index() + 2 {
                                c_l - self.mesh.concentration[s][i - 2]
                            } else {
                                dc_upwind
                            }
                        } else if i + 1 < range.end.index() {
                            self.mesh.concentration[s][i + 1] - c_r
                        } else {
                            dc_upwind
                        };
                        let courant = (q_edge * dt / self.mesh.dx[i].min(self.mesh.dx[i - 1])).abs();
                        let correction = tvd_mass_flux_correction(dc_upwind, dc_far, courant, limiter);
                        flux += q_edge.signum() * correction;
                    }

                    let area_l = self.parameters[i - 1].area;
                    let area_r = self.parameters[i].area;
                    let diff = match self.scheme.diffusion {
                        DiffusionMode::None => 0.0,
                        DiffusionMode::Constant => diffusive_mass_flux(nu, nu, area_l.min(area_r), self.mesh.ix[i], c_l, c_r),
                        DiffusionMode::ShearScaled => {
                            let pl = &self.parameters[i - 1];
                            let pr = &self.parameters[i];
                            let nu_l = nu + shear_velocity(pl.area / pl.perimeter, pl.friction_coefficient(), pl.discharge);
                            let nu_r = nu + shear_velocity(pr.area / pr.perimeter, pr.friction_coefficient(), pr.discharge);
                            diffusive_mass_flux(nu_l, nu_r, area_l.min(area_r), self.mesh.ix[i], c_l, c_r)
                        }
                    };

                    i_mass[i - 1] -= dt * (flux + diff);
                    i_mass[i] += dt * (flux + diff);
                }
                self.apply_terminal_transport(channel_id, s, t, dt, &mut i_mass);
            }

            for i in 0..self.mesh.n_cells {
                let volume = self.mesh.volume[i].max(1e-12);
                let mass = self.mesh.concentration[s][i] * volume + i_mass[i];
                let c = (mass / volume).max(0.0);
                let (c, b) = apply_saturation(c, volume, self.mesh.bound_mass[s][i], solubility);
                self.mesh.concentration[s][i] = c;
                self.mesh.bound_mass[s][i] = b;
            }
        }
    }

    /// §4.H.4: apply one solute's boundary mass flux at a channel's two
    /// terminal cells, if a boundary is placed there. Positive flux means
    /// mass entering the domain at an upstream end, or leaving it at a
    /// downstream end.
    fn apply_terminal_transport(&mut self, channel_id: ChannelId, solute: usize, t: f64, dt: f64, i_mass: &mut [f64]) {
        let range = self.mesh.channels[channel_id].range;
        for (cell_idx, is_upstream) in [(range.start.index(), true), (range.end.index() - 1, false)] {
            let cell = CellId::from(cell_idx);
            let Some(b_idx) = self
                .mesh
                .boundaries
                .iter()
                .position(|b| b.channel == channel_id && b.cell == cell && matches!(b.end, ChannelEnd::Upstream | ChannelEnd::Downstream))
            else {
                continue;
            };
            let transport = self.mesh.boundaries[b_idx].transport.get(solute).cloned().unwrap_or(BoundaryTransport::None);
            let discharge = self.mesh.discharge[cell_idx];
            let c_interior = self.mesh.concentration[solute][cell_idx];
            let flux = transport.mass_flux(t, discharge, c_interior);
            if is_upstream {
                i_mass[cell_idx] += dt * flux;
            } else {
                i_mass[cell_idx] -= dt * flux;
            }
        }
    }
}

/// §4.I "critical-discharge clamp": if a boundary's prescribed ghost state
/// would draw a supercritical discharge past a subcritical interior cell,
/// clamp it to 0.99x the interior's critical discharge instead of letting
/// the Riemann solver see an inconsistent characteristic. Returns whether
/// the clamp engaged.
fn clamp_supercritical_recovery(interior: &Parameters, ghost_discharge: &mut f64) -> bool {
    if interior.dry {
        return false;
    }
    let critical = interior.area * interior.wave_velocity;
    if ghost_discharge.abs() > critical.abs() && critical.abs() > 1e-9 {
        *ghost_discharge = 0.99 * critical * ghost_discharge.signum();
        true
    } else {
        false
    }
}

