//! Solution / diagnostic file writers (§6 "External interfaces").
//!
//! All four formats are written with `f64` ("`JBFLOAT`", fixed at build
//! time as in the source this solver replaces — see
//! `original_source/…/write.h`) in the host's native byte order; this
//! workspace only ever reads back what it wrote, so no explicit
//! little-endian framing is needed the way a cross-platform wire format
//! would require.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::SystemConfig;
use crate::driver::SolverState;
use crate::error::{DriverError, Result};

/// Number of fixed (non-solute) columns per snapshot record: `x, Q, zs, A,
/// B, zb, zmax, beta` (§6).
pub const N_OF_VARIABLES: usize = 8;

/// Append one snapshot of every cell's state to `writer`. A snapshot is
/// `n_cells` records of `N_OF_VARIABLES + n_solutes` `f64`s — the "+1" in
/// §6's `(N_OF_VARIABLES + n_solutes + 1)` counts the record's leading `x`
/// column as part of the tail rather than the head; both countings give
/// the same byte layout, written here column-by-column for clarity.
pub fn write_snapshot(writer: &mut impl Write, state: &SolverState) -> io::Result<()> {
    let mesh = &state.mesh;
    let parameters = state.parameters();
    for i in 0..mesh.n_cells {
        let channel = &mesh.channels[mesh.cell_channel[i]];
        let x = mesh.cell_x[i];
        let q = mesh.discharge[i];
        let p = &parameters[i];
        let zs = p.level;
        let a = p.area;
        let b = p.width;
        let zb = channel.segment.geometry_at(x).zmin;
        let zmax = channel.segment.geometry_at(x).zmax();
        let beta = p.beta;

        write_f64(writer, x)?;
        write_f64(writer, q)?;
        write_f64(writer, zs)?;
        write_f64(writer, a)?;
        write_f64(writer, b)?;
        write_f64(writer, zb)?;
        write_f64(writer, zmax)?;
        write_f64(writer, beta)?;
        for s in 0..mesh.concentration.len() {
            write_f64(writer, mesh.concentration[s][i])?;
        }
    }
    writer.flush()
}

fn write_f64(writer: &mut impl Write, v: f64) -> io::Result<()> {
    writer.write_all(&v.to_ne_bytes())
}

/// Per-cell wet-arrival/wet-recession tracker for the advances file.
/// `arrival` is the first time a cell's area rose above `amin`; `recession`
/// is the last time it was still above `amin` (updated every step the
/// cell is wet, so it ends the run holding the final wet timestamp).
#[derive(Debug, Clone)]
pub struct AdvanceTracker {
    pub arrival: Vec<Option<f64>>,
    pub recession: Vec<Option<f64>>,
}

impl AdvanceTracker {
    pub fn new(n_cells: usize) -> Self {
        Self {
            arrival: vec![None; n_cells],
            recession: vec![None; n_cells],
        }
    }

    /// Record one step's wet/dry state for every cell.
    pub fn observe(&mut self, t: f64, areas: &[f64], amin: f64) {
        for (i, &area) in areas.iter().enumerate() {
            if area > amin {
                if self.arrival[i].is_none() {
                    self.arrival[i] = Some(t);
                }
                self.recession[i] = Some(t);
            }
        }
    }

    /// Write one `x_i t_arrival t_recession` line per cell (§6 "Advances
    /// file"). Cells never wet during the run are omitted.
    pub fn write(&self, writer: &mut impl Write, cell_x: &[f64]) -> io::Result<()> {
        for (i, x) in cell_x.iter().enumerate() {
            if let (Some(arrival), Some(recession)) = (self.arrival[i], self.recession[i]) {
                writeln!(writer, "{x} {arrival} {recession}")?;
            }
        }
        Ok(())
    }
}

/// Append one `t x1_start x1_end x2_start x2_end ...` line to the plumes
/// log: the longitudinal extent(s) of cells above `threshold`, per solute,
/// at the current inner step (§6 "Plumes file"). A solute with no cell
/// above threshold contributes an empty (degenerate) extent rather than
/// omitting its column, so every line has the same number of fields.
pub fn write_plume_line(
    writer: &mut impl Write,
    t: f64,
    cell_x: &[f64],
    concentration: &[Vec<f64>],
    thresholds: &[f64],
) -> io::Result<()> {
    write!(writer, "{t}")?;
    for (s, conc) in concentration.iter().enumerate() {
        let threshold = thresholds.get(s).copied().unwrap_or(f64::INFINITY);
        let (mut start, mut end) = (f64::NAN, f64::NAN);
        for (i, &c) in conc.iter().enumerate() {
            if c >= threshold {
                if start.is_nan() {
                    start = cell_x[i];
                }
                end = cell_x[i];
            }
        }
        write!(writer, " {start} {end}")?;
    }
    writeln!(writer)
}

/// Append one `t q0 q1 ...` line to the contributions log: every inner
/// boundary's running volume/mass contribution this step (§6
/// "Contributions file"; positive = into the domain).
pub fn write_contributions_line(writer: &mut impl Write, t: f64, contributions: &[f64]) -> io::Result<()> {
    write!(writer, "{t}")?;
    for q in contributions {
        write!(writer, " {q}")?;
    }
    writeln!(writer)
}

/// Owns every output file a run was configured with and funnels the
/// driver's per-step writes to them (§6 "External interfaces"). The three
/// diagnostic logs are optional; `solution` is always present since a run
/// with no snapshot output wouldn't be observable at all.
pub struct OutputWriters {
    solution: BufWriter<File>,
    advances: Option<(BufWriter<File>, AdvanceTracker)>,
    plumes: Option<BufWriter<File>>,
    contributions: Option<BufWriter<File>>,
}

impl OutputWriters {
    /// Create (truncating) every file named in `config`.
    pub fn create(config: &SystemConfig, n_cells: usize) -> Result<Self> {
        let solution = create_writer(&config.solution_file)?;
        let advances = config
            .advances_file
            .as_ref()
            .map(|path| create_writer(path).map(|w| (w, AdvanceTracker::new(n_cells))))
            .transpose()?;
        let plumes = config.plumes_file.as_ref().map(|path| create_writer(path)).transpose()?;
        let contributions = config.contributions_file.as_ref().map(|path| create_writer(path)).transpose()?;
        Ok(Self { solution, advances, plumes, contributions })
    }

    pub fn write_snapshot(&mut self, state: &SolverState) -> Result<()> {
        write_snapshot(&mut self.solution, state).map_err(|e| io_error(&state.config.solution_file, e))
    }

    pub fn observe_advance(&mut self, t: f64, areas: &[f64], amin: f64) {
        if let Some((_, tracker)) = &mut self.advances {
            tracker.observe(t, areas, amin);
        }
    }

    pub fn write_plume_line(&mut self, t: f64, cell_x: &[f64], concentration: &[Vec<f64>], thresholds: &[f64]) -> Result<()> {
        if concentration.is_empty() {
            return Ok(());
        }
        if let Some(w) = &mut self.plumes {
            write_plume_line(w, t, cell_x, concentration, thresholds).map_err(|e| io_error("<plumes file>", e))?;
        }
        Ok(())
    }

    pub fn write_contributions_line(&mut self, t: f64, contributions: &[f64]) -> Result<()> {
        if let Some(w) = &mut self.contributions {
            write_contributions_line(w, t, contributions).map_err(|e| io_error("<contributions file>", e))?;
        }
        Ok(())
    }

    /// Flush the advances tracker at the very end of a run (it needs every
    /// step's observation before it can write, unlike the other logs which
    /// are append-only).
    pub fn finish(&mut self, cell_x: &[f64]) -> Result<()> {
        if let Some((w, tracker)) = &mut self.advances {
            tracker.write(w, cell_x).map_err(|e| io_error("<advances file>", e))?;
            w.flush().map_err(|e| io_error("<advances file>", e))?;
        }
        Ok(())
    }
}

fn create_writer(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    File::create(path).map(BufWriter::new).map_err(|e| io_error(&path.display().to_string(), e))
}

fn io_error(path: &str, source: io::Error) -> DriverError {
    DriverError::Io { path: path.to_string(), source }
}
