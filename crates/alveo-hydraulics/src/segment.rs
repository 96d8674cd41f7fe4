//! Channel-segment builder (§4.B) — linear interpolation of surveyed
//! cross sections along a reach.
//!
//! A [`ChannelSegment`] owns the ordered list of surveyed [`Section`]s
//! along one reach (its "stations") and produces a geometry sample at any
//! intermediate chainage `x` by blending the two bracketing stations.
//! Because two surveyed sections rarely share a `dz` grid, the blend is
//! done by re-evaluating each bracketing [`Section`]'s continuous
//! `area_at`/`width_at`/`perimeter_at`/`friction_at` accessors on a shared
//! elevation grid rather than splicing their raw tables — this sidesteps
//! the upsampling problem entirely while giving the same answer a
//! table-splice would, since both accessors already interpolate linearly
//! within a row.
//!
//! A station may mark a stretch as frictionless (a structure, a flume, an
//! internal transition) by storing `r = f64::INFINITY` in its `FP` table.
//! `f64` arithmetic already propagates `INFINITY` correctly through a
//! weighted sum as long as neither weight is exactly zero on the finite
//! side, so no special-casing is needed beyond guarding the `0 * inf = NaN`
//! edge case at the exact station chainages.

use alveo_core::FatalResult;

use crate::section::{FrictionParameters, Section};
use crate::{HydraulicError, Result};

/// A surveyed cross section placed at a chainage along a reach.
#[derive(Debug, Clone)]
pub struct Station {
    pub x: f64,
    pub section: Section,
}

/// A geometry sample produced by blending two stations (or reading one
/// directly, at an exact station chainage).
#[derive(Debug, Clone, Copy)]
pub struct GeometrySample {
    pub zmin: f64,
    pub hmax: f64,
    pub contraction: f64,
}

impl GeometrySample {
    pub fn zmax(&self) -> f64 {
        self.zmin + self.hmax
    }
}

/// One open-channel reach: an ordered sequence of surveyed sections and
/// the interpolation between them.
#[derive(Debug, Clone)]
pub struct ChannelSegment {
    pub id: String,
    stations: Vec<Station>,
}

impl ChannelSegment {
    pub fn new(id: impl Into<String>, mut stations: Vec<Station>) -> Result<Self> {
        let id = id.into();
        if stations.len() < 2 {
            return Err(HydraulicError::BadSegment {
                id,
                reason: "a channel segment needs at least two surveyed sections".into(),
            });
        }
        stations.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        for w in stations.windows(2) {
            if w[1].x <= w[0].x {
                return Err(HydraulicError::BadSegment {
                    id,
                    reason: format!("duplicate or unordered station chainage at x={}", w[1].x),
                });
            }
        }
        Ok(Self { id, stations })
    }

    pub fn x_start(&self) -> f64 {
        self.stations.first().unwrap().x
    }

    pub fn x_end(&self) -> f64 {
        self.stations.last().unwrap().x
    }

    pub fn length(&self) -> f64 {
        self.x_end() - self.x_start()
    }

    /// Chainages of every surveyed station, in order. Used by the mesh
    /// builder to snap cell boundaries onto surveyed cross sections and to
    /// place section-aligned cell centres (§4.C.1, §4.C.3).
    pub fn station_chainages(&self) -> impl Iterator<Item = f64> + '_ {
        self.stations.iter().map(|s| s.x)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// The built [`Section`] of whichever station brackets `x` more
    /// closely (exact at a station chainage). Used where a caller needs a
    /// single concrete `Section` rather than a blended sample — e.g. the
    /// junction volume table, which is built once per node from the
    /// section(s) actually touching it (§4.C.8).
    pub fn nearest_station_section(&self, x: f64) -> &Section {
        let (lo, hi, w) = self.bracket(x);
        if w < 0.5 {
            &self.stations[lo].section
        } else {
            &self.stations[hi].section
        }
    }

    fn bracket(&self, x: f64) -> (usize, usize, f64) {
        let last = self.stations.len() - 1;
        if x <= self.stations[0].x {
            return (0, 0, 0.0);
        }
        if x >= self.stations[last].x {
            return (last, last, 0.0);
        }
        let mut lo = 0;
        let mut hi = last;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.stations[mid].x <= x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let span = self.stations[hi].x - self.stations[lo].x;
        let w = if span > 0.0 {
            (x - self.stations[lo].x) / span
        } else {
            0.0
        };
        (lo, hi, w)
    }

    /// Blend the bracketing stations' headline geometry at chainage `x`.
    pub fn geometry_at(&self, x: f64) -> GeometrySample {
        let (lo, hi, w) = self.bracket(x);
        let a = &self.stations[lo].section;
        let b = &self.stations[hi].section;
        GeometrySample {
            zmin: lerp(a.zmin, b.zmin, w),
            hmax: lerp(a.hmax, b.hmax, w),
            contraction: lerp(a.contraction, b.contraction, w),
        }
    }

    /// Wetted area at chainage `x`, elevation `z`.
    pub fn area_at(&self, x: f64, z: f64) -> f64 {
        let (lo, hi, w) = self.bracket(x);
        lerp(
            self.stations[lo].section.area_at(z),
            self.stations[hi].section.area_at(z),
            w,
        )
    }

    /// Top width at chainage `x`, elevation `z`.
    pub fn width_at(&self, x: f64, z: f64) -> f64 {
        let (lo, hi, w) = self.bracket(x);
        lerp(
            self.stations[lo].section.width_at(z),
            self.stations[hi].section.width_at(z),
            w,
        )
    }

    /// Wetted perimeter at chainage `x`, elevation `z`.
    pub fn perimeter_at(&self, x: f64, z: f64) -> f64 {
        let (lo, hi, w) = self.bracket(x);
        lerp(
            self.stations[lo].section.perimeter_at(z),
            self.stations[hi].section.perimeter_at(z),
            w,
        )
    }

    /// Minimum uniform-flow depth at chainage `x`, blended from the
    /// bracketing stations' own [`Section::hmin`]. Used by the parameters
    /// stage as the dry-cell wave-speed depth (§4.D.2).
    pub fn hmin_at(&self, x: f64) -> f64 {
        let (lo, hi, w) = self.bracket(x);
        lerp(self.stations[lo].section.hmin, self.stations[hi].section.hmin, w)
    }

    /// Elevation for a given area at chainage `x`.
    pub fn level_at(&self, x: f64, area: f64) -> f64 {
        let (lo, hi, w) = self.bracket(x);
        lerp(
            self.stations[lo].section.level_at(area),
            self.stations[hi].section.level_at(area),
            w,
        )
    }

    /// Composite friction at chainage `x`, elevation `z`. Propagates
    /// `INFINITY` (frictionless reach marker) unless the blend weight on
    /// that side is exactly zero.
    pub fn friction_at(&self, x: f64, z: f64) -> FrictionParameters {
        let (lo, hi, w) = self.bracket(x);
        let a = self.stations[lo].section.friction_at(z);
        let b = self.stations[hi].section.friction_at(z);
        FrictionParameters {
            r: blend_with_infinity(a.r, b.r, w),
            beta: lerp(a.beta, b.beta, w),
            d_beta_a: lerp(a.d_beta_a, b.d_beta_a, w),
        }
    }

    /// Cell midpoint chainages for `n` equal-length cells along this
    /// segment, used by the mesh builder (component C).
    pub fn cell_centers(&self, n: usize) -> FatalResult<Vec<f64>> {
        if n == 0 {
            return Err(alveo_core::FatalError::BadGeometry {
                id: self.id.clone(),
                reason: "segment needs at least one cell".into(),
            });
        }
        let dx = self.length() / n as f64;
        Ok((0..n)
            .map(|i| self.x_start() + dx * (i as f64 + 0.5))
            .collect())
    }
}

fn lerp(a: f64, b: f64, w: f64) -> f64 {
    a + (b - a) * w
}

fn blend_with_infinity(a: f64, b: f64, w: f64) -> f64 {
    if w <= 0.0 {
        return a;
    }
    if w >= 1.0 {
        return b;
    }
    lerp(a, b, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{FrictionLaw, GeometryConfig, SectionPoint, TransientSection};

    fn rect_section(width: f64, depth: f64, n: f64) -> Section {
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
    }

    #[test]
    fn interpolates_width_linearly_between_two_rectangular_stations() {
        let seg = ChannelSegment::new(
            "reach1",
            vec![
                Station { x: 0.0, section: rect_section(4.0, 2.0, 0.03) },
                Station { x: 100.0, section: rect_section(8.0, 2.0, 0.03) },
            ],
        )
        .unwrap();
        let w = seg.width_at(50.0, 1.0);
        assert!((w - 6.0).abs() < 0.3, "expected midspan width ~6.0, got {w}");
    }

    #[test]
    fn rejects_unordered_or_duplicate_stations() {
        let s = rect_section(4.0, 2.0, 0.03);
        let err = ChannelSegment::new(
            "bad",
            vec![
                Station { x: 10.0, section: s.clone() },
                Station { x: 10.0, section: s },
            ],
        );
        assert!(err.is_err());
    }

    #[test]
    fn hmin_at_blends_bracketing_stations_exactly_at_their_own_chainage() {
        let seg = ChannelSegment::new(
            "reach1",
            vec![
                Station { x: 0.0, section: rect_section(4.0, 2.0, 0.03) },
                Station { x: 100.0, section: rect_section(8.0, 2.0, 0.03) },
            ],
        )
        .unwrap();
        let hmin0 = seg.stations[0].section.hmin;
        let hmin1 = seg.stations[1].section.hmin;
        assert_eq!(seg.hmin_at(0.0), hmin0);
        assert_eq!(seg.hmin_at(100.0), hmin1);
        let mid = seg.hmin_at(50.0);
        assert!(mid >= hmin0.min(hmin1) && mid <= hmin0.max(hmin1));
    }

    #[test]
    fn cell_centers_are_evenly_spaced_and_within_bounds() {
        let seg = ChannelSegment::new(
            "reach1",
            vec![
                Station { x: 0.0, section: rect_section(4.0, 2.0, 0.03) },
                Station { x: 100.0, section: rect_section(4.0, 2.0, 0.03) },
            ],
        )
        .unwrap();
        let centers = seg.cell_centers(10).unwrap();
        assert_eq!(centers.len(), 10);
        assert!(centers[0] > 0.0 && centers[0] < 10.0);
        assert!(centers[9] > 90.0 && centers[9] < 100.0);
    }
}
