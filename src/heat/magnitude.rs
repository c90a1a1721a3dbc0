use super::aggregate::{Aggregate, PeriodStats};
use super::index::CommitIndex;
use crate::error::{HeatmapError, Result};
use palette::{Mix, Srgb};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default compression constant. Lower values flatten large bursts harder.
pub const DEFAULT_SCALE: f64 = 60.0;

/// What a cell's magnitude is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Largest value anywhere in the index.
    #[default]
    Global,
    /// Largest value within the cell's own directory.
    Directory,
}

/// Turns per-period statistics into a log-compressed magnitude, a
/// square-root intensity ramp in `[0, 1]` and finally a color.
#[derive(Debug, Clone)]
pub struct MagnitudeModel {
    scale: f64,
    ramp: ColorRamp,
    normalization: Normalization,
}

impl MagnitudeModel {
    pub fn new(scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(HeatmapError::InvalidScale(scale));
        }
        Ok(Self {
            scale,
            ramp: ColorRamp::default(),
            normalization: Normalization::Global,
        })
    }

    pub fn with_ramp(mut self, ramp: ColorRamp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    /// `commits` distinct commits touched `files` files for `lines` net lines.
    ///
    /// A commit is the unit of work; the average churn per file only adds a
    /// damped bonus so that a commit touching thousands of files does not
    /// dwarf everything else.
    pub fn value(&self, commits: u32, files: u32, lines: f64) -> f64 {
        let mut base = f64::from(commits);
        if files > 0 {
            base += (lines / f64::from(files) + 1.0).log10();
        }
        (base / self.scale + 1.0).log10() * self.scale + 1.0
    }

    /// Magnitude of one cell; inactive cells are 0.
    pub fn cell_value(&self, stats: &PeriodStats) -> f64 {
        if stats.commits == 0 {
            return 0.0;
        }
        self.value(stats.commits, stats.files_changed, stats.lines())
    }

    pub fn directory_maximum(&self, aggregate: &Aggregate) -> f64 {
        aggregate
            .periods()
            .map(|(_, stats)| self.cell_value(stats))
            .fold(0.0, f64::max)
    }

    pub fn index_maximum(&self, index: &CommitIndex) -> f64 {
        index
            .each_directory()
            .map(|(_, aggregate)| self.directory_maximum(aggregate))
            .fold(0.0, f64::max)
    }

    /// `sqrt(value / maximum)` clipped to `[0, 1]`.
    pub fn intensity(&self, value: f64, maximum: f64) -> f64 {
        if maximum <= 0.0 || value <= 0.0 {
            return 0.0;
        }
        (value / maximum).sqrt().clamp(0.0, 1.0)
    }

    pub fn color(&self, intensity: f64) -> Srgb<u8> {
        self.ramp.at(intensity)
    }
}

/// Ordered anchor colors sampled by intensity.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    anchors: Vec<Srgb<u8>>,
}

impl ColorRamp {
    /// Returns `None` for an empty anchor list.
    pub fn new(anchors: Vec<Srgb<u8>>) -> Option<Self> {
        if anchors.is_empty() {
            None
        } else {
            Some(Self { anchors })
        }
    }

    pub fn anchors(&self) -> &[Srgb<u8>] {
        &self.anchors
    }

    /// Sample the ramp at `t`, linearly interpolating each channel between
    /// the two neighbouring anchors.
    pub fn at(&self, t: f64) -> Srgb<u8> {
        let n = self.anchors.len();
        let first = self.anchors[0];
        let last = self.anchors[n - 1];

        let p = t * n as f64;
        if p.is_nan() || p <= 0.0 {
            return first;
        }
        if p + 1.0 >= n as f64 {
            return last;
        }

        let i = p.floor() as usize;
        let weight = (p - p.floor()) as f32;
        let lower: Srgb<f32> = self.anchors[i].into_format();
        let upper: Srgb<f32> = self.anchors[i + 1].into_format();
        lower.mix(upper, weight).into_format()
    }
}

impl Default for ColorRamp {
    /// White through blue and yellow to red.
    fn default() -> Self {
        Self {
            anchors: vec![
                Srgb::new(0xff, 0xff, 0xff),
                Srgb::new(0x4d, 0x85, 0xff),
                Srgb::new(0xf4, 0xfb, 0x13),
                Srgb::new(0xff, 0x05, 0x05),
            ],
        }
    }
}

impl FromStr for ColorRamp {
    type Err = HeatmapError;

    /// Comma separated hex colors, e.g. `#ffffff,#ff0000`.
    fn from_str(s: &str) -> Result<Self> {
        let anchors = s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| {
                c.parse::<Srgb<u8>>()
                    .map_err(|_| HeatmapError::InvalidColor(c.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        ColorRamp::new(anchors).ok_or_else(|| HeatmapError::InvalidColor(s.to_string()))
    }
}

pub fn hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model() -> MagnitudeModel {
        MagnitudeModel::new(DEFAULT_SCALE).unwrap()
    }

    #[test]
    fn value_grows_with_commits() {
        let m = model();
        let mut previous = m.value(0, 3, 40.0);
        for r in 1..200 {
            let next = m.value(r, 3, 40.0);
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn value_without_files_skips_churn_term() {
        let m = model();
        let expected = (1.0f64 / 60.0 + 1.0).log10() * 60.0 + 1.0;
        assert!((m.value(1, 0, 1_000.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn smaller_scale_compresses_bursts() {
        let tight = MagnitudeModel::new(5.0).unwrap();
        let loose = MagnitudeModel::new(500.0).unwrap();
        let ratio = |m: &MagnitudeModel| m.value(100, 1, 1.0) / m.value(1, 1, 1.0);
        assert!(ratio(&tight) < ratio(&loose));
    }

    #[test]
    fn rejects_bad_scale() {
        assert!(matches!(MagnitudeModel::new(0.0), Err(HeatmapError::InvalidScale(_))));
        assert!(matches!(MagnitudeModel::new(f64::NAN), Err(HeatmapError::InvalidScale(_))));
    }

    #[test]
    fn intensity_is_clipped_square_root() {
        let m = model();
        assert_eq!(m.intensity(25.0, 100.0), 0.5);
        assert_eq!(m.intensity(200.0, 100.0), 1.0);
        assert_eq!(m.intensity(5.0, 0.0), 0.0);
        assert_eq!(m.intensity(0.0, 10.0), 0.0);
    }

    #[test]
    fn ramp_endpoints_are_exact() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.at(0.0), ramp.anchors()[0]);
        assert_eq!(ramp.at(1.0), ramp.anchors()[3]);
        assert_eq!(hex(ramp.at(0.0)), "#ffffff");
        assert_eq!(hex(ramp.at(1.0)), "#ff0505");
    }

    #[test]
    fn ramp_never_overshoots_its_anchors() {
        let ramp = ColorRamp::default();
        let anchors = ramp.anchors();
        let n = anchors.len();
        for step in 0..=1000 {
            let t = f64::from(step) / 1000.0;
            let color = ramp.at(t);
            let i = ((t * n as f64).floor() as usize).min(n - 1);
            let j = (i + 1).min(n - 1);
            let (a, b) = (anchors[i], anchors[j]);
            for (c, lo, hi) in [
                (color.red, a.red, b.red),
                (color.green, a.green, b.green),
                (color.blue, a.blue, b.blue),
            ] {
                assert!(c >= lo.min(hi) && c <= lo.max(hi), "t={t} channel {c} outside {lo}..{hi}");
            }
        }
    }

    #[test]
    fn ramp_interpolates_halfway() {
        let ramp: ColorRamp = "#000000,#c8c8c8,#ffffff".parse().unwrap();
        // p = 0.5 * 3 = 1.5: halfway between the 2nd and 3rd anchor.
        let mid = ramp.at(0.5);
        assert!(mid.red >= 0xe3 && mid.red <= 0xe4);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("#zzzzzz".parse::<ColorRamp>(), Err(HeatmapError::InvalidColor(_))));
        assert!(matches!("".parse::<ColorRamp>(), Err(HeatmapError::InvalidColor(_))));
    }
}
