use crate::classify::{DepthOverrides, DirectoryClassifier};
use crate::error::{HeatmapError, Result};
use crate::git::WalkOptions;
use crate::heat::{ColorRamp, MagnitudeModel, Normalization, DEFAULT_SCALE};
use crate::period::PeriodPolicy;
use crate::util::basename;
use std::path::PathBuf;

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    pub paths: Vec<PathBuf>,
    pub period: PeriodPolicy,
    pub depth: usize,
    pub overrides: DepthOverrides,
    pub scale: f64,
    pub normalization: Normalization,
    pub ramp: ColorRamp,
    pub template: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub walk: WalkOptions,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from(".")],
            period: PeriodPolicy::Weekly,
            depth: 2,
            overrides: DepthOverrides::new(),
            scale: DEFAULT_SCALE,
            normalization: Normalization::Global,
            ramp: ColorRamp::default(),
            template: None,
            output: None,
            json: false,
            walk: WalkOptions::default(),
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(HeatmapError::InvalidDepth(self.depth));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(HeatmapError::InvalidScale(self.scale));
        }
        if self.paths.is_empty() {
            return Err(HeatmapError::GitRepo("no repository given".to_string()));
        }
        Ok(())
    }

    pub fn classifier(&self) -> DirectoryClassifier {
        DirectoryClassifier::new(self.depth).with_overrides(self.overrides.clone())
    }

    pub fn model(&self) -> Result<MagnitudeModel> {
        Ok(MagnitudeModel::new(self.scale)?
            .with_ramp(self.ramp.clone())
            .with_normalization(self.normalization))
    }

    /// Repository names joined with ", ".
    pub fn title(&self) -> String {
        self.paths
            .iter()
            .map(|p| basename(p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{} {}.html", self.title(), self.period)))
    }
}
