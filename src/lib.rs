//! Turns git history into a directory-by-period activity matrix.
//!
//! [`CommitIndex`] folds commits into per-directory [`Aggregate`]s keyed by
//! [`PeriodKey`]; [`MagnitudeModel`] maps each cell to an intensity and a
//! color for rendering.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod heat;
pub mod model;
pub mod period;
pub mod util;

pub use classify::{DepthOverrides, DirectoryClassifier, DirectoryKey};
pub use config::HeatmapConfig;
pub use error::{HeatmapError, Result};
pub use heat::{Aggregate, ColorRamp, CommitIndex, MagnitudeModel, Normalization, PeriodStats};
pub use model::{Commit, FileChange, HeatmapReport};
pub use period::{PeriodKey, PeriodPolicy, Periods};
