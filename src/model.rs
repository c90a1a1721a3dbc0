use crate::period::{PeriodKey, PeriodPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Line counts for one path in a commit's diff against its first parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub added_lines: u64,
    pub deleted_lines: u64,
}

impl FileChange {
    pub fn new(path: impl Into<String>, added_lines: u64, deleted_lines: u64) -> Self {
        Self {
            path: path.into(),
            added_lines,
            deleted_lines,
        }
    }

    pub fn churn(&self) -> u64 {
        self.added_lines + self.deleted_lines
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub author_name: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<FileChange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub period: PeriodKey,
    pub commits: u32,
    pub additions: u64,
    pub deletions: u64,
    pub churn: u64,
    pub files_changed: u32,
    pub magnitude: f64,
    pub intensity: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryRow {
    pub path: String,
    pub segments: Vec<String>,
    pub total_commits: usize,
    pub maximum: u64,
    pub cells: Vec<HeatmapCell>,
}

/// Everything the renderer needs: one row per directory bucket, one cell per period.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReport {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub period: PeriodPolicy,
    pub depth: usize,
    pub scale: f64,
    pub commits: usize,
    pub authors: Vec<String>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub maximum: u64,
    pub periods: Vec<PeriodKey>,
    pub directories: Vec<DirectoryRow>,
}
