use crate::error::Result;
use crate::model::{Commit, FileChange};
use crate::period::{PeriodKey, PeriodPolicy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Accumulated activity of one directory bucket within one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub commits: u32,
    pub additions: u64,
    pub deletions: u64,
    pub churn: u64,
    pub files_changed: u32,
}

impl PeriodStats {
    /// Net lines touched: a modified line shows up as one addition and one
    /// deletion, so it is counted once.
    pub fn lines(&self) -> f64 {
        self.churn as f64 / 2.0
    }

    fn absorb(&mut self, other: &PeriodStats) {
        self.commits += other.commits;
        self.additions += other.additions;
        self.deletions += other.deletions;
        self.churn += other.churn;
        self.files_changed += other.files_changed;
    }
}

/// Running statistics for one directory bucket across all periods.
///
/// `maximum` is the largest per-period churn and is kept current on every
/// fold, so reads never need to recompute it.
#[derive(Debug, Clone)]
pub struct Aggregate {
    policy: PeriodPolicy,
    commits: HashSet<String>,
    periods: BTreeMap<PeriodKey, PeriodStats>,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
    maximum: u64,
}

impl Aggregate {
    pub fn new(policy: PeriodPolicy) -> Self {
        Self {
            policy,
            commits: HashSet::new(),
            periods: BTreeMap::new(),
            earliest: None,
            latest: None,
            maximum: 0,
        }
    }

    /// Fold this bucket's share of `commit` in. `changes` must already be
    /// the commit's files that classify into this bucket, one entry per path.
    ///
    /// Returns `false` without touching anything if the commit was folded
    /// in before.
    pub fn add(&mut self, commit: &Commit, changes: &[&FileChange]) -> Result<bool> {
        if self.commits.contains(&commit.id) {
            return Ok(false);
        }
        let key = self.policy.key(commit.timestamp)?;
        self.commits.insert(commit.id.clone());

        let stats = self.periods.entry(key).or_default();
        stats.commits += 1;
        for change in changes {
            stats.additions += change.added_lines;
            stats.deletions += change.deleted_lines;
            stats.churn += change.churn();
        }
        stats.files_changed += u32::try_from(changes.len()).unwrap_or(u32::MAX);

        self.maximum = self.maximum.max(stats.churn);
        if self.earliest.map_or(true, |t| commit.timestamp < t) {
            self.earliest = Some(commit.timestamp);
        }
        if self.latest.map_or(true, |t| commit.timestamp > t) {
            self.latest = Some(commit.timestamp);
        }
        Ok(true)
    }

    pub fn policy(&self) -> PeriodPolicy {
        self.policy
    }

    /// Number of distinct commits folded into this bucket.
    pub fn size(&self) -> usize {
        self.commits.len()
    }

    pub fn contains(&self, commit_id: &str) -> bool {
        self.commits.contains(commit_id)
    }

    pub fn get(&self, period: &PeriodKey) -> Option<&PeriodStats> {
        self.periods.get(period)
    }

    /// Active periods in chronological order.
    pub fn periods(&self) -> impl Iterator<Item = (&PeriodKey, &PeriodStats)> {
        self.periods.iter()
    }

    pub fn maximum(&self) -> u64 {
        self.maximum
    }

    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.earliest
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.latest
    }

    pub fn totals(&self) -> PeriodStats {
        let mut totals = PeriodStats::default();
        for stats in self.periods.values() {
            totals.absorb(stats);
        }
        totals
    }
}
