use super::aggregate::Aggregate;
use crate::classify::{DirectoryClassifier, DirectoryKey};
use crate::error::Result;
use crate::git::{GitRepo, WalkOptions};
use crate::model::{Commit, FileChange};
use crate::period::{PeriodKey, PeriodPolicy};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Directory-by-period activity for one or more repositories.
///
/// Built incrementally with [`CommitIndex::add`] and read-only afterwards.
/// The global maximum is raised as aggregates grow, so it is always current.
#[derive(Debug, Clone)]
pub struct CommitIndex {
    policy: PeriodPolicy,
    classifier: DirectoryClassifier,
    directories: BTreeMap<DirectoryKey, Aggregate>,
    authors: BTreeSet<String>,
    seen: HashSet<String>,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
    maximum: u64,
}

impl CommitIndex {
    pub fn new(policy: PeriodPolicy, classifier: DirectoryClassifier) -> Self {
        Self {
            policy,
            classifier,
            directories: BTreeMap::new(),
            authors: BTreeSet::new(),
            seen: HashSet::new(),
            earliest: None,
            latest: None,
            maximum: 0,
        }
    }

    /// Walk `repo` from HEAD and add every commit in date order.
    pub fn add_repository(&mut self, repo: &GitRepo, options: &WalkOptions) -> Result<usize> {
        let name = repo.display_name();
        let history = repo.history(options)?;
        let count = history.len();
        for commit in &history {
            self.add(&name, commit)?;
        }
        info!(
            "Indexed {} commits from {} ({} directory buckets so far)",
            count,
            name,
            self.directories.len()
        );
        Ok(count)
    }

    /// Fold one commit from `repository` into the index.
    ///
    /// Re-adding a commit is a no-op for every aggregate it already reached
    /// and for the author set and time range.
    pub fn add(&mut self, repository: &str, commit: &Commit) -> Result<()> {
        // Fail before mutating anything if the timestamp cannot be bucketed.
        self.policy.key(commit.timestamp)?;

        let changes = coalesce(&commit.id, &commit.changes);
        let mut buckets: BTreeMap<DirectoryKey, Vec<&FileChange>> = BTreeMap::new();
        for change in &changes {
            match self.classifier.classify(repository, &change.path) {
                Some(key) => buckets.entry(key).or_default().push(change),
                None => debug!("{}: {} excluded by depth override", commit.id, change.path),
            }
        }

        let policy = self.policy;
        for (key, changes) in buckets {
            let aggregate = self
                .directories
                .entry(key)
                .or_insert_with(|| Aggregate::new(policy));
            if aggregate.add(commit, &changes)? {
                self.maximum = self.maximum.max(aggregate.maximum());
            }
        }

        if self.seen.insert(commit.id.clone()) {
            self.authors.insert(commit.author_name.clone());
            if self.earliest.map_or(true, |t| commit.timestamp < t) {
                self.earliest = Some(commit.timestamp);
            }
            if self.latest.map_or(true, |t| commit.timestamp > t) {
                self.latest = Some(commit.timestamp);
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> PeriodPolicy {
        self.policy
    }

    pub fn classifier(&self) -> &DirectoryClassifier {
        &self.classifier
    }

    /// Largest per-period churn of any directory, 0 when empty.
    pub fn maximum(&self) -> u64 {
        self.maximum
    }

    pub fn authors(&self) -> &BTreeSet<String> {
        &self.authors
    }

    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.earliest
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.latest
    }

    /// Distinct commits seen across all repositories.
    pub fn commit_count(&self) -> usize {
        self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    pub fn get(&self, key: &DirectoryKey) -> Option<&Aggregate> {
        self.directories.get(key)
    }

    /// Buckets in lexicographic order of their joined path.
    pub fn each_directory(&self) -> impl Iterator<Item = (&DirectoryKey, &Aggregate)> {
        self.directories.iter()
    }

    /// Every period between the earliest and latest commit, active or not.
    pub fn each_period(&self) -> impl Iterator<Item = PeriodKey> {
        let policy = self.policy;
        self.earliest
            .zip(self.latest)
            .map(move |(first, last)| policy.enumerate(first, last))
            .into_iter()
            .flatten()
    }
}

/// Merge repeated paths within one commit by summing their line counts.
fn coalesce(commit_id: &str, changes: &[FileChange]) -> Vec<FileChange> {
    let mut by_path: BTreeMap<&str, FileChange> = BTreeMap::new();
    for change in changes {
        by_path
            .entry(change.path.as_str())
            .and_modify(|merged| {
                debug!("{}: {} reported twice, summing", commit_id, change.path);
                merged.added_lines += change.added_lines;
                merged.deleted_lines += change.deleted_lines;
            })
            .or_insert_with(|| change.clone());
    }
    by_path.into_values().collect()
}
