use crate::error::{HeatmapError, Result};
use crate::model::{Commit, FileChange};
use crate::util::basename;
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use similar::{ChangeTag, TextDiff};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// How much of the history [`GitRepo::history`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub include_merges: bool,
    pub binary: bool,
    pub progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include_merges: true,
            binary: false,
            progress: true,
        }
    }
}

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Discover the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HeatmapError::GitRepo(format!(
                "No such path: {}",
                path.display()
            )));
        }
        let repo = discover(path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!("Opened repository at {}", path.display());

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Basename of the work tree, used as the first segment of every bucket.
    pub fn display_name(&self) -> String {
        basename(&self.path)
    }

    /// Every commit reachable from HEAD with its diff against the first
    /// parent (or the empty tree), oldest first.
    pub fn history(&self, options: &WalkOptions) -> Result<Vec<Commit>> {
        let mut head = self.repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        let pb = if options.progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {pos}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Reading {}...", self.display_name()));

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
            stack.extend(parents.iter().copied());

            if !options.include_merges && parents.len() > 1 {
                continue;
            }

            let author = commit.author()?;
            let secs = author.time()?.seconds;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| HeatmapError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

            let changes = match parents.first() {
                Some(parent_id) => self.diff_against_parent(commit_id, *parent_id, options.binary)?,
                None => self.diff_against_empty_tree(commit_id, options.binary)?,
            };

            commits.push(Commit {
                id: commit_id.to_string(),
                author_name: author.name.to_string(),
                timestamp,
                changes,
            });
            pb.inc(1);
        }

        pb.finish_and_clear();
        commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        info!("Read {} commits from {}", commits.len(), self.path.display());
        Ok(commits)
    }

    fn diff_against_parent(
        &self,
        commit_id: ObjectId,
        parent_id: ObjectId,
        binary: bool,
    ) -> Result<Vec<FileChange>> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let parent_tree = self.repo.find_commit(parent_id)?.tree()?;

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), diff_options())?;
        self.collect_changes(changes, binary)
    }

    fn diff_against_empty_tree(&self, commit_id: ObjectId, binary: bool) -> Result<Vec<FileChange>> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let changes: Vec<ChangeDetached> =
            self.repo.diff_tree_to_tree(None, Some(&commit_tree), diff_options())?;
        self.collect_changes(changes, binary)
    }

    fn collect_changes(&self, changes: Vec<ChangeDetached>, binary: bool) -> Result<Vec<FileChange>> {
        let mut files = Vec::new();
        for change in changes {
            if let Some(file) = self.file_change(change, binary)? {
                files.push(file);
            }
        }
        Ok(files)
    }

    /// Line counts for one entry, or `None` for trees, submodules and
    /// (unless requested) binary blobs.
    fn file_change(&self, change: ChangeDetached, binary: bool) -> Result<Option<FileChange>> {
        let file = match change {
            ChangeDetached::Addition {
                id,
                location,
                entry_mode,
                ..
            } => {
                if !is_file(entry_mode) {
                    return Ok(None);
                }
                let data = self.blob(id)?;
                self.counted(location.to_string(), binary, &[data.as_slice()], || {
                    (count_lines(&data), 0)
                })
            }
            ChangeDetached::Deletion {
                id,
                location,
                entry_mode,
                ..
            } => {
                if !is_file(entry_mode) {
                    return Ok(None);
                }
                let data = self.blob(id)?;
                self.counted(location.to_string(), binary, &[data.as_slice()], || {
                    (0, count_lines(&data))
                })
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if !is_file(entry_mode) {
                    return Ok(None);
                }
                let old = self.blob(previous_id)?;
                let new = self.blob(id)?;
                self.counted(location.to_string(), binary, &[old.as_slice(), new.as_slice()], || {
                    line_diff(&old, &new)
                })
            }
            // Rewrite tracking is off, so moves arrive as a deletion plus an addition.
            ChangeDetached::Rewrite { .. } => None,
        };
        Ok(file)
    }

    fn counted(
        &self,
        path: String,
        binary: bool,
        blobs: &[&[u8]],
        lines: impl FnOnce() -> (u64, u64),
    ) -> Option<FileChange> {
        let is_binary = blobs.iter().any(|data| is_binary_data(data));
        if is_binary && !binary {
            return None;
        }
        let (added, deleted) = if is_binary { (0, 0) } else { lines() };
        Some(FileChange::new(path, added, deleted))
    }

    fn blob(&self, id: ObjectId) -> Result<Vec<u8>> {
        let object = self.repo.find_object(id)?;
        Ok(object.data.clone())
    }
}

/// Plain tree diff without rename detection: a moved file leaves its
/// lines in the old directory and brings them into the new one.
fn diff_options() -> gix::diff::Options {
    gix::diff::Options::default().with_rewrites(None)
}

fn is_file(mode: gix::objs::tree::EntryMode) -> bool {
    !mode.is_tree() && !mode.is_commit()
}

fn is_binary_data(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

fn count_lines(data: &[u8]) -> u64 {
    String::from_utf8_lossy(data).lines().count() as u64
}

fn line_diff(old: &[u8], new: &[u8]) -> (u64, u64) {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(old.as_ref(), new.as_ref());

    let (mut added, mut deleted) = (0u64, 0u64);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}
