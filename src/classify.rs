use crate::error::{HeatmapError, Result};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Bucket key for one directory: the repository name followed by at most
/// `depth` leading directory segments.
///
/// Equality, hashing and ordering all work on the `/`-joined path, so keys
/// sort the same way their rendered paths do.
#[derive(Debug, Clone)]
pub struct DirectoryKey {
    segments: Vec<String>,
}

impl DirectoryKey {
    pub(crate) fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn repository(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    fn joined_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.segments.iter().enumerate().flat_map(|(i, segment)| {
            let sep: &[u8] = if i == 0 { b"" } else { b"/" };
            sep.iter().chain(segment.as_bytes()).copied()
        })
    }
}

impl PartialEq for DirectoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.joined_bytes().eq(other.joined_bytes())
    }
}

impl Eq for DirectoryKey {}

impl PartialOrd for DirectoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DirectoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.joined_bytes().cmp(other.joined_bytes())
    }
}

impl Hash for DirectoryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.joined_bytes() {
            state.write_u8(byte);
        }
    }
}

impl fmt::Display for DirectoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for DirectoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

/// Per-subtree depth overrides, stored as a trie keyed by directory segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthOverrides {
    depth: Option<usize>,
    children: BTreeMap<String, DepthOverrides>,
}

impl DepthOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_none() && self.children.is_empty()
    }

    /// Set the depth for every file below `path` (relative to the repository root).
    pub fn insert(&mut self, path: &str, depth: usize) {
        let node = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .fold(self, |node, segment| {
                node.children.entry(segment.to_string()).or_default()
            });
        node.depth = Some(depth);
    }

    /// Deepest explicit depth along `dirs`, including the node reached
    /// after the final segment.
    pub fn lookup<'a, I>(&self, dirs: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        let mut depth = node.depth;
        for segment in dirs {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    depth = child.depth.or(depth);
                }
                None => break,
            }
        }
        depth
    }
}

impl FromStr for DepthOverrides {
    type Err = HeatmapError;

    /// Parses `path:depth[,path:depth...]`, e.g. `vendor:0,src/engine:3`.
    fn from_str(s: &str) -> Result<Self> {
        let mut overrides = DepthOverrides::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (path, depth) = entry
                .rsplit_once(':')
                .ok_or_else(|| HeatmapError::InvalidDepthOverride(entry.to_string()))?;
            let depth = depth
                .trim()
                .parse::<usize>()
                .map_err(|_| HeatmapError::InvalidDepthOverride(entry.to_string()))?;
            overrides.insert(path.trim(), depth);
        }
        Ok(overrides)
    }
}

/// Maps a changed file to the directory bucket it is accumulated under.
#[derive(Debug, Clone)]
pub struct DirectoryClassifier {
    depth: usize,
    overrides: DepthOverrides,
}

impl DirectoryClassifier {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            overrides: DepthOverrides::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: DepthOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn effective_depth(&self, dirs: &[&str]) -> usize {
        self.overrides
            .lookup(dirs.iter().copied())
            .unwrap_or(self.depth)
    }

    /// Returns `None` when the file's effective depth is zero.
    pub fn classify(&self, repository: &str, path: &str) -> Option<DirectoryKey> {
        let mut dirs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        dirs.pop();

        let depth = self.effective_depth(&dirs);
        if depth == 0 {
            return None;
        }

        let segments = std::iter::once(repository)
            .chain(dirs.into_iter().take(depth))
            .map(String::from)
            .collect();
        Some(DirectoryKey::new(segments))
    }
}
