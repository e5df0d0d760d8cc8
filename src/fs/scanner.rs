//! Tree indexer
//!
//! Walks a directory tree and collects the canonical relative path of every
//! regular file. Directories are descended, every other entry kind is
//! ignored. Problems below the root are handled by [`TraversalPolicy`];
//! problems with the root itself always fail the scan.

use crate::config::TraversalPolicy;
use crate::error::{FileXferError, IoResultExt, Result};
use crate::fs::RelativePath;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::{DirEntry, WalkDir};

/// An entry left out of a scan under [`TraversalPolicy::SkipAndRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Path as seen by the walker
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Set of regular files found under a root
///
/// Iteration order is unspecified; use [`FileSet::sorted`] when order
/// matters.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Root path that was scanned
    pub root: PathBuf,
    files: HashSet<RelativePath>,
    /// Entries that could not be indexed
    pub skipped: Vec<SkippedEntry>,
    /// Non-regular entries passed over (symlinks, sockets, devices...)
    pub ignored: usize,
    /// Scan duration
    pub scan_duration: Duration,
}

impl FileSet {
    /// Empty set for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashSet::new(),
            skipped: Vec::new(),
            ignored: 0,
            scan_duration: Duration::ZERO,
        }
    }

    /// Add a path; returns false if it was already present
    pub fn insert(&mut self, path: RelativePath) -> bool {
        self.files.insert(path)
    }

    /// Check membership by canonical path
    pub fn contains(&self, path: &RelativePath) -> bool {
        self.files.contains(path)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no file was found
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &RelativePath> {
        self.files.iter()
    }

    /// All paths in lexicographic order
    pub fn sorted(&self) -> Vec<RelativePath> {
        let mut paths: Vec<_> = self.files.iter().cloned().collect();
        paths.sort();
        paths
    }
}

impl<P: Into<RelativePath>> Extend<P> for FileSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.files.extend(iter.into_iter().map(Into::into));
    }
}

/// Configuration for directory scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Maximum depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Exclude patterns
    pub exclude_patterns: Vec<String>,
    /// What to do with unreadable entries
    pub policy: TraversalPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: None,
            exclude_patterns: Vec::new(),
            policy: TraversalPolicy::FailFast,
        }
    }
}

/// Directory tree indexer
pub struct Scanner {
    config: ScanConfig,
    exclude_matcher: GlobSet,
}

impl Scanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Result<Self> {
        let exclude_matcher = Self::build_globset(&config.exclude_patterns)?;

        Ok(Self {
            config,
            exclude_matcher,
        })
    }

    /// Build a GlobSet from patterns
    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                FileXferError::ConfigError(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| FileXferError::ConfigError(format!("Failed to build glob set: {}", e)))
    }

    /// Index every regular file under `root`
    pub fn scan(&self, root: &Path) -> Result<FileSet> {
        let start_time = Instant::now();

        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileXferError::NotFound(root.to_path_buf()));
            }
            Err(e) => return Err(FileXferError::io(root, e)),
        };
        if !metadata.is_dir() {
            return Err(FileXferError::NotADirectory(root.to_path_buf()));
        }
        // An unreadable root is never a "skippable" entry.
        std::fs::read_dir(root).with_path(root)?;

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .min_depth(1);

        if let Some(max_depth) = self.config.max_depth {
            walker = walker.max_depth(max_depth);
        }

        let mut set = FileSet::new(root);

        for entry in walker {
            match entry {
                Ok(entry) => self.process_entry(&entry, root, &mut set)?,
                Err(err) => self.record(&mut set, Self::walk_error(err))?,
            }
        }

        set.scan_duration = start_time.elapsed();

        tracing::debug!(
            root = %root.display(),
            files = set.len(),
            skipped = set.skipped.len(),
            ignored = set.ignored,
            "Indexed tree in {:.2?}",
            set.scan_duration
        );

        Ok(set)
    }

    /// Process a single directory entry
    fn process_entry(&self, entry: &DirEntry, root: &Path, set: &mut FileSet) -> Result<()> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return Ok(());
        }

        if !file_type.is_file() {
            tracing::trace!(path = %entry.path().display(), "Ignoring non-regular entry");
            set.ignored += 1;
            return Ok(());
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let Some(relative) = RelativePath::from_path(relative) else {
            return self.record(set, FileXferError::NonUtf8Path(entry.path().to_path_buf()));
        };

        if self.exclude_matcher.is_match(relative.as_str()) {
            return Ok(());
        }

        set.insert(relative);
        Ok(())
    }

    /// Apply the traversal policy to a problem entry
    fn record(&self, set: &mut FileSet, err: FileXferError) -> Result<()> {
        match self.config.policy {
            TraversalPolicy::FailFast => Err(err),
            TraversalPolicy::SkipAndRecord => {
                tracing::warn!("Skipping entry: {}", err);
                set.skipped.push(SkippedEntry {
                    path: err.path().cloned().unwrap_or_default(),
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }

    fn walk_error(err: walkdir::Error) -> FileXferError {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let kind = err.io_error().map(|e| e.kind());
        let message = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };

        FileXferError::Traversal {
            path,
            message,
            kind,
        }
    }
}

/// Index `root` with default settings
pub fn index(root: &Path) -> Result<FileSet> {
    Scanner::new(ScanConfig::default())?.scan(root)
}
