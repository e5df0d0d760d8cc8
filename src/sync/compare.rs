//! Structural comparison of two trees
//!
//! A file is "missing" when its canonical relative path exists under the
//! origin and not under the destination. Nothing else is compared: a
//! destination file with the same path counts as synchronized even if its
//! size, age or content differ.

use crate::config::SyncSession;
use crate::error::Result;
use crate::fs::{FileSet, RelativePath, ScanConfig, Scanner, SkippedEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Origin-only paths, sorted lexicographically
///
/// A snapshot taken at analysis time; it does not follow later changes on
/// disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MissingSet {
    paths: Vec<RelativePath>,
}

impl MissingSet {
    /// `origin` minus `destination`
    pub fn diff(origin: &FileSet, destination: &FileSet) -> Self {
        let mut paths: Vec<RelativePath> = origin
            .iter()
            .filter(|path| !destination.contains(path))
            .cloned()
            .collect();
        paths.sort();

        Self { paths }
    }

    /// Number of missing files
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when the destination already has every origin path
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Check membership
    pub fn contains(&self, path: &RelativePath) -> bool {
        self.paths.binary_search(path).is_ok()
    }

    /// Iterate in lexicographic order
    pub fn iter(&self) -> std::slice::Iter<'_, RelativePath> {
        self.paths.iter()
    }

    /// Sorted paths
    pub fn as_slice(&self) -> &[RelativePath] {
        &self.paths
    }

    /// Consume into the sorted path list
    pub fn into_vec(self) -> Vec<RelativePath> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a MissingSet {
    type Item = &'a RelativePath;
    type IntoIter = std::slice::Iter<'a, RelativePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Shorthand for [`MissingSet::diff`]
pub fn diff(origin: &FileSet, destination: &FileSet) -> MissingSet {
    MissingSet::diff(origin, destination)
}

/// Result of comparing two trees
#[derive(Debug, Clone, Serialize)]
pub struct SyncAnalysis {
    /// Origin root
    pub origin: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Files under origin
    pub origin_count: usize,
    /// Files under destination
    pub dest_count: usize,
    /// Origin files already present by path in destination
    pub already_present: usize,
    /// Files to copy
    pub missing: MissingSet,
    /// Entries left out of either scan
    pub skipped: Vec<SkippedEntry>,
    /// Time spent indexing and diffing
    pub duration: Duration,
}

impl SyncAnalysis {
    /// Check if there is anything to copy
    pub fn has_changes(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("=== Analysis ===");
        println!("Origin:            {}", self.origin.display());
        println!("Destination:       {}", self.destination.display());
        println!("Origin files:      {}", self.origin_count);
        println!("Destination files: {}", self.dest_count);
        println!("Already present:   {}", self.already_present);
        println!("Missing:           {}", self.missing.len());
        println!("Duration:          {:.2?}", self.duration);

        if !self.skipped.is_empty() {
            println!("\nSkipped while indexing: {}", self.skipped.len());
            for entry in &self.skipped {
                println!("  {} - {}", entry.path.display(), entry.reason);
            }
        }
    }
}

/// Indexes two trees and computes what the destination lacks
pub struct Comparator {
    scanner: Scanner,
}

impl Comparator {
    /// Create with the given scan settings
    pub fn new(scan_config: ScanConfig) -> Result<Self> {
        Ok(Self {
            scanner: Scanner::new(scan_config)?,
        })
    }

    /// Create with scan settings taken from a session
    pub fn for_session(session: &SyncSession) -> Result<Self> {
        Self::new(ScanConfig {
            follow_symlinks: session.follow_symlinks,
            max_depth: None,
            exclude_patterns: session.exclude_patterns.clone(),
            policy: session.traversal,
        })
    }

    /// Index both trees and diff them
    ///
    /// Both scans run on the rayon pool; the call returns once both are done.
    /// Any indexing failure of either tree aborts the analysis.
    pub fn analyze(&self, origin: &Path, destination: &Path) -> Result<SyncAnalysis> {
        let start_time = Instant::now();

        let (origin_set, dest_set) = rayon::join(
            || self.scanner.scan(origin),
            || self.scanner.scan(destination),
        );
        let origin_set = origin_set?;
        let dest_set = dest_set?;

        let missing = MissingSet::diff(&origin_set, &dest_set);

        let mut skipped = origin_set.skipped.clone();
        skipped.extend(dest_set.skipped.iter().cloned());

        tracing::info!(
            origin = origin_set.len(),
            destination = dest_set.len(),
            missing = missing.len(),
            "Analysis complete"
        );

        Ok(SyncAnalysis {
            origin: origin.to_path_buf(),
            destination: destination.to_path_buf(),
            origin_count: origin_set.len(),
            dest_count: dest_set.len(),
            already_present: origin_set.len() - missing.len(),
            missing,
            skipped,
            duration: start_time.elapsed(),
        })
    }
}

/// Missing paths between two trees with default scan settings
pub fn get_missing_files(origin: &Path, destination: &Path) -> Result<MissingSet> {
    let comparator = Comparator::new(ScanConfig::default())?;
    Ok(comparator.analyze(origin, destination)?.missing)
}
