//! Batch copy runner
//!
//! Copies a list of relative paths from one root to another, one file at a
//! time in lexicographic order. A failing file is recorded and the batch
//! moves on; every processed file produces exactly one progress update and
//! the batch ends with exactly one completion summary.

use crate::error::FailureKind;
use crate::fs::{CopyOptions, FileCopier, RelativePath};
use crossbeam::channel::Sender;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CopyOutcome {
    /// Content is in place under the target
    Success {
        /// Bytes written
        bytes: u64,
        /// Source timestamps were applied
        times_preserved: bool,
    },
    /// The copy failed; nothing was left under the final name
    Failure {
        /// Classified cause
        kind: FailureKind,
        /// Human-readable error
        reason: String,
    },
}

/// Outcome of one path in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Relative path that was processed
    pub path: RelativePath,
    /// Result of the copy
    #[serde(flatten)]
    pub outcome: CopyOutcome,
}

impl FileOutcome {
    /// Check if the file was copied
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CopyOutcome::Success { .. })
    }

    /// One-line outcome: `OK: <path>` or `ERROR: <path> (<reason>)`
    pub fn message(&self) -> String {
        match &self.outcome {
            CopyOutcome::Success { .. } => format!("OK: {}", self.path),
            CopyOutcome::Failure { reason, .. } => format!("ERROR: {} ({})", self.path, reason),
        }
    }
}

/// Sent once per processed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// 1-based index of the file just processed
    pub current: usize,
    /// Files in the batch
    pub total: usize,
    /// Outcome line for that file
    pub message: String,
}

/// Sent once when a batch ends, after the last progress update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    /// Files copied
    pub success_count: usize,
    /// Files that failed
    pub failure_count: usize,
    /// Directory the files were copied into
    pub target: PathBuf,
}

/// Event streamed from a background batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// One file was processed
    Progress(ProgressUpdate),
    /// The batch is over
    Finished(CompletionSummary),
}

/// Receiver of batch notifications
///
/// Called from the thread running the batch, in order.
pub trait ProgressSink {
    /// A file was processed
    fn on_progress(&self, update: &ProgressUpdate);

    /// The batch ended
    fn on_finished(&self, summary: &CompletionSummary);
}

/// Sink that drops every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate) {}

    fn on_finished(&self, _summary: &CompletionSummary) {}
}

// A hung-up receiver does not stop the batch.
impl ProgressSink for Sender<BatchEvent> {
    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = self.send(BatchEvent::Progress(update.clone()));
    }

    fn on_finished(&self, summary: &CompletionSummary) {
        let _ = self.send(BatchEvent::Finished(summary.clone()));
    }
}

/// A file that could not be copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Relative path
    pub path: RelativePath,
    /// Classified cause
    pub kind: FailureKind,
    /// Human-readable error
    pub reason: String,
}

/// Batch copy result
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Directory files were copied into
    pub target: PathBuf,
    /// Files copied
    pub success_count: usize,
    /// Files that failed
    pub failures: Vec<BatchFailure>,
    /// Per-file outcomes in processing order
    pub outcomes: Vec<FileOutcome>,
    /// Total bytes written
    pub bytes_copied: u64,
    /// Wall time of the batch
    pub duration: Duration,
    /// The batch was stopped before the end
    pub cancelled: bool,
    /// Paths never reached because of cancellation
    pub not_attempted: Vec<RelativePath>,
}

impl BatchResult {
    fn new(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            success_count: 0,
            failures: Vec::new(),
            outcomes: Vec::new(),
            bytes_copied: 0,
            duration: Duration::ZERO,
            cancelled: false,
            not_attempted: Vec::new(),
        }
    }

    /// Number of failed files
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Files actually processed
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Every file was copied and the batch ran to the end
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Completion signal for this result
    pub fn summary(&self) -> CompletionSummary {
        CompletionSummary {
            success_count: self.success_count,
            failure_count: self.failures.len(),
            target: self.target.clone(),
        }
    }

    /// Average throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.bytes_copied as f64 / secs
        } else {
            0.0
        }
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Copy Summary ===");
        println!("Target:          {}", self.target.display());
        println!("Files copied:    {}", self.success_count);
        println!("Files failed:    {}", self.failures.len());
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied, humansize::BINARY));
        println!("Duration:        {}", humantime::format_duration(round_to_millis(self.duration)));
        println!("Throughput:      {}/s", humansize::format_size(self.throughput() as u64, humansize::BINARY));

        if self.cancelled {
            println!("\nCancelled; {} file(s) not attempted", self.not_attempted.len());
        }

        if !self.failures.is_empty() {
            println!("\nFailures: {}", self.failures.len());
            for failure in &self.failures {
                println!("  {} - [{}] {}", failure.path, failure.kind, failure.reason);
            }
        }
    }
}

/// Drop sub-millisecond noise before formatting a duration
pub(crate) fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis().min(u64::MAX as u128) as u64)
}

/// Runs a copy batch on the calling thread
pub struct BatchRunner {
    copier: FileCopier,
    cancelled: Arc<AtomicBool>,
}

impl BatchRunner {
    /// Create a runner copying with the given options
    pub fn new(options: CopyOptions) -> Self {
        Self {
            copier: FileCopier::new(options),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get cancellation flag for external control
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Stop before the next file
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Copy every path from `origin_root` to `target_root`
    ///
    /// Paths are sorted and deduplicated first. Per-file errors are recorded
    /// in the result, never returned. The flag is checked between files, so
    /// a file in flight always finishes.
    pub fn run(
        &self,
        paths: &[RelativePath],
        origin_root: &Path,
        target_root: &Path,
        sink: &dyn ProgressSink,
    ) -> BatchResult {
        let start_time = Instant::now();

        let mut queue = paths.to_vec();
        queue.sort();
        queue.dedup();

        let total = queue.len();
        let mut result = BatchResult::new(target_root);

        tracing::info!(
            total,
            mode = self.copier.options().mode.name(),
            target = %target_root.display(),
            "Starting copy batch"
        );

        let mut queue = queue.into_iter();
        let mut current = 0;

        while let Some(path) = queue.next() {
            if self.is_cancelled() {
                tracing::warn!(remaining = total - current, "Copy batch cancelled");
                result.cancelled = true;
                result.not_attempted.push(path);
                result.not_attempted.extend(queue.by_ref());
                break;
            }

            current += 1;
            let outcome = self.copy_one(&path, origin_root, target_root);

            match &outcome.outcome {
                CopyOutcome::Success { bytes, .. } => {
                    result.success_count += 1;
                    result.bytes_copied += bytes;
                }
                CopyOutcome::Failure { kind, reason } => {
                    result.failures.push(BatchFailure {
                        path: path.clone(),
                        kind: *kind,
                        reason: reason.clone(),
                    });
                }
            }

            sink.on_progress(&ProgressUpdate {
                current,
                total,
                message: outcome.message(),
            });
            result.outcomes.push(outcome);
        }

        result.duration = start_time.elapsed();

        tracing::info!(
            copied = result.success_count,
            failed = result.failures.len(),
            "Copy batch finished"
        );

        sink.on_finished(&result.summary());

        result
    }

    fn copy_one(&self, path: &RelativePath, origin_root: &Path, target_root: &Path) -> FileOutcome {
        let source = path.to_native(origin_root);
        let dest = path.to_native(target_root);

        let outcome = match self.copier.copy(&source, &dest) {
            Ok(stats) => {
                tracing::info!(path = %path, bytes = stats.bytes_copied, "Copied");
                CopyOutcome::Success {
                    bytes: stats.bytes_copied,
                    times_preserved: stats.times_preserved,
                }
            }
            Err(e) => {
                let kind = e.failure_kind();
                tracing::warn!(path = %path, %kind, "Copy failed: {}", e);
                CopyOutcome::Failure {
                    kind,
                    reason: e.to_string(),
                }
            }
        };

        FileOutcome {
            path: path.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn paths(names: &[&str]) -> Vec<RelativePath> {
        names.iter().copied().map(RelativePath::from).collect()
    }

    fn drain(rx: &crossbeam::channel::Receiver<BatchEvent>) -> Vec<BatchEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_copies_in_sorted_order() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_file(src.path(), "b.txt", b"b");
        create_test_file(src.path(), "a.txt", b"a");
        create_test_file(src.path(), "sub/c.txt", b"c");

        let (tx, rx) = unbounded();
        let runner = BatchRunner::new(CopyOptions::default());
        let result = runner.run(&paths(&["sub/c.txt", "b.txt", "a.txt", "b.txt"]), src.path(), dst.path(), &tx);

        assert!(result.is_success());
        assert_eq!(result.success_count, 3);
        assert_eq!(result.bytes_copied, 3);
        assert_eq!(std::fs::read(dst.path().join("sub/c.txt")).unwrap(), b"c");

        let events = drain(&rx);
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            BatchEvent::Progress(ProgressUpdate {
                current: 1,
                total: 3,
                message: "OK: a.txt".to_string(),
            })
        );
        assert_eq!(
            events[2],
            BatchEvent::Progress(ProgressUpdate {
                current: 3,
                total: 3,
                message: "OK: sub/c.txt".to_string(),
            })
        );
        assert_eq!(
            events[3],
            BatchEvent::Finished(CompletionSummary {
                success_count: 3,
                failure_count: 0,
                target: dst.path().to_path_buf(),
            })
        );
    }

    #[test]
    fn test_vanished_source_is_recorded() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_file(src.path(), "a.txt", b"a");

        let (tx, rx) = unbounded();
        let runner = BatchRunner::new(CopyOptions::default());
        let result = runner.run(&paths(&["a.txt", "gone.txt"]), src.path(), dst.path(), &tx);

        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failures[0].path.as_str(), "gone.txt");
        assert_eq!(result.failures[0].kind, FailureKind::SourceMissing);
        assert!(!dst.path().join("gone.txt").exists());

        let events = drain(&rx);
        assert_eq!(events.len(), 3);
        match &events[1] {
            BatchEvent::Progress(update) => {
                assert_eq!(update.current, 2);
                assert!(update.message.starts_with("ERROR: gone.txt ("));
                assert!(update.message.ends_with(')'));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            &events[2],
            BatchEvent::Finished(CompletionSummary { success_count: 1, failure_count: 1, .. })
        ));
    }

    #[test]
    fn test_parent_components_cannot_escape_target() {
        let base = TempDir::new().unwrap();
        let origin = base.path().join("origin");
        let target = base.path().join("target");
        create_test_file(&origin, "kept.txt", b"k");
        create_test_file(base.path(), "escape.txt", b"outside");
        std::fs::create_dir_all(&target).unwrap();

        let runner = BatchRunner::new(CopyOptions::default());
        let result = runner.run(&paths(&["../escape.txt"]), &origin, &target, &NoProgress);

        assert_eq!(result.success_count, 0);
        assert_eq!(result.failures[0].kind, FailureKind::SourceMissing);
        assert_eq!(std::fs::read(base.path().join("escape.txt")).unwrap(), b"outside");
        assert!(!target.join("escape.txt").exists());

        // Resolved below the roots, an existing file is copied in place
        let result = runner.run(&paths(&["../kept.txt"]), &origin, &target, &NoProgress);
        assert!(result.is_success());
        assert_eq!(std::fs::read(target.join("kept.txt")).unwrap(), b"k");
        assert!(!base.path().join("kept.txt").exists());
    }

    #[test]
    fn test_destination_file_named_like_staging_survives() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_test_file(src.path(), "a.txt", b"new");
        create_test_file(dst.path(), ".a.txt.fxpart", b"precious");

        let runner = BatchRunner::new(CopyOptions::default());
        let result = runner.run(&paths(&["a.txt"]), src.path(), dst.path(), &NoProgress);

        assert!(result.is_success());
        assert_eq!(std::fs::read(dst.path().join(".a.txt.fxpart")).unwrap(), b"precious");
        assert_eq!(std::fs::read(dst.path().join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for name in ["a.txt", "blocked/x.txt", "c.txt", "d.txt"] {
            create_test_file(src.path(), name, name.as_bytes());
        }
        // A regular file where the runner needs a directory
        create_test_file(dst.path(), "blocked", b"not a directory");

        let runner = BatchRunner::new(CopyOptions::default());
        let all = paths(&["a.txt", "blocked/x.txt", "c.txt", "d.txt"]);
        let result = runner.run(&all, src.path(), dst.path(), &NoProgress);

        assert_eq!(result.success_count, 3);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.success_count + result.failure_count(), all.len());
        assert_eq!(result.failures[0].path.as_str(), "blocked/x.txt");
        assert!(dst.path().join("d.txt").exists());
        assert!(!result.is_success());
    }

    #[test]
    fn test_empty_batch_still_finishes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let (tx, rx) = unbounded();
        let result = BatchRunner::new(CopyOptions::default()).run(&[], src.path(), dst.path(), &tx);

        assert_eq!(result.processed(), 0);
        assert_eq!(
            drain(&rx),
            vec![BatchEvent::Finished(CompletionSummary {
                success_count: 0,
                failure_count: 0,
                target: dst.path().to_path_buf(),
            })]
        );
    }

    struct CancelAfterFirst {
        flag: Arc<AtomicBool>,
        progress: std::sync::Mutex<Vec<usize>>,
        finished: AtomicBool,
    }

    impl ProgressSink for CancelAfterFirst {
        fn on_progress(&self, update: &ProgressUpdate) {
            self.progress.lock().unwrap().push(update.current);
            self.flag.store(true, Ordering::SeqCst);
        }

        fn on_finished(&self, _summary: &CompletionSummary) {
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_cancel_between_files() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            create_test_file(src.path(), name, b"data");
        }

        let runner = BatchRunner::new(CopyOptions::default());
        let sink = CancelAfterFirst {
            flag: runner.cancellation_flag(),
            progress: std::sync::Mutex::new(Vec::new()),
            finished: AtomicBool::new(false),
        };
        let result = runner.run(&paths(&["a.txt", "b.txt", "c.txt"]), src.path(), dst.path(), &sink);

        assert!(result.cancelled);
        assert!(!result.is_success());
        assert_eq!(result.success_count, 1);
        assert_eq!(result.not_attempted, paths(&["b.txt", "c.txt"]));
        assert_eq!(*sink.progress.lock().unwrap(), vec![1]);
        assert!(sink.finished.load(Ordering::SeqCst));
        assert!(!dst.path().join("b.txt").exists());
    }

    #[test]
    fn test_outcome_messages() {
        let ok = FileOutcome {
            path: RelativePath::new("dir/a.txt"),
            outcome: CopyOutcome::Success {
                bytes: 1,
                times_preserved: true,
            },
        };
        let failed = FileOutcome {
            path: RelativePath::new("b.txt"),
            outcome: CopyOutcome::Failure {
                kind: FailureKind::StorageFull,
                reason: "no space left".to_string(),
            },
        };

        assert_eq!(ok.message(), "OK: dir/a.txt");
        assert_eq!(failed.message(), "ERROR: b.txt (no space left)");
    }
}
