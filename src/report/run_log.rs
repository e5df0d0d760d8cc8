//! Plain-text run log
//!
//! One file per batch, written into the copy target and named after the
//! local time the run finished.

use crate::config::SyncSession;
use crate::core::{round_to_millis, BatchResult};
use crate::error::{IoResultExt, Result};
use crate::sync::SyncAnalysis;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name prefix of run logs
pub const LOG_PREFIX: &str = "filextransfer_log_";

/// Record of one analyze-and-copy run
#[derive(Debug, Clone)]
pub struct RunLog {
    /// When the log was produced
    pub created_at: DateTime<Local>,
    /// Origin tree (A)
    pub origin: PathBuf,
    /// Destination the origin was compared against (B)
    pub destination: PathBuf,
    /// Directory the files were copied into
    pub target: PathBuf,
    /// Files found missing by the analysis
    pub total_missing: usize,
    /// Files copied
    pub success_count: usize,
    /// Files that failed
    pub failure_count: usize,
    /// Paths skipped by cancellation
    pub not_attempted: usize,
    /// Batch wall time
    pub duration: Duration,
    /// Outcome lines in processing order
    pub entries: Vec<String>,
}

impl RunLog {
    /// Build the log for a finished batch
    pub fn new(session: &SyncSession, analysis: &SyncAnalysis, result: &BatchResult) -> Self {
        Self {
            created_at: Local::now(),
            origin: session.origin.clone(),
            destination: session.destination.clone(),
            target: result.target.clone(),
            total_missing: analysis.missing.len(),
            success_count: result.success_count,
            failure_count: result.failure_count(),
            not_attempted: result.not_attempted.len(),
            duration: result.duration,
            entries: result.outcomes.iter().map(|o| o.message()).collect(),
        }
    }

    /// Override the timestamp used for the file name
    pub fn with_timestamp(mut self, created_at: DateTime<Local>) -> Self {
        self.created_at = created_at;
        self
    }

    /// `filextransfer_log_<YYYYmmdd_HHMMSS>.txt`
    pub fn file_name(&self) -> String {
        format!("{}{}.txt", LOG_PREFIX, self.created_at.format("%Y%m%d_%H%M%S"))
    }

    /// Log content
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "FileXtransfer log");
        let _ = writeln!(out, "Origin (A): {}", self.origin.display());
        let _ = writeln!(out, "Analyzed destination (B): {}", self.destination.display());
        let _ = writeln!(out, "Copy target: {}", self.target.display());
        let _ = writeln!(out, "Total missing: {}", self.total_missing);
        let _ = writeln!(out, "OK: {}, ERRORS: {}", self.success_count, self.failure_count);
        if self.not_attempted > 0 {
            let _ = writeln!(out, "Cancelled, not attempted: {}", self.not_attempted);
        }
        let _ = writeln!(
            out,
            "Duration: {}",
            humantime::format_duration(round_to_millis(self.duration))
        );
        out.push('\n');

        for line in &self.entries {
            out.push_str(line);
            out.push('\n');
        }

        out
    }

    /// Write into `dir` and return the log's path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render()).with_path(&path)?;

        tracing::info!(path = %path.display(), "Run log written");
        Ok(path)
    }

    /// Write into the copy target
    pub fn write(&self) -> Result<PathBuf> {
        self.write_to(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BatchRunner, NoProgress};
    use crate::fs::{CopyOptions, ScanConfig};
    use crate::sync::Comparator;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn scenario() -> (TempDir, TempDir, SyncSession, SyncAnalysis, BatchResult) {
        let origin = TempDir::new().unwrap();
        let backup = TempDir::new().unwrap();
        std::fs::write(origin.path().join("a.txt"), b"a").unwrap();
        std::fs::write(origin.path().join("b.txt"), b"b").unwrap();
        std::fs::write(backup.path().join("a.txt"), b"a").unwrap();

        let session = SyncSession::new(origin.path(), backup.path());
        let analysis = Comparator::new(ScanConfig::default())
            .unwrap()
            .analyze(origin.path(), backup.path())
            .unwrap();

        let mut paths = analysis.missing.as_slice().to_vec();
        paths.push("vanished.txt".into());
        let result = BatchRunner::new(CopyOptions::default()).run(&paths, origin.path(), backup.path(), &NoProgress);

        (origin, backup, session, analysis, result)
    }

    #[test]
    fn test_file_name_uses_local_timestamp() {
        let (_origin, _backup, session, analysis, result) = scenario();
        let stamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let log = RunLog::new(&session, &analysis, &result).with_timestamp(stamp);
        assert_eq!(log.file_name(), "filextransfer_log_20240309_140507.txt");
    }

    #[test]
    fn test_render_layout() {
        let (_origin, backup, session, analysis, result) = scenario();
        let log = RunLog::new(&session, &analysis, &result);
        let text = log.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "FileXtransfer log");
        assert_eq!(lines[3], format!("Copy target: {}", backup.path().display()));
        assert_eq!(lines[4], "Total missing: 1");
        assert_eq!(lines[5], "OK: 1, ERRORS: 1");
        assert!(lines[6].starts_with("Duration: "));
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "OK: b.txt");
        assert!(lines[9].starts_with("ERROR: vanished.txt ("));
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_write_into_target() {
        let (_origin, backup, session, analysis, result) = scenario();
        let log = RunLog::new(&session, &analysis, &result);

        let path = log.write().unwrap();
        assert_eq!(path.parent(), Some(backup.path()));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".txt")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), log.render());
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let (_origin, backup, session, analysis, result) = scenario();
        let log = RunLog::new(&session, &analysis, &result);

        assert!(log.write_to(&backup.path().join("nope")).is_err());
    }
}
