//! Configuration settings for filextransfer
//!
//! Defines the CLI arguments, the caller-owned [`SyncSession`] and the
//! policy enums shared by the indexer and the copy engine.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default chunk buffer for streaming copies (64 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// filextransfer - copy the files a backup tree is missing
#[derive(Parser, Debug, Clone)]
#[command(name = "filextransfer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Copy files present in ORIGIN but missing from DESTINATION")]
#[command(long_about = r#"
filextransfer compares two directory trees by relative path and copies every
file that exists under ORIGIN but not under DESTINATION.

Only path presence is compared: a destination file with the same relative
path is considered synchronized, whatever its size, age or content. Nothing
is ever deleted.

Examples:
  filextransfer /data /mnt/backup                  # copy what the backup lacks
  filextransfer /data /mnt/backup -n               # only list missing files
  filextransfer /data /mnt/backup -t /mnt/staging  # compare with backup, copy to staging
  filextransfer /data /mnt/backup --mode fast -p   # whole-file copies with a progress bar
"#)]
pub struct CliArgs {
    /// Origin tree (the data being backed up)
    #[arg(value_name = "ORIGIN")]
    pub origin: PathBuf,

    /// Destination tree compared against origin
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Copy missing files into this directory instead of DESTINATION
    #[arg(short = 't', long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Analyze only: list missing files without copying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Transfer strategy
    #[arg(short = 'm', long, value_enum, default_value = "chunked")]
    pub mode: CopyMode,

    /// Buffer size for chunked copies (e.g., 64M, 512K)
    #[arg(short = 'b', long, default_value = "64M", value_name = "SIZE")]
    pub chunk_size: String,

    /// What to do with unreadable directories and unrepresentable names
    #[arg(long, value_enum, default_value = "fail-fast")]
    pub on_unreadable: TraversalPolicy,

    /// Follow symbolic links while indexing
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Relative path pattern to leave out (glob, repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Do not write a run log into the copy target
    #[arg(long)]
    pub no_log: bool,

    /// Do not copy access/modification times
    #[arg(long)]
    pub no_preserve_times: bool,

    /// fsync each file before it is renamed into place
    #[arg(long)]
    pub fsync: bool,

    /// Output format for reports
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Show a progress bar
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// How a single file is transferred
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    /// One whole-file copy call, permissions and times carried over
    #[value(name = "fast")]
    Fast,
    /// Fixed-size buffer loop, bounded memory for huge files
    #[default]
    #[value(name = "chunked")]
    Chunked,
}

impl CopyMode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Chunked => "chunked",
        }
    }
}

/// Handling of entries the indexer cannot read or represent
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalPolicy {
    /// Abort indexing at the first problem
    #[default]
    #[value(name = "fail-fast")]
    FailFast,
    /// Leave the entry out and list it in the scan result
    #[value(name = "skip-and-record")]
    SkipAndRecord,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Everything one analyze-and-copy run needs
///
/// Owned by the caller and passed into the engine; the engine keeps no state
/// of its own between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSession {
    /// Origin tree
    pub origin: PathBuf,
    /// Destination tree used for comparison
    pub destination: PathBuf,
    /// Alternate directory to copy into (defaults to `destination`)
    pub copy_target: Option<PathBuf>,
    /// Transfer strategy
    pub mode: CopyMode,
    /// Buffer size in bytes for chunked copies
    pub chunk_size: usize,
    /// Copy access/modification times
    pub preserve_times: bool,
    /// Flush each copied file to stable storage
    pub fsync: bool,
    /// Traversal error policy
    pub traversal: TraversalPolicy,
    /// Follow symlinks while indexing
    pub follow_symlinks: bool,
    /// Exclude patterns matched against relative paths
    pub exclude_patterns: Vec<String>,
    /// Write a run log into the copy target
    pub write_run_log: bool,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self {
            origin: PathBuf::new(),
            destination: PathBuf::new(),
            copy_target: None,
            mode: CopyMode::Chunked,
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_times: true,
            fsync: false,
            traversal: TraversalPolicy::FailFast,
            follow_symlinks: false,
            exclude_patterns: Vec::new(),
            write_run_log: true,
        }
    }
}

impl SyncSession {
    /// Session comparing `origin` against `destination` with defaults
    pub fn new(origin: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    /// Directory the missing files are copied into
    pub fn target(&self) -> &Path {
        self.copy_target.as_deref().unwrap_or(&self.destination)
    }

    /// Create session from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let chunk_size = parse_size(&args.chunk_size)
            .map_err(|e| format!("Invalid chunk size: {}", e))?;
        if chunk_size == 0 {
            return Err("Invalid chunk size: must be greater than zero".to_string());
        }
        let chunk_size = usize::try_from(chunk_size)
            .map_err(|_| format!("Invalid chunk size: {} does not fit in memory", args.chunk_size))?;

        Ok(Self {
            origin: args.origin.clone(),
            destination: args.destination.clone(),
            copy_target: args.target.clone(),
            mode: args.mode,
            chunk_size,
            preserve_times: !args.no_preserve_times,
            fsync: args.fsync,
            traversal: args.on_unreadable,
            follow_symlinks: args.follow_symlinks,
            exclude_patterns: args.exclude.clone(),
            write_run_log: !args.no_log,
        })
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        let num = size.trim_end_matches(['T', 'B']);
        (num, 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        let num = size.trim_end_matches(['G', 'B']);
        (num, 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        let num = size.trim_end_matches(['M', 'B']);
        (num, 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        let num = size.trim_end_matches(['K', 'B']);
        (num, 1024u64)
    } else if size.ends_with('B') {
        let num = size.trim_end_matches('B');
        (num, 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if num < 0.0 || !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["filextransfer", "/origin", "/backup"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("64M").unwrap(), DEFAULT_CHUNK_SIZE as u64);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5G").unwrap(), (1.5 * 1024.0 * 1024.0 * 1024.0) as u64);
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_session_defaults_from_cli() {
        let session = SyncSession::from_cli(&args(&[])).unwrap();
        assert_eq!(session.mode, CopyMode::Chunked);
        assert_eq!(session.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(session.traversal, TraversalPolicy::FailFast);
        assert!(session.preserve_times);
        assert!(!session.fsync);
        assert!(session.write_run_log);
        assert_eq!(session.target(), Path::new("/backup"));
    }

    #[test]
    fn test_alternate_target() {
        let session = SyncSession::from_cli(&args(&["-t", "/staging", "--mode", "fast"])).unwrap();
        assert_eq!(session.target(), Path::new("/staging"));
        assert_eq!(session.destination, PathBuf::from("/backup"));
        assert_eq!(session.mode, CopyMode::Fast);
    }

    #[test]
    fn test_policy_and_flags() {
        let session = SyncSession::from_cli(&args(&[
            "--on-unreadable",
            "skip-and-record",
            "--exclude",
            "*.tmp",
            "--no-log",
            "--no-preserve-times",
            "--fsync",
        ]))
        .unwrap();
        assert_eq!(session.traversal, TraversalPolicy::SkipAndRecord);
        assert_eq!(session.exclude_patterns, vec!["*.tmp".to_string()]);
        assert!(!session.write_run_log);
        assert!(!session.preserve_times);
        assert!(session.fsync);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(SyncSession::from_cli(&args(&["-b", "0"])).is_err());
        assert!(SyncSession::from_cli(&args(&["-b", "huge"])).is_err());
    }
}
