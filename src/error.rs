//! Error types for filextransfer
//!
//! One crate-wide error enum covers indexing, copying and configuration.
//! Per-file copy errors are additionally classified into a [`FailureKind`]
//! so callers can react to them without parsing messages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for filextransfer operations
#[derive(Error, Debug)]
pub enum FileXferError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A tree root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Source exists but is not a regular file
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Directory walk failed below the root
    #[error("Traversal error at '{path}': {message}")]
    Traversal {
        path: PathBuf,
        message: String,
        kind: Option<std::io::ErrorKind>,
    },

    /// File name cannot be represented as a UTF-8 relative path
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization of reports failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The batch worker thread panicked
    #[error("Copy worker panicked: {0}")]
    WorkerPanicked(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FileXferError>,
    },
}

impl FileXferError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Underlying I/O error kind, if this error came from the filesystem
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::NotFound(_) => Some(std::io::ErrorKind::NotFound),
            Self::Traversal { kind, .. } => *kind,
            Self::WithContext { source, .. } => source.io_kind(),
            _ => None,
        }
    }

    /// Classify this error as a per-file copy failure
    pub fn failure_kind(&self) -> FailureKind {
        match self.io_kind() {
            Some(kind) => FailureKind::from_io_kind(kind),
            None => FailureKind::Other,
        }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        self.io_kind() == Some(std::io::ErrorKind::PermissionDenied)
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::NotAFile(path)
            | Self::Traversal { path, .. }
            | Self::NonUtf8Path(path) => Some(path),
            Self::WithContext { source, .. } => source.path(),
            _ => None,
        }
    }
}

/// Result type alias for filextransfer operations
pub type Result<T> = std::result::Result<T, FileXferError>;

impl From<std::io::Error> for FileXferError {
    fn from(err: std::io::Error) -> Self {
        FileXferError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for FileXferError {
    fn from(err: serde_json::Error) -> Self {
        FileXferError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| FileXferError::io(path, e))
    }
}

/// Why a single file could not be copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Source or destination not accessible
    PermissionDenied,
    /// Source vanished after analysis
    SourceMissing,
    /// No space or quota left on the target
    StorageFull,
    /// Path or file name too long for the target filesystem
    PathTooLong,
    /// I/O interrupted or timed out
    Interrupted,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Map an I/O error kind onto a failure kind
    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;

        match kind {
            ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => Self::PermissionDenied,
            ErrorKind::NotFound => Self::SourceMissing,
            ErrorKind::StorageFull | ErrorKind::QuotaExceeded | ErrorKind::FileTooLarge => {
                Self::StorageFull
            }
            ErrorKind::InvalidFilename => Self::PathTooLong,
            ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::UnexpectedEof => {
                Self::Interrupted
            }
            _ => Self::Other,
        }
    }

    /// Short label used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::SourceMissing => "source missing",
            Self::StorageFull => "storage full",
            Self::PathTooLong => "path too long",
            Self::Interrupted => "interrupted",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
