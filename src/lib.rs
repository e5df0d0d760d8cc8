//! # FileXtransfer - copy what the backup is missing
//!
//! FileXtransfer compares an origin tree with a destination tree by relative
//! path and copies every file that exists under the origin but not under the
//! destination. Presence is the only criterion: a same-path destination file
//! is treated as synchronized whatever its size, age or content, and nothing
//! is ever deleted.
//!
//! ## Features
//!
//! - **Separator-agnostic paths**: `a\b` and `a/b` name the same file
//! - **Concurrent indexing**: both trees are walked at the same time
//! - **Two copy strategies**: whole-file fast copy or bounded-memory chunked copy
//! - **Atomic placement**: content is staged and renamed into place
//! - **Failure isolation**: one bad file never stops a batch
//! - **Run log**: a plain-text record written into the copy target
//!
//! ## Quick Start
//!
//! ```no_run
//! use filextransfer::config::SyncSession;
//! use filextransfer::core::{NoProgress, SyncEngine};
//!
//! let engine = SyncEngine::new(SyncSession::new("/data", "/mnt/backup")).unwrap();
//! let analysis = engine.analyze().unwrap();
//!
//! let result = engine.copy(&analysis, &NoProgress);
//! println!("Copied {} of {} missing files", result.success_count, analysis.missing.len());
//! ```
//!
//! ## Background Copy
//!
//! ```no_run
//! use filextransfer::config::{CopyMode, SyncSession};
//! use filextransfer::core::{BatchEvent, SyncEngine};
//!
//! let mut session = SyncSession::new("/data", "/mnt/backup");
//! session.mode = CopyMode::Fast;
//! session.copy_target = Some("/mnt/staging".into());
//!
//! let engine = SyncEngine::new(session).unwrap();
//! let analysis = engine.analyze().unwrap();
//! let handle = engine.spawn_copy(&analysis).unwrap();
//!
//! for event in handle.events().iter() {
//!     match event {
//!         BatchEvent::Progress(update) => println!("[{}/{}] {}", update.current, update.total, update.message),
//!         BatchEvent::Finished(summary) => println!("done: {} ok, {} failed", summary.success_count, summary.failure_count),
//!     }
//! }
//!
//! let result = handle.join().unwrap();
//! result.print_summary();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod progress;
pub mod report;
pub mod sync;

// Re-export commonly used types
pub use config::{CopyMode, SyncSession, TraversalPolicy};
pub use core::{BatchResult, SyncEngine};
pub use error::{FileXferError, Result};
pub use progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use filextransfer::prelude::*;
    //! ```

    pub use crate::config::{CopyMode, SyncSession, TraversalPolicy};
    pub use crate::core::{
        BatchEvent, BatchHandle, BatchResult, BatchRunner, CompletionSummary, NoProgress,
        ProgressSink, ProgressUpdate, SyncEngine,
    };
    pub use crate::error::{FailureKind, FileXferError, Result};
    pub use crate::fs::{normalize_separators, CopyOptions, FileCopier, FileSet, RelativePath, Scanner, ScanConfig};
    pub use crate::progress::ProgressReporter;
    pub use crate::report::RunLog;
    pub use crate::sync::{diff, Comparator, MissingSet, SyncAnalysis};
}
