//! Analyze-and-copy engine
//!
//! Drives one run over a [`SyncSession`]: index both trees, compute the
//! missing set, then copy it into the session's target either on the calling
//! thread or on a background worker that streams [`BatchEvent`]s.

use crate::config::SyncSession;
use crate::core::{BatchEvent, BatchResult, BatchRunner, ProgressSink};
use crate::error::{FileXferError, Result};
use crate::fs::CopyOptions;
use crate::sync::{Comparator, SyncAnalysis};
use crossbeam::channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Main sync engine
pub struct SyncEngine {
    /// Caller-owned run settings
    session: SyncSession,
    /// Tree indexer and diff
    comparator: Comparator,
}

impl SyncEngine {
    /// Create an engine for a session
    pub fn new(session: SyncSession) -> Result<Self> {
        if session.chunk_size == 0 {
            return Err(FileXferError::config("chunk size must be greater than zero"));
        }

        let comparator = Comparator::for_session(&session)?;

        Ok(Self { session, comparator })
    }

    /// Session in use
    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    /// Copy options derived from the session
    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            mode: self.session.mode,
            chunk_size: self.session.chunk_size,
            preserve_times: self.session.preserve_times,
            sync: self.session.fsync,
        }
    }

    /// Index origin and destination and compute what is missing
    pub fn analyze(&self) -> Result<SyncAnalysis> {
        tracing::info!(
            origin = %self.session.origin.display(),
            destination = %self.session.destination.display(),
            "Analyzing"
        );
        self.comparator
            .analyze(&self.session.origin, &self.session.destination)
    }

    /// A runner for one batch, with its own cancellation flag
    ///
    /// Cancelling one batch never carries over into the next.
    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(self.copy_options())
    }

    /// Copy the missing files on the calling thread
    pub fn copy(&self, analysis: &SyncAnalysis, sink: &dyn ProgressSink) -> BatchResult {
        self.batch_runner().run(
            analysis.missing.as_slice(),
            &analysis.origin,
            self.session.target(),
            sink,
        )
    }

    /// Copy the missing files on a background worker
    ///
    /// Progress and completion arrive on [`BatchHandle::events`] in order;
    /// the channel closes once the worker is done.
    pub fn spawn_copy(&self, analysis: &SyncAnalysis) -> Result<BatchHandle> {
        let (tx, rx) = unbounded();
        let runner = self.batch_runner();
        let cancelled = runner.cancellation_flag();
        let paths = analysis.missing.as_slice().to_vec();
        let origin = analysis.origin.clone();
        let target = self.session.target().to_path_buf();

        let handle = thread::Builder::new()
            .name("filextransfer-copy".to_string())
            .spawn(move || runner.run(&paths, &origin, &target, &tx))
            .map_err(|e| FileXferError::io(self.session.target(), e).with_context("spawning copy worker"))?;

        Ok(BatchHandle {
            events: rx,
            cancelled,
            handle,
        })
    }
}

/// A batch running on a background worker
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<BatchResult>,
}

impl BatchHandle {
    /// Ordered progress and completion events
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Ask the worker to stop before its next file
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the worker has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take its result
    pub fn join(self) -> Result<BatchResult> {
        self.handle.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            FileXferError::WorkerPanicked(message)
        })
    }
}
