//! Single-file copy engine
//!
//! Copies one file either with a whole-file call ([`CopyMode::Fast`]) or a
//! fixed-buffer streaming loop ([`CopyMode::Chunked`]). Content lands in a
//! uniquely named staging file next to the destination and is renamed into
//! place only once complete, so an interrupted copy never looks like a
//! finished one and no other file in the directory is touched.

use crate::config::{CopyMode, DEFAULT_CHUNK_SIZE};
use crate::error::{FileXferError, IoResultExt, Result};
use filetime::FileTime;
use std::fs::{File, Metadata};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Suffix of in-flight staging files
pub const STAGING_SUFFIX: &str = ".fxpart";

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy
    pub duration: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
    /// Method used for copy
    pub method: CopyMode,
    /// Access/modification times applied to the destination
    pub times_preserved: bool,
}

impl CopyStats {
    /// Calculate throughput from bytes and duration
    pub fn calculate_throughput(&mut self) {
        if self.duration.as_secs_f64() > 0.0 {
            self.throughput = self.bytes_copied as f64 / self.duration.as_secs_f64();
        }
    }
}

/// Options for file copy operations
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Transfer strategy
    pub mode: CopyMode,
    /// Buffer size for chunked copies
    pub chunk_size: usize,
    /// Apply the source's access/modification times
    pub preserve_times: bool,
    /// fsync the staging file before it is renamed into place
    pub sync: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            mode: CopyMode::Chunked,
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_times: true,
            sync: false,
        }
    }
}

impl CopyOptions {
    /// Default options with the given mode
    pub fn with_mode(mode: CopyMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }
}

/// File copier
#[derive(Debug, Clone)]
pub struct FileCopier {
    options: CopyOptions,
}

impl FileCopier {
    /// Create a new file copier with the given options
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Create with default options
    pub fn default_copier() -> Self {
        Self::new(CopyOptions::default())
    }

    /// Options in use
    pub fn options(&self) -> &CopyOptions {
        &self.options
    }

    /// Copy `source` to `dest`, overwriting any existing file
    ///
    /// The destination's parent chain is created first. On error nothing is
    /// left under `dest` that was not there before.
    pub fn copy(&self, source: &Path, dest: &Path) -> Result<CopyStats> {
        let start = Instant::now();

        let metadata = std::fs::metadata(source).with_path(source)?;
        if !metadata.is_file() {
            return Err(FileXferError::NotAFile(source.to_path_buf()));
        }

        ensure_parent_dir(dest)?;

        // Dropping the staging file on any early return removes it.
        let mut staging = create_staging(dest)?;
        let (bytes_copied, times_preserved) = self.write_staging(source, &mut staging, &metadata)?;

        staging
            .persist(dest)
            .map_err(|e| FileXferError::io(dest, e.error))?;

        let mut stats = CopyStats {
            bytes_copied,
            duration: start.elapsed(),
            throughput: 0.0,
            method: self.options.mode,
            times_preserved,
        };
        stats.calculate_throughput();

        Ok(stats)
    }

    /// Fill the staging file and stamp it; returns (bytes, times applied)
    fn write_staging(
        &self,
        source: &Path,
        staging: &mut NamedTempFile,
        metadata: &Metadata,
    ) -> Result<(u64, bool)> {
        let bytes = match self.options.mode {
            CopyMode::Fast => self.copy_fast(source, staging)?,
            CopyMode::Chunked => {
                let bytes = self.copy_chunked(source, staging, metadata.len())?;
                // Staging files are created owner-only; carry the source's mode over.
                std::fs::set_permissions(staging.path(), metadata.permissions()).with_path(staging.path())?;
                bytes
            }
        };

        let times_preserved = self.options.preserve_times && preserve_times(metadata, staging.path());

        Ok((bytes, times_preserved))
    }

    /// Whole-file copy, kernel-assisted where the platform allows
    fn copy_fast(&self, source: &Path, staging: &NamedTempFile) -> Result<u64> {
        let dest = staging.path();
        let bytes = std::fs::copy(source, dest).map_err(|e| copy_error(source, dest, e))?;

        if self.options.sync {
            staging.as_file().sync_all().with_path(dest)?;
        }

        Ok(bytes)
    }

    /// Streaming copy through one reusable buffer
    fn copy_chunked(&self, source: &Path, staging: &mut NamedTempFile, size_hint: u64) -> Result<u64> {
        let dest = staging.path().to_path_buf();
        let mut reader = File::open(source).with_path(source)?;
        let writer = staging.as_file_mut();

        // Small files do not need the full chunk allocated.
        let capacity = usize::try_from(size_hint)
            .unwrap_or(usize::MAX)
            .clamp(1, self.options.chunk_size.max(1));
        let mut buffer = vec![0u8; capacity];
        let mut bytes_copied = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FileXferError::io(source, e)),
            };

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| FileXferError::io(&dest, e))?;

            bytes_copied += bytes_read as u64;
        }

        writer.flush().with_path(&dest)?;

        if self.options.sync {
            writer.sync_all().with_path(&dest)?;
        }

        Ok(bytes_copied)
    }
}

/// Create the parent directory chain of `path` if missing
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_path(parent)?;
        }
    }
    Ok(())
}

/// Apply the source's access/modification times to `dest`
///
/// Best effort: failures are logged and reported as `false`.
pub fn preserve_times(source: &Metadata, dest: &Path) -> bool {
    let mtime = FileTime::from_last_modification_time(source);
    let atime = FileTime::from_last_access_time(source);

    match filetime::set_file_times(dest, atime, mtime) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %dest.display(), "Could not set timestamps: {}", e);
            false
        }
    }
}

/// Exclusively create a hidden staging file next to `dest`
///
/// The name is `.<name>.<random>.fxpart`; creation fails rather than reuse an
/// existing file, so staging never clobbers anything in the directory.
pub fn create_staging(dest: &Path) -> Result<NamedTempFile> {
    let name = dest
        .file_name()
        .ok_or_else(|| FileXferError::InvalidPath(dest.display().to_string()))?;

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut prefix = std::ffi::OsString::from(".");
    prefix.push(name);
    prefix.push(".");

    let staging = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(dir)
        .with_path(dir)?;
    Ok(staging)
}

/// `std::fs::copy` does not say which side failed; attribute NotFound to the
/// source and everything else to the destination.
fn copy_error(source: &Path, dest: &Path, err: std::io::Error) -> FileXferError {
    if err.kind() == ErrorKind::NotFound && !source.exists() {
        FileXferError::io(source, err)
    } else {
        FileXferError::io(dest, err)
    }
}
