//! Progress reporter implementation
//!
//! An indicatif bar fed by batch notifications: position and length come
//! from each [`ProgressUpdate`], the message shows the last outcome line and
//! failures are printed above the bar.

use crate::core::{CompletionSummary, ProgressSink, ProgressUpdate};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const MAX_MESSAGE_WIDTH: usize = 60;

/// Progress reporter for copy batches
pub struct ProgressReporter {
    /// File count progress bar
    bar: ProgressBar,
    /// Is progress enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter drawing to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_prefix("Files");
        bar.enable_steady_tick(Duration::from_millis(200));

        Self {
            bar,
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled progress reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.bar.disable_steady_tick();
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_length(update.total as u64);
        self.bar.set_position(update.current as u64);

        if update.message.starts_with("ERROR") && self.is_enabled() {
            self.bar.println(&update.message);
        }

        self.bar.set_message(truncate(&update.message, MAX_MESSAGE_WIDTH));
    }

    fn on_finished(&self, summary: &CompletionSummary) {
        let text = format!(
            "{} copied, {} failed -> {}",
            summary.success_count,
            summary.failure_count,
            summary.target.display()
        );

        if summary.failure_count == 0 {
            self.bar.finish_with_message(format!("✓ {}", text));
        } else {
            self.bar.abandon_with_message(format!("✗ {}", text));
        }
    }
}

/// Keep the tail of long lines, where the file name is
fn truncate(message: &str, width: usize) -> String {
    let count = message.chars().count();
    if count <= width {
        return message.to_string();
    }

    let tail: String = message.chars().skip(count - (width - 3)).collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn update(current: usize, total: usize, message: &str) -> ProgressUpdate {
        ProgressUpdate {
            current,
            total,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_progress_reporter() {
        let reporter = ProgressReporter::disabled();
        assert!(!reporter.is_enabled());

        reporter.on_progress(&update(1, 4, "OK: a.txt"));
        reporter.on_progress(&update(2, 4, "ERROR: b.txt (denied)"));

        assert_eq!(reporter.bar.length(), Some(4));
        assert_eq!(reporter.bar.position(), 2);
        assert!(!reporter.bar.is_finished());

        reporter.on_finished(&CompletionSummary {
            success_count: 1,
            failure_count: 1,
            target: PathBuf::from("/backup"),
        });
        assert!(reporter.bar.is_finished());
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("OK: a.txt", 60), "OK: a.txt");

        let long = format!("OK: {}/file.txt", "d".repeat(80));
        let shown = truncate(&long, 20);
        assert_eq!(shown.chars().count(), 20);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("file.txt"));
    }
}
