//! Run reporting module
//!
//! Writes the per-run log into the copy target.

mod run_log;

pub use run_log::*;
