//! Core copy engine module
//!
//! Provides the batch runner and the engine that drives analysis and
//! copying for one session.

mod copier;
mod runner;

pub use copier::*;
pub use runner::*;
