//! Configuration module for filextransfer
//!
//! Provides CLI arguments, the per-run session and shared policy enums.

mod settings;

pub use settings::*;
