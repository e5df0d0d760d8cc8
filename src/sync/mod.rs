//! Tree comparison module
//!
//! Indexes origin and destination and computes the set of files the
//! destination is missing.

mod compare;

pub use compare::*;
