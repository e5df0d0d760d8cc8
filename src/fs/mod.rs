//! File system operations module
//!
//! Canonical relative paths, tree indexing and the single-file copy engine.

mod operations;
mod path;
mod scanner;

pub use operations::*;
pub use path::*;
pub use scanner::*;
