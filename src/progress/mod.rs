//! Progress reporting module
//!
//! Terminal progress bar for copy batches.

mod reporter;

pub use reporter::*;
