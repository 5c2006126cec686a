//! Text reports for terminal output.

pub mod format;

pub use format::*;
