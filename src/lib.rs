//! `macro-pulse` library crate.
//!
//! The binary (`pulse`) is a thin wrapper around this library so that:
//!
//! - the fetch/normalize/derive pipeline is testable without a network
//! - the scheduler and store can be driven by any presentation layer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod plot;
pub mod report;
pub mod scheduler;
pub mod tui;
