//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw provider record shape (`RawRecord`) and the sentinel type (`Quoted`)
//! - normalized quotes per domain (`BondQuote`, `FuturesQuote`, `CurrencyQuote`)
//! - derived outputs (`YieldCurveSnapshot`, `CurrencySnapshot`) and the published `Snapshot`
//! - the fixed canonical currency table and the runtime `FeedConfig`

pub mod types;

pub use types::*;
