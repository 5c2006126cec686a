//! Market data sources.
//!
//! - `source`: the `MarketSource` trait and the logging `DataAdapter` around it
//! - `cnbc`: the live CNBC quote web service client
//! - `fixture`: an offline source backed by a JSON file

pub mod cnbc;
pub mod fixture;
pub mod source;

pub use cnbc::CnbcClient;
pub use fixture::FixtureSource;
pub use source::{DataAdapter, DomainFetch, MarketSource};
