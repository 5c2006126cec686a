//! Offline source backed by a JSON file.
//!
//! Layout: `{"bonds": [...], "futures": [...], "currencies": [...]}` where each
//! array holds raw provider records. A domain whose key is missing or not an
//! array of records reports `SourceUnavailable`, which makes fixtures handy for
//! reproducing partial outages. Array items that are not objects are skipped,
//! the same way the live client skips them.

use std::fs::File;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::domain::{Domain, RawRecord};
use crate::error::{AppError, FeedError};

use super::source::MarketSource;

#[derive(Debug, Clone)]
pub struct FixtureSource {
    document: serde_json::Map<String, Value>,
}

impl FixtureSource {
    /// Read a fixture file.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let shown = path.display();
        let file = File::open(path).map_err(|e| {
            let msg = format!("Failed to open fixture '{shown}': {e}");
            AppError::new(2, msg)
        })?;
        let value: Value = serde_json::from_reader(file).map_err(|e| {
            let msg = format!("Invalid fixture JSON '{shown}': {e}");
            AppError::new(2, msg)
        })?;
        Self::from_value(value).ok_or_else(|| {
            let msg = format!("Fixture '{shown}' must be a JSON object.");
            AppError::new(2, msg)
        })
    }

    /// Wrap an in-memory document; `None` unless it is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(document) => Some(Self { document }),
            _ => None,
        }
    }

    fn records(&self, domain: Domain) -> Result<Vec<RawRecord>, FeedError> {
        let Some(value) = self.document.get(domain.as_str()) else {
            return Err(FeedError::unavailable(domain, "domain missing from fixture"));
        };
        let Value::Array(items) = value else {
            return Err(FeedError::unavailable(domain, "fixture domain is not an array"));
        };
        let records: Vec<RawRecord> = items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect();
        let skipped = items.len() - records.len();
        if skipped > 0 {
            warn!(%domain, skipped, "fixture records are not objects");
        }
        Ok(records)
    }
}

impl MarketSource for FixtureSource {
    fn id(&self) -> &'static str {
        "fixture"
    }

    fn fetch_bonds(&self) -> Result<Vec<RawRecord>, FeedError> {
        self.records(Domain::Bonds)
    }

    fn fetch_futures(&self) -> Result<Vec<RawRecord>, FeedError> {
        self.records(Domain::Futures)
    }

    fn fetch_currencies(&self) -> Result<Vec<RawRecord>, FeedError> {
        self.records(Domain::Currencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn missing_domain_is_unavailable() {
        let source = FixtureSource::from_value(json!({
            "bonds": [{"symbol": "US2Y", "last": "4.50%"}],
            "currencies": "oops"
        }))
        .unwrap();

        assert_eq!(source.fetch_bonds().unwrap().len(), 1);
        let err = source.fetch_futures().unwrap_err();
        let FeedError::SourceUnavailable { domain, .. } = err else {
            panic!("expected an outage, got {err:?}");
        };
        assert_eq!(domain, Domain::Futures);
        assert!(source.fetch_currencies().is_err());
    }

    #[test]
    fn non_object_records_are_skipped() {
        let source = FixtureSource::from_value(json!({
            "futures": [{"symbol": "@CL.1"}, 42, "oops", {"symbol": "@GC.1"}]
        }))
        .unwrap();

        let records = source.fetch_futures().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["symbol"], "@GC.1");
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(FixtureSource::from_value(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn bundled_demo_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/sample_quotes.json");
        let source = FixtureSource::from_path(&path).unwrap();
        for domain in Domain::ALL {
            assert!(!source.fetch(domain).unwrap().is_empty(), "{domain}");
        }
    }
}
