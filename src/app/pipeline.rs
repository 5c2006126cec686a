//! Shared refresh-cycle logic used by every front-end.
//!
//! One cycle: fetch (three domains, concurrently) -> normalize -> derive -> `Snapshot`.
//! A failed domain contributes an empty partial and a `Failed` status; the
//! cycle itself cannot fail.

use chrono::Utc;
use tracing::info;

use crate::data::{DataAdapter, DomainFetch, MarketSource};
use crate::domain::{CURRENCY_TABLE, DomainStatus, Snapshot, SourceReport};
use crate::metrics::{currency_snapshot, yield_curve};
use crate::normalize::{normalize_bonds, normalize_currencies, normalize_futures};

/// Run one full cycle and stamp the result with `sequence`.
pub fn run_cycle<S: MarketSource>(adapter: &DataAdapter<S>, sequence: u64) -> Snapshot {
    // 1) Fetch all domains; no ordering dependency between them.
    let (bonds_raw, (futures_raw, currencies_raw)) = rayon::join(
        || adapter.fetch_bonds(),
        || rayon::join(|| adapter.fetch_futures(), || adapter.fetch_currencies()),
    );

    // 2) Normalize.
    let bonds = normalize_bonds(bonds_raw.records());
    let futures = normalize_futures(futures_raw.records());
    let currencies = normalize_currencies(currencies_raw.records(), &CURRENCY_TABLE);

    let sources = SourceReport {
        bonds: status(&bonds_raw, bonds.dropped),
        futures: status(&futures_raw, futures.dropped),
        currencies: status(&currencies_raw, currencies.dropped),
    };

    // 3) Derive.
    let snapshot = Snapshot {
        sequence,
        generated_at: Utc::now(),
        yield_curve: yield_curve(&bonds.items),
        futures: futures.items,
        currencies: currency_snapshot(&currencies.items),
        sources,
    };

    info!(
        sequence,
        tenors = snapshot.yield_curve.maturities.len(),
        slope = snapshot.yield_curve.slope,
        futures = snapshot.futures.len(),
        bonds_status = %snapshot.sources.bonds.summary(),
        futures_status = %snapshot.sources.futures.summary(),
        currencies_status = %snapshot.sources.currencies.summary(),
        "cycle complete"
    );

    snapshot
}

fn status(fetch: &DomainFetch, dropped: usize) -> DomainStatus {
    match fetch {
        DomainFetch::Fetched(records) => DomainStatus::Fetched {
            records: records.len(),
            dropped,
        },
        DomainFetch::Failed(reason) => DomainStatus::Failed {
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::data::FixtureSource;
    use crate::domain::{CurrencyPair, CurveState, Direction, Quoted};

    fn adapter(doc: serde_json::Value) -> DataAdapter<FixtureSource> {
        DataAdapter::new(FixtureSource::from_value(doc).unwrap())
    }

    #[test]
    fn full_cycle_derives_slope_and_directions() {
        let adapter = adapter(json!({
            "bonds": [
                {"symbol": "US2Y", "last": "4.50%"},
                {"symbol": "US10Y", "last": "4.20%"}
            ],
            "futures": [{"symbol": "@CL.1", "last": "71.20"}],
            "currencies": [
                {"symbol": "EUR=", "last": "1.10", "open": "1.05"},
                {"symbol": "GBP=", "last": "1.20", "open": "1.20"}
            ]
        }));

        let snapshot = run_cycle(&adapter, 7);
        assert_eq!(snapshot.sequence, 7);

        assert!((snapshot.yield_curve.slope - -0.30).abs() < 1e-9);
        assert_eq!(snapshot.yield_curve.state(), CurveState::Flattening);

        let eur = snapshot.currencies.get(CurrencyPair::EurUsd).unwrap();
        assert_eq!(eur.direction, Direction::Up);
        let gbp = snapshot.currencies.get(CurrencyPair::GbpUsd).unwrap();
        assert_eq!(gbp.direction, Direction::Down);
        let cad = snapshot.currencies.get(CurrencyPair::UsdCad).unwrap();
        assert_eq!(cad.direction, Direction::Unknown);
        assert_eq!(cad.last, Quoted::Unavailable);

        let expected = DomainStatus::Fetched {
            records: 2,
            dropped: 0,
        };
        assert_eq!(snapshot.sources.bonds, expected);
    }

    #[test]
    fn failed_domain_does_not_block_others() {
        let adapter = adapter(json!({
            "bonds": [
                {"symbol": "US2Y", "last": "4.10%"},
                {"symbol": "US10Y", "last": "4.40%"}
            ],
            "currencies": [{"symbol": "EUR=", "last": "1.10", "open": "1.05"}]
        }));

        let snapshot = run_cycle(&adapter, 1);
        assert!(snapshot.futures.is_empty());
        assert!(snapshot.sources.futures.is_failed());
        assert!(!snapshot.sources.bonds.is_failed());
        assert!(!snapshot.sources.currencies.is_failed());
        assert_eq!(snapshot.yield_curve.maturities.len(), 2);
        assert_eq!(snapshot.currencies.len(), 6);
    }

    #[test]
    fn all_domains_failing_still_publishes() {
        let snapshot = run_cycle(&adapter(json!({})), 3);
        assert!(snapshot.yield_curve.maturities.is_empty());
        assert_eq!(snapshot.yield_curve.slope, 0.0);
        for entry in snapshot.currencies.iter() {
            assert_eq!(entry.direction, Direction::Unknown);
        }
        assert!(snapshot.sources.bonds.is_failed());
        assert!(snapshot.sources.currencies.is_failed());
    }

    #[test]
    fn dropped_records_are_reported_as_partial() {
        let adapter = adapter(json!({
            "bonds": [{"symbol": "US2Y", "last": "n/a"}, {"symbol": "US10Y", "last": "4.2%"}],
            "futures": [],
            "currencies": []
        }));
        let snapshot = run_cycle(&adapter, 2);
        let expected = DomainStatus::Fetched {
            records: 2,
            dropped: 1,
        };
        assert_eq!(snapshot.sources.bonds, expected);
        assert_eq!(snapshot.sources.bonds.summary(), "partial (2, 1 dropped)");
        assert!((snapshot.yield_curve.slope - 4.2).abs() < 1e-9);
    }
}
