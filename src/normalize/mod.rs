//! Per-domain normalization of raw provider records.
//!
//! Each function is pure and total: malformed input never produces an error,
//! only dropped records (bonds) or `Quoted::Unavailable` fields (futures,
//! currencies). Parse failures are logged and counted in `Normalized::dropped`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{BondQuote, CurrencyPair, CurrencyQuote, FuturesQuote, Quoted, RawRecord};
use crate::error::FeedError;

/// Symbol prefix the provider uses for U.S. treasury tenors.
pub const TREASURY_PREFIX: &str = "US";

/// Normalized records plus the number of raw records that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub items: Vec<T>,
    pub dropped: usize,
}

/// Keep U.S. treasury tenors and parse their percent-formatted `last` field.
pub fn normalize_bonds(records: &[RawRecord]) -> Normalized<BondQuote> {
    let mut items = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        let Some(symbol) = field_text(record, "symbol") else {
            warn!("bond record without symbol dropped");
            dropped += 1;
            continue;
        };
        if !symbol.starts_with(TREASURY_PREFIX) {
            continue;
        }

        let raw = field_text(record, "last").unwrap_or_default();
        match parse_percent(&raw) {
            Ok(yield_pct) => items.push(BondQuote { symbol, yield_pct }),
            Err(err) => {
                warn!(%symbol, error = %err, "bond record dropped");
                dropped += 1;
            }
        }
    }

    Normalized { items, dropped }
}

/// Map every record into a futures row; absent fields become unavailable.
pub fn normalize_futures(records: &[RawRecord]) -> Normalized<FuturesQuote> {
    let items = records
        .iter()
        .map(|record| FuturesQuote {
            symbol: field_text(record, "symbol").into(),
            name: field_text(record, "name").into(),
            last_price: field_text(record, "last").into(),
            change: field_text(record, "change").into(),
            change_pct: field_text(record, "change_pct").into(),
            expiration_date: field_text(record, "expiration_date").into(),
            is_halted: halted_flag(record).into(),
        })
        .collect();

    Normalized { items, dropped: 0 }
}

/// Build one quote per canonical pair, in table order.
///
/// Records whose symbol is not in `table` are ignored. When several records
/// share a code the last one wins. A pair with no record gets both prices
/// unavailable.
pub fn normalize_currencies(
    records: &[RawRecord],
    table: &[(CurrencyPair, &str)],
) -> Normalized<CurrencyQuote> {
    let mut dropped = 0;
    let items = table
        .iter()
        .map(|&(pair, code)| {
            let record = records
                .iter()
                .rev()
                .find(|r| field_text(r, "symbol").as_deref() == Some(code));

            let Some(record) = record else {
                debug!(%pair, code, "no record for canonical pair");
                return CurrencyQuote {
                    pair,
                    last: Quoted::Unavailable,
                    open: Quoted::Unavailable,
                };
            };

            let last = price_field(record, "last", pair);
            let open = price_field(record, "open", pair);
            if !last.is_available() || !open.is_available() {
                dropped += 1;
            }
            CurrencyQuote { pair, last, open }
        })
        .collect();

    Normalized { items, dropped }
}

/// `" 4.50% "` → `4.5`. The percent sign is optional.
pub fn parse_percent(raw: &str) -> Result<f64, FeedError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FeedError::parse("yield", raw)),
    }
}

/// Parse a provider price such as `"1.0850"` or `"2,648.30"`.
pub fn parse_price(raw: &str) -> Result<f64, FeedError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FeedError::parse("price", raw)),
    }
}

fn price_field(record: &RawRecord, key: &'static str, pair: CurrencyPair) -> Quoted<f64> {
    let Some(raw) = field_text(record, key) else {
        return Quoted::Unavailable;
    };
    match parse_price(&raw) {
        Ok(v) => Quoted::Value(v),
        Err(err) => {
            warn!(%pair, field = key, error = %err, "currency field unavailable");
            Quoted::Unavailable
        }
    }
}

/// Scalar field as trimmed text. Numbers keep their JSON rendering; empty
/// strings, null, and nested values count as absent.
fn field_text(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `EventData.is_halted`, accepting booleans and `Y`/`N`/`true`/`false`.
fn halted_flag(record: &RawRecord) -> Option<bool> {
    let flag = record.get("EventData")?.as_object()?.get("is_halted")?;
    match flag {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "y" | "true" => Some(true),
            "n" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
