//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - handed to any presentation layer as an immutable `Snapshot`
//! - exported to JSON
//! - compared in tests without touching the network

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::FeedError;

/// One provider record: field name → string, number, or nested mapping.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Marker shown wherever a value is missing or could not be coerced.
pub const UNAVAILABLE: &str = "N/A";

/// The three market-data domains fetched every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Bonds,
    Futures,
    Currencies,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Bonds, Domain::Futures, Domain::Currencies];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Bonds => "bonds",
            Domain::Futures => "futures",
            Domain::Currencies => "currencies",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value or the "unavailable" sentinel.
///
/// Serializes as the plain value, or as `"N/A"` when unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum Quoted<T> {
    Value(T),
    Unavailable,
}

impl<T> Quoted<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Quoted::Value(v) => Some(v),
            Quoted::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Quoted::Value(_))
    }
}

impl<T> From<Option<T>> for Quoted<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Quoted::Value(v),
            None => Quoted::Unavailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Quoted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quoted::Value(v) => v.fmt(f),
            Quoted::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Quoted<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quoted::Value(v) => v.serialize(serializer),
            Quoted::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// A U.S. treasury yield point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondQuote {
    /// Tenor code as quoted by the provider (e.g. `US10Y`).
    pub symbol: String,
    /// Yield in percent (`4.25` means 4.25%).
    pub yield_pct: f64,
}

/// One row of the futures/commodities table.
///
/// Text fields are kept as the provider formatted them (`"5,123.50"`, `"+0.4%"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuturesQuote {
    pub symbol: Quoted<String>,
    pub name: Quoted<String>,
    pub last_price: Quoted<String>,
    pub change: Quoted<String>,
    pub change_pct: Quoted<String>,
    pub expiration_date: Quoted<String>,
    pub is_halted: Quoted<bool>,
}

/// The six canonical currency pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrencyPair {
    EurUsd,
    UsdJpy,
    GbpUsd,
    UsdCad,
    UsdChf,
    AudUsd,
}

/// Canonical pair → provider symbol code. Order is the display order.
pub const CURRENCY_TABLE: [(CurrencyPair, &str); 6] = [
    (CurrencyPair::EurUsd, "EUR="),
    (CurrencyPair::UsdJpy, "JPY="),
    (CurrencyPair::GbpUsd, "GBP="),
    (CurrencyPair::UsdCad, "CAD="),
    (CurrencyPair::UsdChf, "CHF="),
    (CurrencyPair::AudUsd, "AUD="),
];

impl CurrencyPair {
    pub const ALL: [CurrencyPair; 6] = [
        CurrencyPair::EurUsd,
        CurrencyPair::UsdJpy,
        CurrencyPair::GbpUsd,
        CurrencyPair::UsdCad,
        CurrencyPair::UsdChf,
        CurrencyPair::AudUsd,
    ];

    /// Human-readable label (`EUR/USD`).
    pub fn label(self) -> &'static str {
        match self {
            CurrencyPair::EurUsd => "EUR/USD",
            CurrencyPair::UsdJpy => "USD/JPY",
            CurrencyPair::GbpUsd => "GBP/USD",
            CurrencyPair::UsdCad => "USD/CAD",
            CurrencyPair::UsdChf => "USD/CHF",
            CurrencyPair::AudUsd => "AUD/USD",
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Check that a lookup table covers every canonical pair exactly once with
/// distinct, non-empty provider codes.
pub fn validate_currency_table(table: &[(CurrencyPair, &str)]) -> Result<(), FeedError> {
    if table.len() != CurrencyPair::ALL.len() {
        let msg = format!(
            "currency table must have {} entries, found {}",
            CurrencyPair::ALL.len(),
            table.len()
        );
        return Err(FeedError::Configuration(msg));
    }

    let mut pairs = HashSet::new();
    let mut codes = HashSet::new();
    for (pair, code) in table {
        if code.trim().is_empty() {
            let msg = format!("empty provider code for {pair}");
            return Err(FeedError::Configuration(msg));
        }
        if !pairs.insert(*pair) {
            let msg = format!("duplicate pair {pair}");
            return Err(FeedError::Configuration(msg));
        }
        if !codes.insert(*code) {
            let msg = format!("provider code {code} mapped twice");
            return Err(FeedError::Configuration(msg));
        }
    }
    Ok(())
}

/// A normalized currency quote (before direction is derived).
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuote {
    pub pair: CurrencyPair,
    pub last: Quoted<f64>,
    pub open: Quoted<f64>,
}

/// Intraday direction of a currency pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Unknown,
}

/// One pair in the published currency board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyEntry {
    #[serde(skip)]
    pub pair: CurrencyPair,
    pub last: Quoted<f64>,
    pub open: Quoted<f64>,
    pub direction: Direction,
}

/// Pair label → {last, open, direction}, always all six pairs in table order.
///
/// Serializes as a JSON object keyed by pair label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrencySnapshot {
    entries: Vec<CurrencyEntry>,
}

impl CurrencySnapshot {
    pub fn new(entries: Vec<CurrencyEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, pair: CurrencyPair) -> Option<&CurrencyEntry> {
        self.entries.iter().find(|e| e.pair == pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CurrencySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.pair.label(), entry)?;
        }
        map.end()
    }
}

/// Categorical reading of the 2s10s slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurveState {
    Flattening,
    Steepening,
}

impl CurveState {
    pub fn from_slope(slope: f64) -> Self {
        if slope < 0.0 {
            CurveState::Flattening
        } else {
            CurveState::Steepening
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CurveState::Flattening => "Flattening",
            CurveState::Steepening => "Steepening",
        }
    }

    /// Flattening is rendered with a warning affordance, steepening with a positive one.
    pub fn is_warning(self) -> bool {
        self == CurveState::Flattening
    }
}

/// The treasury curve as plotted: maturities in provider order plus the 2s10s slope.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct YieldCurveSnapshot {
    pub maturities: Vec<String>,
    pub yields: Vec<f64>,
    pub slope: f64,
}

impl YieldCurveSnapshot {
    pub fn state(&self) -> CurveState {
        CurveState::from_slope(self.slope)
    }

    /// `2/10 Year Slope: -0.30 - Flattening`
    pub fn slope_text(&self) -> String {
        format!(
            "2/10 Year Slope: {:.2} - {}",
            self.slope,
            self.state().display_name()
        )
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.maturities
            .iter()
            .map(String::as_str)
            .zip(self.yields.iter().copied())
    }
}

/// Outcome of one domain's fetch within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DomainStatus {
    /// No cycle has run yet.
    Pending,
    /// Fetch succeeded; `dropped` records could not be normalized.
    Fetched { records: usize, dropped: usize },
    /// Fetch failed; the domain's partial is empty.
    Failed { reason: String },
}

impl DomainStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, DomainStatus::Failed { .. })
    }

    pub fn summary(&self) -> String {
        match self {
            DomainStatus::Pending => "pending".to_string(),
            DomainStatus::Fetched { records, dropped } if *dropped == 0 => {
                format!("ok ({records})")
            }
            DomainStatus::Fetched { records, dropped } => {
                format!("partial ({records}, {dropped} dropped)")
            }
            DomainStatus::Failed { reason } => format!("failed: {reason}"),
        }
    }
}

/// Per-domain fetch status for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub bonds: DomainStatus,
    pub futures: DomainStatus,
    pub currencies: DomainStatus,
}

impl SourceReport {
    pub fn pending() -> Self {
        Self {
            bonds: DomainStatus::Pending,
            futures: DomainStatus::Pending,
            currencies: DomainStatus::Pending,
        }
    }

    pub fn get(&self, domain: Domain) -> &DomainStatus {
        match domain {
            Domain::Bonds => &self.bonds,
            Domain::Futures => &self.futures,
            Domain::Currencies => &self.currencies,
        }
    }
}

/// One immutable, fully computed cycle's worth of data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// `0` for the placeholder published before the first cycle.
    pub sequence: u64,
    pub generated_at: DateTime<Utc>,
    pub yield_curve: YieldCurveSnapshot,
    pub futures: Vec<FuturesQuote>,
    pub currencies: CurrencySnapshot,
    pub sources: SourceReport,
}

impl Snapshot {
    /// Placeholder held by a store before any cycle completes.
    pub fn empty() -> Self {
        Self {
            sequence: 0,
            generated_at: Utc::now(),
            yield_curve: YieldCurveSnapshot::default(),
            futures: Vec::new(),
            currencies: CurrencySnapshot::default(),
            sources: SourceReport::pending(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.sequence == 0
    }
}

/// Default CNBC quote web service endpoint.
pub const DEFAULT_QUOTE_URL: &str =
    "https://quote.cnbc.com/quote-html-webservice/restQuote/symbolType/symbol";

/// Runtime configuration of the feed.
///
/// This is derived from CLI flags / environment (plus defaults).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub refresh_interval: Duration,
    /// Upper bound on each individual domain fetch.
    pub fetch_timeout: Duration,
    pub quote_url: String,
    /// Read quotes from a JSON fixture instead of the network.
    pub fixture: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(30_000),
            fetch_timeout: Duration::from_millis(10_000),
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            fixture: None,
        }
    }
}

impl FeedConfig {
    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.refresh_interval.is_zero() {
            let msg = "refresh interval must be a positive duration";
            return Err(FeedError::Configuration(msg.into()));
        }
        if self.fetch_timeout.is_zero() {
            let msg = "fetch timeout must be a positive duration";
            return Err(FeedError::Configuration(msg.into()));
        }
        let is_http = ["http://", "https://"]
            .iter()
            .any(|scheme| self.quote_url.starts_with(scheme));
        if self.fixture.is_none() && !is_http {
            let msg = format!("quote url must be http(s), got {:?}", self.quote_url);
            return Err(FeedError::Configuration(msg));
        }
        validate_currency_table(&CURRENCY_TABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_is_valid() {
        validate_currency_table(&CURRENCY_TABLE).unwrap();
        assert_eq!(CURRENCY_TABLE[1], (CurrencyPair::UsdJpy, "JPY="));
        assert_eq!(CurrencyPair::AudUsd.label(), "AUD/USD");
    }

    #[test]
    fn table_with_duplicate_code_is_rejected() {
        let mut table = CURRENCY_TABLE;
        table[1].1 = "EUR=";
        let err = validate_currency_table(&table).unwrap_err();
        assert!(matches!(err, FeedError::Configuration(_)));
    }

    #[test]
    fn short_table_is_rejected() {
        let err = validate_currency_table(&CURRENCY_TABLE[..5]).unwrap_err();
        assert_eq!(
            err,
            FeedError::Configuration("currency table must have 6 entries, found 5".into())
        );
    }

    #[test]
    fn zero_interval_is_a_configuration_error() {
        let config = FeedConfig {
            refresh_interval: Duration::ZERO,
            ..FeedConfig::default()
        };
        assert!(matches!(config.validate(), Err(FeedError::Configuration(_))));
        FeedConfig::default().validate().unwrap();
    }

    #[test]
    fn slope_text_uses_two_decimals_and_label() {
        let curve = YieldCurveSnapshot {
            maturities: vec!["US2Y".into(), "US10Y".into()],
            yields: vec![4.5, 4.2],
            slope: 4.2 - 4.5,
        };
        assert_eq!(curve.slope_text(), "2/10 Year Slope: -0.30 - Flattening");
        assert!(curve.state().is_warning());

        let flat = YieldCurveSnapshot::default();
        assert_eq!(flat.state(), CurveState::Steepening);
    }

    #[test]
    fn unavailable_serializes_as_marker() {
        let quote = FuturesQuote {
            symbol: Quoted::Value("@CL.1".into()),
            name: Quoted::Unavailable,
            last_price: Quoted::Value("71.20".into()),
            change: Quoted::Unavailable,
            change_pct: Quoted::Unavailable,
            expiration_date: Quoted::Unavailable,
            is_halted: Quoted::Value(false),
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["symbol"], "@CL.1");
        assert_eq!(json["name"], "N/A");
        assert_eq!(json["is_halted"], false);
    }
}
