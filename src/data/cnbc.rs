//! CNBC quote web service client.
//!
//! One request per domain: the domain's symbol universe is pipe-joined into the
//! `symbols` query parameter, and the response carries one quote object per
//! symbol under `FormattedQuoteResult.FormattedQuote`.

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::{CURRENCY_TABLE, Domain, FeedConfig, RawRecord};
use crate::error::FeedError;

use super::source::MarketSource;

const USER_AGENT: &str = concat!("macro-pulse/", env!("CARGO_PKG_VERSION"));

/// Treasury tenors plus a few non-US benchmarks (the latter are filtered out
/// by the bond normalizer).
pub const BOND_SYMBOLS: &[&str] = &[
    "US1M", "US3M", "US6M", "US1Y", "US2Y", "US3Y", "US5Y", "US7Y", "US10Y", "US20Y", "US30Y",
    "UK10Y-GB", "DE10Y-DE", "JP10Y-JP",
];

/// Front-month energy, metals, equity index and grain contracts.
pub const FUTURES_SYMBOLS: &[&str] = &[
    "@CL.1", "@LCO.1", "@NG.1", "@RB.1", "@GC.1", "@SI.1", "@HG.1", "@PL.1", "@SP.1", "@ND.1",
    "@DJ.1", "@C.1", "@W.1", "@S.1",
];

/// Non-canonical crosses requested alongside the canonical six.
const EXTRA_CURRENCY_SYMBOLS: &[&str] = &["CNY=", "INR=", "MXN=", "BRL="];

pub struct CnbcClient {
    client: Client,
    quote_url: String,
}

impl CnbcClient {
    /// Build a client whose every request is bounded by `config.fetch_timeout`.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            quote_url: config.quote_url.clone(),
        })
    }

    fn fetch_symbols(&self, domain: Domain, symbols: &[&str]) -> Result<Vec<RawRecord>, FeedError> {
        let joined = symbols.join("|");
        debug!(%domain, symbols = symbols.len(), "requesting quotes");

        let resp = self
            .client
            .get(&self.quote_url)
            .query(&[
                ("symbols", joined.as_str()),
                ("requestMethod", "itv"),
                ("noform", "1"),
                ("partnerId", "2"),
                ("fund", "1"),
                ("exthrs", "1"),
                ("output", "json"),
                ("events", "1"),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::unavailable(domain, "request timed out")
                } else {
                    FeedError::unavailable(domain, format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let reason = format!("request failed with status {status}");
            return Err(FeedError::unavailable(domain, reason));
        }

        let body: Value = match resp.json() {
            Ok(body) => body,
            Err(e) => {
                let reason = format!("failed to parse response: {e}");
                return Err(FeedError::unavailable(domain, reason));
            }
        };

        extract_quotes(body).map_err(|reason| FeedError::unavailable(domain, reason))
    }
}

impl MarketSource for CnbcClient {
    fn id(&self) -> &'static str {
        "cnbc"
    }

    fn fetch_bonds(&self) -> Result<Vec<RawRecord>, FeedError> {
        self.fetch_symbols(Domain::Bonds, BOND_SYMBOLS)
    }

    fn fetch_futures(&self) -> Result<Vec<RawRecord>, FeedError> {
        self.fetch_symbols(Domain::Futures, FUTURES_SYMBOLS)
    }

    fn fetch_currencies(&self) -> Result<Vec<RawRecord>, FeedError> {
        let symbols: Vec<&str> = CURRENCY_TABLE
            .iter()
            .map(|(_, code)| *code)
            .chain(EXTRA_CURRENCY_SYMBOLS.iter().copied())
            .collect();
        self.fetch_symbols(Domain::Currencies, &symbols)
    }
}

const MISSING_QUOTES: &str = "response missing FormattedQuoteResult.FormattedQuote";

/// Pull the quote objects out of a response body.
///
/// The service returns an array for multi-symbol requests and a bare object for
/// a single symbol. Non-object entries are skipped.
fn extract_quotes(body: Value) -> Result<Vec<RawRecord>, String> {
    let quotes = body
        .get("FormattedQuoteResult")
        .and_then(|result| result.get("FormattedQuote"));

    match quotes {
        Some(Value::Array(items)) => Ok(items.iter().filter_map(as_record).collect()),
        Some(Value::Object(record)) => Ok(vec![record.clone()]),
        Some(other) => Err(format!("unexpected FormattedQuote payload: {other}")),
        None => Err(MISSING_QUOTES.to_string()),
    }
}

fn as_record(value: &Value) -> Option<RawRecord> {
    value.as_object().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    use serde_json::json;

    #[test]
    fn extracts_array_of_quotes() {
        let body = json!({
            "FormattedQuoteResult": {
                "FormattedQuote": [
                    {"symbol": "US2Y", "last": "4.50%"},
                    "garbage",
                    {"symbol": "US10Y", "last": "4.20%"}
                ]
            }
        });
        let records = extract_quotes(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["symbol"], "US10Y");
    }

    #[test]
    fn single_symbol_response_is_an_object() {
        let body = json!({
            "FormattedQuoteResult": {"FormattedQuote": {"symbol": "EUR=", "last": "1.0850"}}
        });
        let records = extract_quotes(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["last"], "1.0850");
    }

    #[test]
    fn missing_quote_list_is_malformed() {
        let err = extract_quotes(json!({"error": "throttled"})).unwrap_err();
        assert!(err.contains("missing"), "{err}");
        assert!(extract_quotes(json!([1, 2])).is_err());
    }

    fn config_for(quote_url: String, timeout_ms: u64) -> FeedConfig {
        FeedConfig {
            quote_url,
            fetch_timeout: Duration::from_millis(timeout_ms),
            ..FeedConfig::default()
        }
    }

    #[test]
    fn unreachable_host_is_source_unavailable() {
        let config = config_for("http://127.0.0.1:9/quotes".to_string(), 500);
        let client = CnbcClient::new(&config).unwrap();
        let err = client.fetch_bonds().unwrap_err();
        let FeedError::SourceUnavailable { domain, .. } = err else {
            panic!("expected SourceUnavailable, got {err:?}");
        };
        assert_eq!(domain, Domain::Bonds);
    }

    #[test]
    fn silent_server_times_out_within_the_bound() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (done, hold) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            // Accept and never reply.
            let (_stream, _) = listener.accept().unwrap();
            let _ = hold.recv();
        });

        let config = config_for(format!("http://{addr}/quotes"), 300);
        let client = CnbcClient::new(&config).unwrap();
        let started = Instant::now();
        let err = client.fetch_currencies().unwrap_err();
        let elapsed = started.elapsed();

        let expected = FeedError::unavailable(Domain::Currencies, "request timed out");
        assert_eq!(err, expected);
        assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");

        drop(done);
        server.join().unwrap();
    }
}
