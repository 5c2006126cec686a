//! Formatted terminal output for a snapshot.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (golden tests below)

use crate::domain::{
    CurrencyEntry, CurrencySnapshot, Direction, Domain, FuturesQuote, Snapshot,
    YieldCurveSnapshot,
};

/// Full report: header, curve table with slope, currency board, futures table.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== pulse - Market Snapshot #{} ===\n", snapshot.sequence));
    out.push_str(&format!(
        "Generated: {}\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Sources: {}\n", format_sources(snapshot)));

    out.push_str("\nTreasury Yield Curve:\n");
    out.push_str(&format_yield_curve(&snapshot.yield_curve));

    out.push_str("\nCurrent Currency Prices:\n");
    out.push_str(&format_currencies(&snapshot.currencies));

    out.push_str("\nFutures and Commodities:\n");
    out.push_str(&format_futures_table(&snapshot.futures));

    out
}

/// One line per snapshot for `pulse watch`.
pub fn format_summary_line(snapshot: &Snapshot) -> String {
    let board = snapshot
        .currencies
        .iter()
        .map(|e| format!("{} {}", e.pair, direction_arrow(e.direction)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "#{} {} | {} | {} | futures={}",
        snapshot.sequence,
        snapshot.generated_at.format("%H:%M:%S"),
        snapshot.yield_curve.slope_text(),
        board,
        snapshot.futures.len()
    )
}

pub fn format_sources(snapshot: &Snapshot) -> String {
    Domain::ALL
        .iter()
        .map(|&d| format!("{d} {}", snapshot.sources.get(d).summary()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Maturity/yield table followed by the slope line.
pub fn format_yield_curve(curve: &YieldCurveSnapshot) -> String {
    let mut out = String::new();
    if curve.maturities.is_empty() {
        out.push_str("  (no treasury data)\n");
    }
    for (maturity, y) in curve.points() {
        out.push_str(&format!("  {maturity:<8}{y:>7.2}%\n"));
    }
    out.push_str(&curve.slope_text());
    out.push('\n');
    out
}

/// `EUR/USD: 1.1 (Open: 1.05)  up`
pub fn format_currencies(currencies: &CurrencySnapshot) -> String {
    let mut out = String::new();
    for entry in currencies.iter() {
        let tile = currency_tile(entry);
        let label = direction_label(entry.direction);
        out.push_str(&format!("  {tile:<32}{label}\n"));
    }
    out
}

pub fn currency_tile(entry: &CurrencyEntry) -> String {
    format!("{}: {} (Open: {})", entry.pair, entry.last, entry.open)
}

pub fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Unknown => "unknown",
    }
}

fn direction_arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "▲",
        Direction::Down => "▼",
        Direction::Unknown => "·",
    }
}

pub const FUTURES_HEADERS: [&str; 7] = [
    "Symbol",
    "Name",
    "Last Price",
    "Change",
    "Change %",
    "Expiration",
    "Halted",
];

/// Cells of one futures row, in `FUTURES_HEADERS` order.
pub fn futures_cells(q: &FuturesQuote) -> [String; 7] {
    [
        q.symbol.to_string(),
        q.name.to_string(),
        q.last_price.to_string(),
        q.change.to_string(),
        q.change_pct.to_string(),
        q.expiration_date.to_string(),
        match q.is_halted.value() {
            Some(true) => "yes".to_string(),
            Some(false) => "no".to_string(),
            None => q.is_halted.to_string(),
        },
    ]
}

/// Aligned futures table (header + one row per quote).
pub fn format_futures_table(futures: &[FuturesQuote]) -> String {
    if futures.is_empty() {
        return "  (no futures data)\n".to_string();
    }

    let rows: Vec<[String; 7]> = futures.iter().map(futures_cells).collect();
    let mut widths = FUTURES_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(&FUTURES_HEADERS.map(str::to_string), &widths));
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    out
}

fn format_row(cells: &[String; 7], widths: &[usize; 7]) -> String {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("  {}\n", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{BondQuote, CurrencyPair, CurrencyQuote, Quoted};
    use crate::metrics::{currency_snapshot, yield_curve};

    fn bond(symbol: &str, yield_pct: f64) -> BondQuote {
        BondQuote {
            symbol: symbol.to_string(),
            yield_pct,
        }
    }

    fn quote(pair: CurrencyPair, last: Quoted<f64>, open: Quoted<f64>) -> CurrencyQuote {
        CurrencyQuote { pair, last, open }
    }

    #[test]
    fn yield_curve_golden() {
        let curve = yield_curve(&[bond("US2Y", 4.5), bond("US10Y", 4.2)]);
        let expected = concat!(
            "  US2Y       4.50%\n",
            "  US10Y      4.20%\n",
            "2/10 Year Slope: -0.30 - Flattening\n",
        );
        assert_eq!(format_yield_curve(&curve), expected);
    }

    #[test]
    fn currency_board_golden() {
        let quotes: Vec<CurrencyQuote> = CurrencyPair::ALL
            .iter()
            .map(|&pair| match pair {
                CurrencyPair::EurUsd => quote(pair, Quoted::Value(1.1), Quoted::Value(1.05)),
                CurrencyPair::GbpUsd => quote(pair, Quoted::Value(1.2), Quoted::Value(1.2)),
                _ => quote(pair, Quoted::Unavailable, Quoted::Unavailable),
            })
            .collect();
        let board = format_currencies(&currency_snapshot(&quotes));
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "  EUR/USD: 1.1 (Open: 1.05)       up");
        assert_eq!(lines[2], "  GBP/USD: 1.2 (Open: 1.2)        down");
        assert_eq!(lines[3], "  USD/CAD: N/A (Open: N/A)        unknown");
    }

    #[test]
    fn futures_table_aligns_columns() {
        let quotes = vec![
            FuturesQuote {
                symbol: Quoted::Value("@CL.1".into()),
                name: Quoted::Value("WTI Crude".into()),
                last_price: Quoted::Value("71.20".into()),
                change: Quoted::Value("-0.45".into()),
                change_pct: Quoted::Value("-0.63%".into()),
                expiration_date: Quoted::Value("2025-01-21".into()),
                is_halted: Quoted::Value(false),
            },
            FuturesQuote {
                symbol: Quoted::Value("@GC.1".into()),
                name: Quoted::Unavailable,
                last_price: Quoted::Unavailable,
                change: Quoted::Unavailable,
                change_pct: Quoted::Unavailable,
                expiration_date: Quoted::Unavailable,
                is_halted: Quoted::Unavailable,
            },
        ];
        let expected = concat!(
            "  Symbol  Name       Last Price  Change  Change %  Expiration  Halted\n",
            "  @CL.1   WTI Crude  71.20       -0.45   -0.63%    2025-01-21  no\n",
            "  @GC.1   N/A        N/A         N/A     N/A       N/A         N/A\n",
        );
        assert_eq!(format_futures_table(&quotes), expected);
        assert_eq!(format_futures_table(&[]), "  (no futures data)\n");
    }

    #[test]
    fn placeholder_snapshot_reports_pending_sources() {
        let snapshot = Snapshot::empty();
        assert_eq!(
            format_sources(&snapshot),
            "bonds pending | futures pending | currencies pending"
        );
        let report = format_snapshot(&snapshot);
        assert!(report.contains("(no treasury data)"));
        assert!(report.contains("2/10 Year Slope: 0.00 - Steepening"));
    }
}
