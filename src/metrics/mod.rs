//! Derived metrics: the treasury curve with its 2s10s slope, and per-pair
//! currency direction.

use crate::domain::{
    BondQuote, CurrencyEntry, CurrencyQuote, CurrencySnapshot, Direction, Quoted,
    YieldCurveSnapshot,
};

pub const TWO_YEAR: &str = "US2Y";
pub const TEN_YEAR: &str = "US10Y";

/// Build the plotted curve and its 2s10s slope.
///
/// A missing 2y or 10y tenor contributes `0.0` to the slope. With duplicate
/// symbols the later quote wins for the slope, while both stay on the curve.
pub fn yield_curve(bonds: &[BondQuote]) -> YieldCurveSnapshot {
    let maturities = bonds.iter().map(|b| b.symbol.clone()).collect();
    let yields = bonds.iter().map(|b| b.yield_pct).collect();

    let tenor_yield = |symbol: &str| {
        bonds
            .iter()
            .rev()
            .find(|b| b.symbol == symbol)
            .map(|b| b.yield_pct)
            .unwrap_or(0.0)
    };
    let slope = tenor_yield(TEN_YEAR) - tenor_yield(TWO_YEAR);

    YieldCurveSnapshot {
        maturities,
        yields,
        slope,
    }
}

/// `Up` if last > open, `Down` if last <= open, `Unknown` if either is unavailable.
pub fn direction(last: &Quoted<f64>, open: &Quoted<f64>) -> Direction {
    match (last, open) {
        (Quoted::Value(last), Quoted::Value(open)) if last > open => Direction::Up,
        (Quoted::Value(_), Quoted::Value(_)) => Direction::Down,
        _ => Direction::Unknown,
    }
}

/// Attach a direction to every normalized currency quote.
pub fn currency_snapshot(quotes: &[CurrencyQuote]) -> CurrencySnapshot {
    CurrencySnapshot::new(
        quotes
            .iter()
            .map(|q| CurrencyEntry {
                pair: q.pair,
                last: q.last.clone(),
                open: q.open.clone(),
                direction: direction(&q.last, &q.open),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{CurrencyPair, CurveState};

    fn bond(symbol: &str, yield_pct: f64) -> BondQuote {
        BondQuote {
            symbol: symbol.to_string(),
            yield_pct,
        }
    }

    #[test]
    fn inverted_two_ten_is_flattening() {
        let curve = yield_curve(&[bond("US2Y", 4.50), bond("US10Y", 4.20)]);
        assert_eq!(curve.maturities, ["US2Y", "US10Y"]);
        assert_eq!(curve.yields, [4.50, 4.20]);
        assert!((curve.slope - -0.30).abs() < 1e-12);
        assert_eq!(curve.state(), CurveState::Flattening);
    }

    #[test]
    fn slope_ignores_other_tenors_and_order() {
        let curve = yield_curve(&[
            bond("US10Y", 4.40),
            bond("US1M", 5.30),
            bond("US2Y", 4.10),
            bond("US30Y", 4.60),
        ]);
        assert!((curve.slope - 0.30).abs() < 1e-12);
        assert_eq!(curve.state(), CurveState::Steepening);
        assert_eq!(curve.maturities[1], "US1M");
    }

    #[test]
    fn missing_tenor_defaults_to_zero() {
        let curve = yield_curve(&[bond("US10Y", 4.20)]);
        assert!((curve.slope - 4.20).abs() < 1e-12);

        let curve = yield_curve(&[bond("US2Y", 4.50)]);
        assert!((curve.slope - -4.50).abs() < 1e-12);

        let curve = yield_curve(&[]);
        assert_eq!(curve.slope, 0.0);
        assert_eq!(curve.state(), CurveState::Steepening);
    }

    #[test]
    fn direction_is_total_and_equality_is_down() {
        let v = Quoted::Value;
        let na = Quoted::Unavailable;
        assert_eq!(direction(&v(1.10), &v(1.05)), Direction::Up);
        assert_eq!(direction(&v(1.00), &v(1.05)), Direction::Down);
        assert_eq!(direction(&v(1.20), &v(1.20)), Direction::Down);
        assert_eq!(direction(&v(1.20), &na), Direction::Unknown);
        assert_eq!(direction(&na, &v(1.20)), Direction::Unknown);
    }

    #[test]
    fn currency_snapshot_keeps_every_pair() {
        let quotes: Vec<CurrencyQuote> = CurrencyPair::ALL
            .iter()
            .map(|&pair| CurrencyQuote {
                pair,
                last: Quoted::Unavailable,
                open: Quoted::Unavailable,
            })
            .collect();
        let snapshot = currency_snapshot(&quotes);
        assert_eq!(snapshot.len(), 6);
        assert!(snapshot.iter().all(|e| e.direction == Direction::Unknown));
    }
}
