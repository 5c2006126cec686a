//! ASCII plotting of the treasury curve for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Maturities are spaced evenly along x in provider order; observed yields are
//! drawn as `o` joined by a `-` line.

use crate::domain::YieldCurveSnapshot;

/// Render the yield curve into a `width` x `height` character grid.
pub fn render_yield_curve(curve: &YieldCurveSnapshot, width: usize, height: usize) -> String {
    let (Some(first), Some(last)) = (curve.maturities.first(), curve.maturities.last()) else {
        return "Plot: no treasury data\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(&curve.yields).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let n = curve.yields.len();
    let cells: Vec<(usize, usize)> = curve
        .yields
        .iter()
        .enumerate()
        .map(|(i, &y)| (map_x(i, n, width), map_y(y, y_min, y_max, height)))
        .collect();

    // Draw the line first so points can overlay.
    for pair in cells.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {first}..{last} ({n} tenors) | y=[{y_min:.2}, {y_max:.2}]%\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn y_range(yields: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &y in yields {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat or single-point curve: center it.
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(&str, f64)]) -> YieldCurveSnapshot {
        YieldCurveSnapshot {
            maturities: points.iter().map(|(m, _)| m.to_string()).collect(),
            yields: points.iter().map(|(_, y)| *y).collect(),
            slope: 0.0,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_yield_curve(&curve(&[("US2Y", 4.0), ("US10Y", 5.0)]), 10, 5);
        let expected = concat!(
            "Plot: US2Y..US10Y (2 tenors) | y=[3.95, 5.05]%\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn plot_golden_humped_curve() {
        let txt = render_yield_curve(
            &curve(&[("US2Y", 4.0), ("US5Y", 5.0), ("US10Y", 4.5)]),
            11,
            5,
        );
        let expected = concat!(
            "Plot: US2Y..US10Y (3 tenors) | y=[3.95, 5.05]%\n",
            "     o-    \n",
            "    -  --  \n",
            "  --     -o\n",
            " -         \n",
            "o          \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_and_single_point_curves_do_not_panic() {
        assert_eq!(
            render_yield_curve(&YieldCurveSnapshot::default(), 20, 5),
            "Plot: no treasury data\n"
        );
        let txt = render_yield_curve(&curve(&[("US10Y", 4.2)]), 10, 5);
        assert!(txt.lines().nth(3).unwrap().starts_with('o'));
    }
}
