//! Plotters-powered yield curve chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! Maturities are categorical: point `i` sits at `x = i` and the tick formatter
//! maps integer positions back to the maturity code.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct YieldCurveChart<'a> {
    /// Maturity codes in provider order (x tick labels).
    pub maturities: &'a [String],
    /// `(index, yield_pct)` points.
    pub points: &'a [(f64, f64)],
    pub y_bounds: [f64; 2],
    /// Line color; follows the curve state.
    pub line_color: RGBColor,
}

impl<'a> Widget for YieldCurveChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let n = self.maturities.len();
        let x0 = -0.5;
        let x1 = n.max(1) as f64 - 0.5;
        let [y0, y1] = self.y_bounds;
        if !(y0.is_finite() && y1.is_finite()) || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("maturity")
                .y_desc("yield (%)")
                .x_labels(n.max(2))
                .y_labels(5)
                .x_label_formatter(&|v| maturity_label(self.maturities, *v))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line = LineSeries::new(self.points.iter().copied(), &self.line_color);
            chart.draw_series(line)?;

            // `Circle` markers map radii incorrectly in this backend; a
            // colored `Pixel` gives a clean dot.
            let dots = self.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE));
            chart.draw_series(dots)?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Label for an x tick: the maturity at the nearest integer position, or blank
/// between categories.
pub fn maturity_label(maturities: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 0.25 || nearest < 0.0 {
        return String::new();
    }
    maturities
        .get(nearest as usize)
        .cloned()
        .unwrap_or_default()
}
