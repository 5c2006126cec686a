//! Ratatui-based terminal UI.
//!
//! The TUI is a pure consumer of published snapshots: it polls the scheduler's
//! store, redraws when a newer sequence appears, and can request an
//! out-of-band refresh. It never talks to the data source directly.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::data::MarketSource;
use crate::domain::{Direction, Domain, DomainStatus, Snapshot};
use crate::error::AppError;
use crate::report::{FUTURES_HEADERS, currency_tile, futures_cells};
use crate::scheduler::SchedulerHandle;

mod plotters_chart;

use plotters_chart::YieldCurveChart;

/// Futures rows shown per page.
pub const FUTURES_PAGE_SIZE: usize = 10;

const DISCLAIMER: &str =
    "Data sourced from CNBC. This dashboard is for educational and informational purposes only.";

/// Start the TUI on top of a running scheduler.
pub fn run<S: MarketSource + 'static>(handle: &SchedulerHandle<S>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(handle);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        if let Err(e) = enable_raw_mode() {
            return Err(AppError::new(4, format!("Failed to enable raw mode: {e}")));
        }
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<'a, S: MarketSource + 'static> {
    handle: &'a SchedulerHandle<S>,
    snapshot: Arc<Snapshot>,
    refreshing: bool,
    futures_page: usize,
    status: String,
}

impl<'a, S: MarketSource + 'static> App<'a, S> {
    fn new(handle: &'a SchedulerHandle<S>) -> Self {
        Self {
            handle,
            snapshot: handle.store().latest(),
            refreshing: handle.is_refreshing(),
            futures_page: 0,
            status: "Waiting for first refresh...".to_string(),
        }
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.sync_snapshot() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            let ready = event::poll(Duration::from_millis(200))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?;
            if !ready {
                continue;
            }

            let input = event::read()
                .map_err(|e| AppError::new(4, format!("Event read error: {e}")))?;
            match input {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Pick up a newer snapshot or a change in refresh state.
    fn sync_snapshot(&mut self) -> bool {
        let mut changed = false;

        let latest = self.handle.store().latest();
        if latest.sequence != self.snapshot.sequence {
            self.snapshot = latest;
            let last = page_count(self.snapshot.futures.len()) - 1;
            self.futures_page = self.futures_page.min(last);
            self.status = format!(
                "Updated {}",
                self.snapshot.generated_at.format("%H:%M:%S UTC")
            );
            changed = true;
        }

        let refreshing = self.handle.is_refreshing();
        if refreshing != self.refreshing {
            self.refreshing = refreshing;
            changed = true;
        }
        changed
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => {
                self.status = if self.handle.refresh_now() {
                    "Refresh requested.".to_string()
                } else {
                    "Refresh already in progress.".to_string()
                };
            }
            KeyCode::Left | KeyCode::PageUp => {
                self.futures_page = self.futures_page.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::PageDown => {
                let last = page_count(self.snapshot.futures.len()) - 1;
                self.futures_page = (self.futures_page + 1).min(last);
            }
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(12),
                Constraint::Length(FUTURES_PAGE_SIZE as u16 + 3),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_markets(frame, chunks[1]);
        self.draw_futures(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("pulse", Style::default().fg(Color::Cyan)),
            Span::raw(" - Daily Economics"),
        ]));

        let stamp = self.snapshot.generated_at;
        let generated = if self.snapshot.is_placeholder() {
            "-".to_string()
        } else {
            stamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        };
        let mut info = format!(
            "snapshot #{} | generated {generated} | refresh every {}s",
            self.snapshot.sequence,
            self.handle.interval().as_secs_f64(),
        );
        if self.refreshing {
            info.push_str(" | refreshing…");
        }
        lines.push(Line::from(Span::styled(info, Style::default().fg(Color::Gray))));

        let mut spans = Vec::new();
        for (i, domain) in Domain::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" | "));
            }
            let status = self.snapshot.sources.get(*domain);
            spans.push(Span::styled(
                format!("{domain}: {}", status.summary()),
                Style::default().fg(status_color(status)),
            ));
        }
        lines.push(Line::from(spans));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_markets(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_currencies(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let curve = &self.snapshot.yield_curve;
        let state = curve.state();
        let slope_color = if state.is_warning() {
            Color::Red
        } else {
            Color::Green
        };
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let block = Block::default()
            .title("Treasury Yield Curve")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(inner);

        if curve.maturities.is_empty() {
            let msg = if self.snapshot.sources.bonds.is_failed() {
                "Unable to fetch treasury data."
            } else {
                "Waiting for data..."
            };
            frame.render_widget(
                Paragraph::new(msg).style(Style::default().fg(Color::Yellow)),
                rows[0],
            );
        } else {
            let points: Vec<(f64, f64)> = curve
                .yields
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f64, y))
                .collect();
            let widget = YieldCurveChart {
                maturities: &curve.maturities,
                points: &points,
                y_bounds: y_bounds(&curve.yields),
                line_color: if state.is_warning() {
                    RGBColor(255, 0, 0)
                } else {
                    RGBColor(0, 255, 0)
                },
            };
            frame.render_widget(widget, rows[0]);
        }

        let slope = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    format!("2/10 Year Slope: {:.2}", curve.slope),
                    bold.fg(slope_color),
                ),
                Span::styled(format!(" - {}", state.display_name()), bold),
            ]),
            Line::from(Span::styled(
                "Difference between the 10-year and 2-year U.S. Treasury yields.",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(slope, rows[1]);
    }

    fn draw_currencies(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Current Currency Prices")
            .borders(Borders::ALL);

        if self.snapshot.sources.currencies.is_failed() {
            let p = Paragraph::new("Unable to fetch currency data.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(p, area);
            return;
        }

        let lines: Vec<Line> = self
            .snapshot
            .currencies
            .iter()
            .map(|entry| {
                Line::from(Span::styled(
                    format!(" {} ", currency_tile(entry)),
                    direction_style(entry.direction),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_futures(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let futures = &self.snapshot.futures;
        let pages = page_count(futures.len());
        let (start, end) = page_range(futures.len(), self.futures_page);

        let title = format!(
            "Futures and Commodities (page {}/{pages})",
            self.futures_page.min(pages - 1) + 1
        );
        let block = Block::default().title(title).borders(Borders::ALL);

        if futures.is_empty() {
            let msg = if self.snapshot.sources.futures.is_failed() {
                "Unable to fetch futures data."
            } else {
                "Waiting for data..."
            };
            let p = Paragraph::new(msg)
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(p, area);
            return;
        }

        let header_style = Style::default()
            .fg(Color::Black)
            .bg(Color::LightBlue)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(FUTURES_HEADERS.map(Cell::from)).style(header_style);
        let rows = futures[start..end]
            .iter()
            .map(|q| Row::new(futures_cells(q).into_iter().map(Cell::from)));
        let widths = [
            Constraint::Length(8),
            Constraint::Min(18),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Length(7),
        ];

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "r refresh  ←/→ futures page  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Number of futures pages (at least one, so an empty table still has page 1/1).
fn page_count(len: usize) -> usize {
    len.div_ceil(FUTURES_PAGE_SIZE).max(1)
}

/// Row range for `page`, clamped to the last page.
fn page_range(len: usize, page: usize) -> (usize, usize) {
    let page = page.min(page_count(len) - 1);
    let start = (page * FUTURES_PAGE_SIZE).min(len);
    let end = (start + FUTURES_PAGE_SIZE).min(len);
    (start, end)
}

/// Y bounds padded by 5% (or ±0.5 for a flat curve).
fn y_bounds(yields: &[f64]) -> [f64; 2] {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &y in yields {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return [0.0, 1.0];
    }
    if y_max <= y_min {
        return [y_min - 0.5, y_max + 0.5];
    }
    let pad = (y_max - y_min) * 0.05;
    [y_min - pad, y_max + pad]
}

fn direction_style(direction: Direction) -> Style {
    let bg = match direction {
        Direction::Up => Color::Green,
        Direction::Down => Color::Red,
        Direction::Unknown => Color::DarkGray,
    };
    Style::default().fg(Color::White).bg(bg)
}

fn status_color(status: &DomainStatus) -> Color {
    match status {
        DomainStatus::Pending => Color::Gray,
        DomainStatus::Fetched { dropped: 0, .. } => Color::Green,
        DomainStatus::Fetched { .. } => Color::Yellow,
        DomainStatus::Failed { .. } => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn futures_pages_of_ten() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(14), 2);
        assert_eq!(page_range(14, 0), (0, 10));
        assert_eq!(page_range(14, 1), (10, 14));
        assert_eq!(page_range(14, 9), (10, 14));
        assert_eq!(page_range(0, 0), (0, 0));
    }

    #[test]
    fn y_bounds_pad_and_handle_flat_curves() {
        let [lo, hi] = y_bounds(&[4.0, 5.0]);
        assert!((lo - 3.95).abs() < 1e-12 && (hi - 5.05).abs() < 1e-12);
        let [lo, hi] = y_bounds(&[4.2]);
        assert!((lo - 3.7).abs() < 1e-12 && (hi - 4.7).abs() < 1e-12);
        assert_eq!(y_bounds(&[]), [0.0, 1.0]);
    }

    #[test]
    fn currency_tiles_colored_by_direction() {
        assert_eq!(direction_style(Direction::Up).bg, Some(Color::Green));
        assert_eq!(direction_style(Direction::Down).bg, Some(Color::Red));
        let unknown = direction_style(Direction::Unknown);
        assert_eq!(unknown.bg, Some(Color::DarkGray));
    }
}
