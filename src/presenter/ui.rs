use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;

use super::app::DashboardView;
use crate::indicator::Signal;
use crate::orderbook::Level;

pub fn draw(f: &mut Frame, view: &DashboardView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // summary
            Constraint::Min(3),    // ladder
        ])
        .split(f.area());

    f.render_widget(summary(view), chunks[0]);

    let sides = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    f.render_widget(ladder("Asks", &view.asks, Color::Red), sides[0]);
    f.render_widget(ladder("Bids", &view.bids, Color::Green), sides[1]);
}

fn summary(view: &DashboardView) -> Paragraph<'static> {
    let mut book_spans = vec![Span::raw(format!(
        "{} [{}]  last {}  mid {}  spread {} bps  imbalance {}",
        view.symbol,
        view.status,
        fmt_opt(view.last_price, 2),
        fmt_opt(view.metrics.mid_price, 2),
        fmt_opt(view.metrics.spread_bps, 3),
        fmt_opt(view.metrics.imbalance, 3),
    ))];
    if view.crossed {
        book_spans.push(Span::styled(
            "  CROSSED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    let book_line = Line::from(book_spans);

    let rsi_line = match view.rsi {
        Some(reading) => Line::from(vec![
            Span::raw(format!("RSI({}) {:.2}  ", view.rsi_periods, reading.value_f64())),
            Span::styled(
                reading.signal.as_str(),
                Style::default()
                    .fg(signal_color(reading.signal))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(format!(
            "RSI({}) warming up, {} samples to go",
            view.rsi_periods, view.samples_needed
        )),
    };

    Paragraph::new(vec![book_line, rsi_line])
        .block(Block::default().title("depthscope (q to quit)").borders(Borders::ALL))
}

fn ladder<'a>(title: &'a str, levels: &[Level], color: Color) -> Table<'a> {
    let rows = levels.iter().map(|level| {
        Row::new(vec![level.price.to_string(), level.volume.to_string()])
            .style(Style::default().fg(color))
    });

    Table::new(rows, [Constraint::Length(16), Constraint::Length(16)])
        .header(Row::new(vec!["Price", "Volume"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().title(title).borders(Borders::ALL))
}

fn signal_color(signal: Signal) -> Color {
    match signal {
        Signal::Buy => Color::Green,
        Signal::Hold => Color::Yellow,
        Signal::Sell => Color::Red,
    }
}

fn fmt_opt(value: Option<Decimal>, dp: u32) -> String {
    value
        .map(|v| v.round_dp(dp).to_string())
        .unwrap_or_else(|| "-".to_string())
}
