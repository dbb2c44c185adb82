use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::cursor::Show;
use ratatui::crossterm::{execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::app::{Dashboard, DashboardView};
use super::ui::draw;
use crate::error::Result;
use crate::AppState;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Draw the book until the user quits
pub async fn run_terminal(state: Arc<AppState>) -> Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut term = Terminal::new(backend)?;

    let res = render_loop(&mut term, &state).await;
    restore_terminal()?;
    res
}

/// Leave raw mode and the alternate screen; safe to call more than once
pub fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(stdout(), terminal::LeaveAlternateScreen, Show)?;
    Ok(())
}

async fn render_loop(term: &mut Term, state: &AppState) -> Result<()> {
    let mut dashboard = Dashboard::new(state)?;
    let mut ticker = interval(state.config.render_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if quit_requested()? {
            info!("Quit requested");
            return Ok(());
        }

        let view = {
            let book = state.book.read().await;
            dashboard.tick(&book, Instant::now())
        };
        term.draw(|f| draw(f, &view))?;
    }
}

/// Drain pending key events without blocking the tick
fn quit_requested() -> Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(true)
                }
                _ => {}
            }
        }
    }
    Ok(false)
}

/// Same tick without a terminal; logs a status line every status interval
pub async fn run_headless(state: Arc<AppState>) -> Result<()> {
    let mut dashboard = Dashboard::new(&state)?;
    let mut ticker = interval(state.config.render_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let status_every = state.config.status_interval();
    let mut last_status: Option<Instant> = None;

    loop {
        ticker.tick().await;
        let now = Instant::now();

        let view = {
            let book = state.book.read().await;
            dashboard.tick(&book, now)
        };

        if last_status.map_or(true, |at| now.duration_since(at) >= status_every) {
            last_status = Some(now);
            log_status(&view);
        }
    }
}

fn log_status(view: &DashboardView) {
    info!(
        symbol = %view.symbol,
        stream = %view.status,
        best_bid = ?view.metrics.best_bid,
        best_ask = ?view.metrics.best_ask,
        spread_bps = ?view.metrics.spread_bps,
        imbalance = ?view.metrics.imbalance,
        last_price = ?view.last_price,
        rsi = ?view.rsi.map(|r| r.value),
        signal = view.rsi.map(|r| r.signal.as_str()).unwrap_or("-"),
        rsi_samples_needed = view.samples_needed,
        "Order book status"
    );
}
