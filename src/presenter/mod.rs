//! Presenter: periodic render tick over the shared book
//!
//! Terminal mode draws a ladder with ratatui; headless mode logs status lines.

mod app;
mod run;
mod ui;

pub use app::{Dashboard, DashboardView};
pub use run::{restore_terminal, run_headless, run_terminal};
