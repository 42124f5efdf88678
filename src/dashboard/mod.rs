//! Dashboard module
//!
//! Provides an overview page with the income, expense and balance totals, a
//! monthly chart and the transaction list, kept up to date with server-sent
//! events.

mod cards;
mod charts;
mod events;
mod handlers;

pub use events::get_live_events;
pub use handlers::{get_dashboard_chart, get_dashboard_page};
