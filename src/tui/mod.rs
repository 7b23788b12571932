//! Terminal User Interface for dbtop.
//!
//! A single-instance dashboard: connection info, server statistics, the
//! busiest sessions and the largest tables, refreshed by a background
//! poll loop.

mod app;
mod event;
mod input;
mod render;
mod state;
mod style;
mod widgets;

pub use app::{App, InstanceInfo};
pub use event::{Event, EventHandler, INPUT_POLL_TIMEOUT};
pub use input::handle_key;
pub use state::{Command, DisplayController, REFRESH_STEP, SortField, SortState, ViewBudget};
