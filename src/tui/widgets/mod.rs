//! TUI widgets for dbtop.

mod header;
mod help;
mod processes;
mod summary;
mod tables;

pub use header::render_header;
pub use help::render_help;
pub use processes::{PROCESS_CHROME_ROWS, render_processes};
pub use summary::{SUMMARY_HEIGHT, render_summary};
pub use tables::render_tables;
