//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::app::InstanceInfo;
use super::state::DisplayController;
use super::style::Styles;
use super::widgets::{
    PROCESS_CHROME_ROWS, SUMMARY_HEIGHT, render_header, render_help, render_processes,
    render_summary, render_tables,
};

/// Smallest height of the tables panel (borders and header).
const TABLES_MIN_HEIGHT: u16 = 3;

/// Rows taken by everything except process and table data rows.
pub const CHROME_ROWS: u16 =
    1 + SUMMARY_HEIGHT + PROCESS_CHROME_ROWS + TABLES_MIN_HEIGHT + 1;

/// Rows left for process and table data on a terminal of `height` rows.
pub fn content_rows(height: u16) -> usize {
    height.saturating_sub(CHROME_ROWS) as usize
}

/// Main render function.
pub fn render(frame: &mut Frame, view: &DisplayController, info: &InstanceInfo) {
    let area = frame.area();
    let process_height = (view.view_budget().rows() as u16).saturating_add(PROCESS_CHROME_ROWS);

    let chunks = Layout::vertical([
        Constraint::Length(1),              // Header
        Constraint::Length(SUMMARY_HEIGHT), // Connection info | statistics
        Constraint::Length(process_height), // Processes
        Constraint::Min(TABLES_MIN_HEIGHT), // Largest tables
        Constraint::Length(1),              // Controls
    ])
    .split(area);

    render_header(frame, chunks[0], view, info);
    render_summary(frame, chunks[1], view, info);
    render_processes(frame, chunks[2], view);
    render_tables(frame, chunks[3], view);
    render_controls(frame, chunks[4]);

    // Help popup (rendered last to overlay everything)
    if view.show_help() {
        render_help(frame, area, view.sort());
    }
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (idx, (key, action)) in [
        ("q", "quit"),
        ("s", "sort"),
        ("r", "reverse"),
        ("h", "help"),
        ("+/-", "refresh rate"),
    ]
    .into_iter()
    .enumerate()
    {
        if idx > 0 {
            spans.push(Span::styled(" | ", Styles::help()));
        }
        spans.push(Span::styled(key, Styles::help_key()));
        spans.push(Span::styled(format!(": {}", action), Styles::help()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
