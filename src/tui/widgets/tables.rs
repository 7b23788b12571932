//! Largest tables by data + index size.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::fmt::{FmtStyle, format_bytes, format_count};
use crate::tui::state::DisplayController;
use crate::tui::style::{Styles, Theme};

pub fn render_tables(frame: &mut Frame, area: Rect, view: &DisplayController) {
    let block = Block::default()
        .title(" Largest Tables ")
        .borders(Borders::ALL)
        .border_style(Styles::border(Theme::TABLES_BORDER));

    let tables = view.tables();
    if tables.is_empty() {
        let message = if view.snapshot().is_some() {
            "No tables visible"
        } else {
            "No data available"
        };
        frame.render_widget(Paragraph::new(message).style(Styles::dim()).block(block), area);
        return;
    }

    let header = Row::new(vec!["TABLE", "ROWS", "DATA", "INDEX", "TOTAL"])
        .style(Styles::table_header())
        .height(1);
    let rows: Vec<Row> = tables
        .iter()
        .map(|t| {
            Row::new(vec![
                t.name.clone(),
                format_count(t.rows),
                format_bytes(t.data_size, FmtStyle::Compact),
                format_bytes(t.index_size, FmtStyle::Compact),
                format_bytes(t.total_size(), FmtStyle::Compact),
            ])
            .style(Styles::default())
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(block)
    .column_spacing(1);
    frame.render_widget(table, area);
}
