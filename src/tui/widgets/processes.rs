//! Process list, sorted and truncated by the display controller.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::fmt::{FmtStyle, format_duration, normalize_query, truncate};
use crate::model::ProcessInfo;
use crate::tui::state::{DisplayController, SortField};
use crate::tui::style::{Styles, Theme};

/// Column layout: sortable columns carry their field.
const COLUMNS: [(&str, Option<SortField>, u16); 8] = [
    ("ID", Some(SortField::Id), 8),
    ("USER", Some(SortField::User), 14),
    ("HOST", Some(SortField::Host), 20),
    ("DB", Some(SortField::Database), 14),
    ("COMMAND", None, 14),
    ("STATE", Some(SortField::State), 14),
    ("TIME", Some(SortField::Elapsed), 8),
    ("QUERY", None, 0),
];

/// Rows of chrome around the list (borders and header).
pub const PROCESS_CHROME_ROWS: u16 = 3;

pub fn render_processes(frame: &mut Frame, area: Rect, view: &DisplayController) {
    let sort = view.sort();
    let visible = view.visible_processes();
    let total = view.snapshot().map(|s| s.processes.len()).unwrap_or(0);

    let title = format!(
        " Active Processes ({}/{}) · s: sort · r: reverse · h: help ",
        visible.len(),
        total
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Styles::border(Theme::PROCESS_BORDER));

    if view.snapshot().is_none() {
        frame.render_widget(Paragraph::new("No data available").block(block), area);
        return;
    }

    let headers: Vec<Span> = COLUMNS
        .iter()
        .map(|(name, field, _)| match field {
            Some(f) if *f == sort.field => {
                Span::styled(sort.indicator(), Styles::sort_column())
            }
            _ => Span::styled(*name, Styles::table_header()),
        })
        .collect();
    let header = Row::new(headers).style(Styles::table_header()).height(1);

    let query_width = area.width.saturating_sub(
        COLUMNS.iter().map(|(_, _, w)| *w + 1).sum::<u16>() + 2,
    ) as usize;
    let rows: Vec<Row> = visible
        .iter()
        .map(|p| process_row(p, query_width.max(10)))
        .collect();

    let constraints: Vec<Constraint> = COLUMNS
        .iter()
        .map(|(_, _, w)| {
            if *w == 0 {
                Constraint::Fill(1)
            } else {
                Constraint::Length(*w)
            }
        })
        .collect();

    let table = Table::new(rows, constraints)
        .header(header)
        .block(block)
        .column_spacing(1);
    frame.render_widget(table, area);
}

fn process_row(p: &ProcessInfo, query_width: usize) -> Row<'static> {
    let query = p
        .info
        .as_deref()
        .map(|q| truncate(&normalize_query(q), query_width))
        .unwrap_or_default();
    Row::new(vec![
        p.id.to_string(),
        truncate(&p.user, 14),
        truncate(&p.host, 20),
        truncate(&p.database, 14),
        truncate(&p.command, 14),
        truncate(&p.state, 14),
        format_duration(p.elapsed_secs, FmtStyle::Compact),
        query,
    ])
    .style(Styles::process_row(&p.state, p.elapsed_secs))
    .height(1)
}
