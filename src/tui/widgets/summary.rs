//! Summary row: connection info on the left, server statistics on the right.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::fmt::{FmtStyle, format_duration, format_interval};
use crate::model::StatsSnapshot;
use crate::tui::InstanceInfo;
use crate::tui::state::DisplayController;
use crate::tui::style::{Styles, Theme};

/// Lines of content plus borders.
pub const SUMMARY_HEIGHT: u16 = 8;

pub fn render_summary(frame: &mut Frame, area: Rect, view: &DisplayController, info: &InstanceInfo) {
    let chunks = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    render_connection_info(frame, chunks[0], view, info);
    render_statistics(frame, chunks[1], view.snapshot());
}

fn info_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<20}", label), Styles::label()),
        Span::styled(value, Styles::value()),
    ])
}

fn render_connection_info(
    frame: &mut Frame,
    area: Rect,
    view: &DisplayController,
    info: &InstanceInfo,
) {
    let snapshot = view.snapshot();
    let uptime = snapshot
        .map(|s| format_duration(s.uptime.as_secs() as i64, FmtStyle::Detail))
        .unwrap_or_else(|| "-".to_string());
    let active = snapshot
        .map(|s| s.active_connections.to_string())
        .unwrap_or_else(|| "-".to_string());
    let database = if info.database.is_empty() {
        "(all)".to_string()
    } else {
        info.database.clone()
    };

    let lines = vec![
        info_line("Instance:", info.name.clone()),
        info_line("Type:", info.engine.to_string()),
        info_line("Database:", database),
        info_line("Uptime:", uptime),
        info_line("Active Connections:", active),
        info_line("Refresh:", format_interval(view.refresh_interval())),
    ];

    let block = Block::default()
        .title(" Connection Info ")
        .borders(Borders::ALL)
        .border_style(Styles::border(Theme::INFO_BORDER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_statistics(frame: &mut Frame, area: Rect, snapshot: Option<&StatsSnapshot>) {
    let block = Block::default()
        .title(" Database Statistics ")
        .borders(Borders::ALL)
        .border_style(Styles::border(Theme::STATS_BORDER));

    let Some(snap) = snapshot else {
        frame.render_widget(Paragraph::new("No data available").block(block), area);
        return;
    };

    let counters = &snap.counters;
    let rows = vec![
        ("Total Connections", snap.total_connections.to_string()),
        ("Queries/Second", format!("{:.2}", counters.queries_per_second)),
        ("Slow Queries", counters.slow_queries.to_string()),
        ("Threads Running", counters.threads_running.to_string()),
        ("Threads Connected", counters.threads_connected.to_string()),
    ]
    .into_iter()
    .map(|(metric, value)| {
        Row::new(vec![
            Span::styled(metric, Styles::label()),
            Span::styled(value, Styles::value()),
        ])
    });

    let header = Row::new(vec!["Metric", "Value"]).style(Styles::table_header());
    let table = Table::new(rows, [Constraint::Length(20), Constraint::Fill(1)])
        .header(header)
        .block(block)
        .column_spacing(1);
    frame.render_widget(table, area);
}
