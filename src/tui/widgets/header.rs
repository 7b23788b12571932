//! Header bar: time, instance, engine, sort and refresh.

use chrono::{DateTime, Local, TimeZone};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::fmt::format_interval;
use crate::tui::InstanceInfo;
use crate::tui::state::DisplayController;
use crate::tui::style::Styles;

/// Renders the header bar.
pub fn render_header(frame: &mut Frame, area: Rect, view: &DisplayController, info: &InstanceInfo) {
    let chunks = Layout::horizontal([
        Constraint::Length(21), // Time
        Constraint::Min(20),    // Instance
        Constraint::Length(30), // Sort / refresh
    ])
    .split(area);

    let timestamp = view
        .snapshot()
        .map(|s| s.timestamp)
        .unwrap_or_else(|| Local::now().timestamp());
    let time_str = Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.format(" %Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ----".to_string());
    frame.render_widget(Paragraph::new(time_str).style(Styles::header()), chunks[0]);

    let instance = Line::from(vec![
        Span::raw(format!(" {} ", info.name)),
        Span::styled(format!("[{}]", info.engine), Styles::header()),
        Span::raw(format!(" {}", info.endpoint())),
    ]);
    frame.render_widget(Paragraph::new(instance).style(Styles::header()), chunks[1]);

    let status = if view.snapshot().is_some() {
        format!(
            "sort:{} every {} ",
            view.sort().indicator(),
            format_interval(view.refresh_interval())
        )
    } else {
        "waiting for data… ".to_string()
    };
    frame.render_widget(
        Paragraph::new(status)
            .alignment(ratatui::layout::Alignment::Right)
            .style(Styles::header()),
        chunks[2],
    );
}
