//! Help popup: key bindings and sort order.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::state::{REFRESH_STEP, SortField, SortState};
use crate::tui::style::{Styles, Theme};

/// Renders the help popup centered on screen.
pub fn render_help(frame: &mut Frame, area: Rect, sort: SortState) {
    // 60% width, 70% height, clamped to 40-70 x 10-22
    let popup_width = (area.width * 60 / 100).clamp(40, 70).min(area.width);
    let popup_height = (area.height * 70 / 100).clamp(10, 22).min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(area.x + popup_x, area.y + popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Styles::border(Theme::POPUP_BORDER));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    let paragraph = Paragraph::new(help_lines(sort))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, chunks[0]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Press ", Styles::help()),
        Span::styled("h", Styles::help_key()),
        Span::styled(" or ", Styles::help()),
        Span::styled("Esc", Styles::help_key()),
        Span::styled(" to close", Styles::help()),
    ]));
    frame.render_widget(footer, chunks[1]);
}

fn key_line(keys: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", keys), Styles::help_key()),
        Span::raw(action.to_string()),
    ])
}

fn help_lines(sort: SortState) -> Vec<Line<'static>> {
    let step = REFRESH_STEP.as_millis();
    let order = SortField::ALL
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(" → ");
    vec![
        Line::from(Span::styled("Keys", Styles::section_header())),
        key_line("q, Ctrl-C", "quit"),
        key_line("s", "cycle sort column"),
        key_line("r", "reverse sort direction"),
        key_line("+", &format!("refresh faster (-{}ms)", step)),
        key_line("-", &format!("refresh slower (+{}ms)", step)),
        key_line("h, ?", "toggle this help"),
        Line::raw(""),
        Line::from(Span::styled("Sort", Styles::section_header())),
        Line::raw(format!("  {}", order)),
        Line::from(vec![
            Span::raw("  current: "),
            Span::styled(sort.indicator(), Styles::help_key()),
        ]),
        Line::raw(""),
        Line::from(Span::styled("Rows", Styles::section_header())),
        Line::from(vec![
            Span::styled("  green ", Style::default().fg(Theme::STATE_ACTIVE)),
            Span::raw("active"),
        ]),
        Line::from(vec![
            Span::styled("  yellow", Style::default().fg(Theme::STATE_WAITING)),
            Span::raw(" running over a minute, or idle in transaction"),
        ]),
        Line::from(vec![
            Span::styled("  red   ", Style::default().fg(Theme::STATE_CRITICAL)),
            Span::raw(" running over ten minutes"),
        ]),
    ]
}
