//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

/// Color palette.
pub struct Theme;

impl Theme {
    // Background colors
    pub const BG: Color = Color::Reset;
    pub const HEADER_BG: Color = Color::Blue;

    // Foreground colors
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const HEADER_FG: Color = Color::White;

    // Session state colors
    pub const STATE_ACTIVE: Color = Color::Green;
    pub const STATE_WAITING: Color = Color::Yellow;
    pub const STATE_CRITICAL: Color = Color::Red;

    // Panel borders
    pub const INFO_BORDER: Color = Color::Magenta;
    pub const STATS_BORDER: Color = Color::Green;
    pub const PROCESS_BORDER: Color = Color::Blue;
    pub const TABLES_BORDER: Color = Color::Cyan;
    pub const POPUP_BORDER: Color = Color::Cyan;
}

/// Session running longer than this is highlighted.
pub const LONG_RUNNING_SECS: i64 = 60;
/// Session running longer than this is flagged critical.
pub const CRITICAL_RUNNING_SECS: i64 = 600;

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Theme::FG).bg(Theme::BG)
    }

    /// Header bar style.
    pub fn header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Table header style.
    pub fn table_header() -> Style {
        Style::default()
            .fg(Theme::HEADER_FG)
            .bg(Theme::HEADER_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Header cell of the active sort column.
    pub fn sort_column() -> Style {
        Self::table_header()
            .fg(Color::Yellow)
            .add_modifier(Modifier::UNDERLINED)
    }

    /// Dimmed text style.
    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    /// Label in the connection info panel.
    pub fn label() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn value() -> Style {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    }

    /// Panel border in the given color.
    pub fn border(color: Color) -> Style {
        Style::default().fg(color)
    }

    /// Row style for a session, from its state and age.
    pub fn process_row(state: &str, elapsed_secs: i64) -> Style {
        let active = state.eq_ignore_ascii_case("active") || state.eq_ignore_ascii_case("query");
        if active && elapsed_secs >= CRITICAL_RUNNING_SECS {
            Style::default()
                .fg(Theme::STATE_CRITICAL)
                .add_modifier(Modifier::BOLD)
        } else if active && elapsed_secs >= LONG_RUNNING_SECS {
            Style::default().fg(Theme::STATE_WAITING)
        } else if active {
            Style::default().fg(Theme::STATE_ACTIVE)
        } else if state.starts_with("idle in transaction") {
            Style::default().fg(Theme::STATE_WAITING)
        } else {
            Self::default()
        }
    }

    /// Section header style in popups.
    pub fn section_header() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Help text style.
    pub fn help() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    /// Help key style (highlighted keys in help line).
    pub fn help_key() -> Style {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_row_highlights_by_age() {
        assert_eq!(Styles::process_row("active", 1).fg, Some(Theme::STATE_ACTIVE));
        assert_eq!(Styles::process_row("ACTIVE", 120).fg, Some(Theme::STATE_WAITING));
        assert_eq!(Styles::process_row("active", 900).fg, Some(Theme::STATE_CRITICAL));
        assert_eq!(Styles::process_row("idle", 900).fg, Some(Theme::FG));
        assert_eq!(
            Styles::process_row("idle in transaction", 5).fg,
            Some(Theme::STATE_WAITING)
        );
    }
}
