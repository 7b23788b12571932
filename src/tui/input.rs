//! Input handling and keybindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::{Command, DisplayController};

/// Maps a key press to a controller command.
///
/// While the help popup is open, `Esc` closes it and the other bindings
/// keep working.
pub fn handle_key(view: &DisplayController, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char('s') => Some(Command::CycleSort),
        KeyCode::Char('r') => Some(Command::ReverseSort),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::SpeedUp),
        KeyCode::Char('-') => Some(Command::SlowDown),
        KeyCode::Char('h') | KeyCode::Char('?') => Some(Command::ToggleHelp),
        KeyCode::Esc if view.show_help() => Some(Command::ToggleHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn view() -> DisplayController {
        DisplayController::new(Duration::from_secs(2))
    }

    #[test]
    fn quit_keys() {
        let v = view();
        assert_eq!(handle_key(&v, key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(handle_key(&v, key(KeyCode::Char('Q'))), Some(Command::Quit));
        assert_eq!(handle_key(&v, ctrl('c')), Some(Command::Quit));
    }

    #[test]
    fn sort_and_refresh_keys() {
        let v = view();
        assert_eq!(handle_key(&v, key(KeyCode::Char('s'))), Some(Command::CycleSort));
        assert_eq!(handle_key(&v, key(KeyCode::Char('r'))), Some(Command::ReverseSort));
        assert_eq!(handle_key(&v, key(KeyCode::Char('+'))), Some(Command::SpeedUp));
        assert_eq!(handle_key(&v, key(KeyCode::Char('='))), Some(Command::SpeedUp));
        assert_eq!(handle_key(&v, key(KeyCode::Char('-'))), Some(Command::SlowDown));
    }

    #[test]
    fn plain_c_is_ignored() {
        assert_eq!(handle_key(&view(), key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn esc_only_closes_open_help() {
        let mut v = view();
        assert_eq!(handle_key(&v, key(KeyCode::Esc)), None);
        v.handle_command(Command::ToggleHelp);
        assert_eq!(handle_key(&v, key(KeyCode::Esc)), Some(Command::ToggleHelp));
        assert_eq!(handle_key(&v, key(KeyCode::Char('?'))), Some(Command::ToggleHelp));
    }
}
