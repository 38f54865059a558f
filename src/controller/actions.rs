//! High-level actions and the mode-aware key mapping that produces them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::app_state::{AppState, FocusedPane, UiMode};

/// Everything the controller can be asked to do. Raw key events are mapped
/// to these per mode, then dispatched in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the focused cursor by a signed row delta.
    Move(i64),
    Home,
    End,
    EnterDir,
    LeaveDir,
    ToggleMark,
    ToggleAllMarks,
    /// `d` in Normal mode: delete when marks exist, else mark-and-advance.
    DeleteKey,
    OpenSelected,
    StartGlob,
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,
    ToggleHelp,
    SortBySize,
    SortByName,
    SortByMtime,
    SortByCount,
    ToggleMtimeColumn,
    ToggleCountColumn,
    RefreshSelected,
    RefreshAll,
    SwitchFocus,
    SwitchTab(u32),
    UnmarkSelected,
    UnmarkAll,
    PreviewSearchStart,
    PreviewSearchNext,
    PreviewSearchPrev,
    PreviewTop,
    PreviewBottom,
    Quit,
    NoOp,
}

/// Signed row delta for a movement key, or None if the key is not movement.
/// Page-sized movement scales with the focused viewport.
pub fn movement_delta(key: &KeyEvent, viewport: usize) -> Option<i64> {
    let page = viewport.max(1) as i64;
    let half = (viewport / 2).max(1) as i64;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('u') => Some(-half),
            KeyCode::Char('d') => Some(half),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(-1),
        KeyCode::Down | KeyCode::Char('j') => Some(1),
        KeyCode::PageUp => Some(-page),
        KeyCode::PageDown => Some(page),
        _ => None,
    }
}

/// Map a key event to an action given the current mode and focus. Movement
/// keys are handled separately (they coalesce) and return `NoOp` here.
pub fn map_key(app: &AppState, key: &KeyEvent) -> Action {
    match app.mode {
        UiMode::Help => Action::ToggleHelp,
        UiMode::GlobInput | UiMode::ConfirmDelete => map_text_input(key),
        UiMode::Refreshing => Action::NoOp,
        UiMode::Normal => match app.focus {
            FocusedPane::Main => map_normal(app, key),
            FocusedPane::Mark => map_mark_pane(app, key),
        },
    }
}

fn map_text_input(key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Enter => Action::InputSubmit,
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Char(c) => Action::InputChar(c),
        _ => Action::NoOp,
    }
}

fn map_normal(app: &AppState, key: &KeyEvent) -> Action {
    match key.code {
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Right | KeyCode::Enter | KeyCode::Char('l') | KeyCode::Char('o') => {
            Action::EnterDir
        }
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Char('u') => {
            Action::LeaveDir
        }
        KeyCode::Char(' ') => Action::ToggleMark,
        KeyCode::Char('a') | KeyCode::Char('A') => Action::ToggleAllMarks,
        KeyCode::Char('d') => Action::DeleteKey,
        KeyCode::Char('O') => Action::OpenSelected,
        KeyCode::Char('/') => Action::StartGlob,
        KeyCode::Char('r') => Action::RefreshSelected,
        KeyCode::Char('R') => Action::RefreshAll,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('s') => Action::SortBySize,
        KeyCode::Char('n') => Action::SortByName,
        KeyCode::Char('m') => Action::SortByMtime,
        KeyCode::Char('c') => Action::SortByCount,
        KeyCode::Char('M') => Action::ToggleMtimeColumn,
        KeyCode::Char('C') => Action::ToggleCountColumn,
        KeyCode::Tab => {
            if app.mark_pane_visible() {
                Action::SwitchFocus
            } else {
                Action::NoOp
            }
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        _ => Action::NoOp,
    }
}

fn map_mark_pane(app: &AppState, key: &KeyEvent) -> Action {
    // While quick-view is active, its own keys are forwarded to it.
    if app.marks.quickview_active() {
        match key.code {
            KeyCode::Char('/') => return Action::PreviewSearchStart,
            KeyCode::Char('n') => return Action::PreviewSearchNext,
            KeyCode::Char('N') => return Action::PreviewSearchPrev,
            KeyCode::Char('g') => return Action::PreviewTop,
            KeyCode::Char('G') => return Action::PreviewBottom,
            _ => {}
        }
    }

    match key.code {
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Char(' ') | KeyCode::Char('d') => Action::UnmarkSelected,
        KeyCode::Char('a') => Action::UnmarkAll,
        KeyCode::Esc | KeyCode::Tab => Action::SwitchFocus,
        KeyCode::Char(c) if c.is_ascii_digit() => {
            Action::SwitchTab(c.to_digit(10).unwrap_or(0))
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        _ => Action::NoOp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn arrows_and_vi_keys_move_one_row() {
        assert_eq!(movement_delta(&key(KeyCode::Up), 20), Some(-1));
        assert_eq!(movement_delta(&key(KeyCode::Char('k')), 20), Some(-1));
        assert_eq!(movement_delta(&key(KeyCode::Down), 20), Some(1));
        assert_eq!(movement_delta(&key(KeyCode::Char('j')), 20), Some(1));
    }

    #[test]
    fn pages_scale_with_viewport() {
        assert_eq!(movement_delta(&key(KeyCode::PageDown), 30), Some(30));
        assert_eq!(movement_delta(&ctrl('d'), 30), Some(15));
        assert_eq!(movement_delta(&ctrl('u'), 30), Some(-15));
    }

    #[test]
    fn plain_d_is_not_movement() {
        assert_eq!(movement_delta(&key(KeyCode::Char('d')), 20), None);
    }
}
