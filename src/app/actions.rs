use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::FocusPane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleFocus,
    SelectNext,
    SelectPrevious,
    RequestPrimary,
    DeleteRandom,
    ChangeBackground,
    PickImage,
    BeginEdit,
    CancelEdit,
    InsertChar(char),
    Newline,
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
}

fn plain(key: &KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// Maps a key press to an action for the focused pane. Overlay keys are
/// handled separately by the event loop.
pub fn map_key(key: &KeyEvent, focus: FocusPane) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('s') => Some(Action::RequestPrimary),
            KeyCode::Char('d') => Some(Action::DeleteRandom),
            KeyCode::Char('b') => Some(Action::ChangeBackground),
            KeyCode::Char('o') => Some(Action::PickImage),
            _ => None,
        };
    }

    let shared = match key.code {
        KeyCode::Tab => Some(Action::ToggleFocus),
        KeyCode::Esc => Some(Action::CancelEdit),
        _ => None,
    };
    if shared.is_some() {
        return shared;
    }

    match focus {
        FocusPane::List => match key.code {
            KeyCode::Char('q') if plain(key) => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Enter | KeyCode::Char('e') => Some(Action::BeginEdit),
            _ => None,
        },
        FocusPane::Input => match key.code {
            KeyCode::Char(ch) if plain(key) => Some(Action::InsertChar(ch)),
            KeyCode::Enter => Some(Action::Newline),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Delete => Some(Action::Delete),
            KeyCode::Left => Some(Action::CursorLeft),
            KeyCode::Right => Some(Action::CursorRight),
            KeyCode::Home => Some(Action::CursorHome),
            KeyCode::End => Some(Action::CursorEnd),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn control_chords_work_from_either_pane() {
        for focus in [FocusPane::Input, FocusPane::List] {
            assert_eq!(map_key(&ctrl('s'), focus), Some(Action::RequestPrimary));
            assert_eq!(map_key(&ctrl('d'), focus), Some(Action::DeleteRandom));
            assert_eq!(map_key(&ctrl('b'), focus), Some(Action::ChangeBackground));
            assert_eq!(map_key(&ctrl('o'), focus), Some(Action::PickImage));
            assert_eq!(map_key(&ctrl('c'), focus), Some(Action::Quit));
        }
    }

    #[test]
    fn letters_type_into_input_but_navigate_the_list() {
        let q = key(KeyCode::Char('q'));
        assert_eq!(map_key(&q, FocusPane::Input), Some(Action::InsertChar('q')));
        assert_eq!(map_key(&q, FocusPane::List), Some(Action::Quit));
        assert_eq!(
            map_key(&key(KeyCode::Enter), FocusPane::List),
            Some(Action::BeginEdit)
        );
        assert_eq!(
            map_key(&key(KeyCode::Enter), FocusPane::Input),
            Some(Action::Newline)
        );
    }

    #[test]
    fn escape_cancels_edits_from_either_pane() {
        for focus in [FocusPane::Input, FocusPane::List] {
            assert_eq!(map_key(&key(KeyCode::Esc), focus), Some(Action::CancelEdit));
            assert_eq!(map_key(&key(KeyCode::Tab), focus), Some(Action::ToggleFocus));
        }
    }
}
