//! Terminal key bindings

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::frame_loop::Action;

/// Map a key press to a loop action. Releases and repeats of non-tone keys are ignored.
pub fn action_for_key(event: &KeyEvent) -> Option<Action> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let repeat = event.kind == KeyEventKind::Repeat;
    match event.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Up => Some(Action::ToneUp),
        KeyCode::Down => Some(Action::ToneDown),
        KeyCode::Right => Some(Action::Louder),
        KeyCode::Left => Some(Action::Softer),
        KeyCode::Char(' ') if !repeat => Some(Action::TogglePause),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_bindings() {
        assert_eq!(action_for_key(&key(KeyCode::Esc, KeyEventKind::Press)), Some(Action::Quit));
        assert_eq!(action_for_key(&key(KeyCode::Up, KeyEventKind::Press)), Some(Action::ToneUp));
        assert_eq!(action_for_key(&key(KeyCode::Left, KeyEventKind::Press)), Some(Action::Softer));
        assert_eq!(action_for_key(&key(KeyCode::Char('x'), KeyEventKind::Press)), None);
    }

    #[test]
    fn test_release_and_repeat() {
        assert_eq!(action_for_key(&key(KeyCode::Up, KeyEventKind::Release)), None);
        assert_eq!(action_for_key(&key(KeyCode::Up, KeyEventKind::Repeat)), Some(Action::ToneUp));
        assert_eq!(action_for_key(&key(KeyCode::Char(' '), KeyEventKind::Repeat)), None);
    }
}
