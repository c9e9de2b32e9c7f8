use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const PAGE: usize = 10;

/// What a key press asks for, before the focused field interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Submit,
    FocusNext,
    FocusPrev,
    Left,
    Right,
    Home,
    End,
    Backspace,
    Delete,
    Escape,
    Insert(char),
    ScrollUp(usize),
    ScrollDown(usize),
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
            Action::Quit
        }
        (KeyCode::Char(_), m) if m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            return None;
        }
        (KeyCode::Char(ch), _) => Action::Insert(ch),
        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Tab, _) => Action::FocusNext,
        (KeyCode::BackTab, _) => Action::FocusPrev,
        (KeyCode::Left, _) => Action::Left,
        (KeyCode::Right, _) => Action::Right,
        (KeyCode::Home, _) => Action::Home,
        (KeyCode::End, _) => Action::End,
        (KeyCode::Backspace, _) => Action::Backspace,
        (KeyCode::Delete, _) => Action::Delete,
        (KeyCode::Esc, _) => Action::Escape,
        (KeyCode::Up, _) => Action::ScrollUp(1),
        (KeyCode::Down, _) => Action::ScrollDown(1),
        (KeyCode::PageUp, _) => Action::ScrollUp(PAGE),
        (KeyCode::PageDown, _) => Action::ScrollDown(PAGE),
        _ => return None,
    };
    Some(action)
}
