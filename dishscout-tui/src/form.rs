//! The three-field search form and its line editor.
use crate::keymap::Action;
use dishscout_search::session::SearchSession;
use dishscout_search::{Budget, Cuisine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Cuisine,
    Budget,
    Location,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Cuisine => Focus::Budget,
            Focus::Budget => Focus::Location,
            Focus::Location => Focus::Cuisine,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Cuisine => Focus::Location,
            Focus::Budget => Focus::Cuisine,
            Focus::Location => Focus::Budget,
        }
    }
}

/// Form actions the actor has to carry out itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Submit,
    Quit,
}

pub struct Form {
    session: SearchSession,
    focus: Focus,
    cursor: usize, // byte offset into the location
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    pub fn new() -> Self {
        Self {
            session: SearchSession::new(),
            focus: Focus::Location,
            cursor: 0,
        }
    }

    /// A fresh form with the selectors preset, e.g. from the command line.
    pub fn preset(cuisine: Option<Cuisine>, budget: Option<Budget>) -> Self {
        let mut form = Self::new();
        if let Some(cuisine) = cuisine {
            form.session.set_cuisine(cuisine);
        }
        if let Some(budget) = budget {
            form.session.set_budget(budget);
        }
        form
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SearchSession {
        &mut self.session
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Apply an editing action. Scroll actions are not form actions and are
    /// ignored here.
    pub fn apply(&mut self, action: Action) -> Option<Intent> {
        match action {
            Action::Quit => return Some(Intent::Quit),
            Action::Submit => return Some(Intent::Submit),
            Action::FocusNext => self.focus = self.focus.next(),
            Action::FocusPrev => self.focus = self.focus.prev(),
            Action::Left => match self.focus {
                Focus::Cuisine => self.session.prev_cuisine(),
                Focus::Budget => self.session.prev_budget(),
                Focus::Location => self.cursor_left(),
            },
            Action::Right => match self.focus {
                Focus::Cuisine => self.session.next_cuisine(),
                Focus::Budget => self.session.next_budget(),
                Focus::Location => self.cursor_right(),
            },
            Action::Home => self.cursor = 0,
            Action::End => self.cursor = self.session.location().len(),
            Action::Backspace => self.backspace(),
            Action::Delete => self.delete(),
            Action::Insert(ch) => {
                self.focus = Focus::Location;
                self.insert_char(ch);
            }
            Action::Escape => {
                if self.session.location().is_empty() {
                    return Some(Intent::Quit);
                }
                self.session.location_mut().clear();
                self.cursor = 0;
            }
            Action::ScrollUp(_) | Action::ScrollDown(_) => {}
        }
        None
    }

    fn cursor_left(&mut self) {
        let input = self.session.location();
        if self.cursor == 0 {
            return;
        }
        let mut at = self.cursor - 1;
        while at > 0 && !input.is_char_boundary(at) {
            at -= 1;
        }
        self.cursor = at;
    }

    fn cursor_right(&mut self) {
        let input = self.session.location();
        if self.cursor >= input.len() {
            return;
        }
        let mut at = self.cursor + 1;
        while at < input.len() && !input.is_char_boundary(at) {
            at += 1;
        }
        self.cursor = at;
    }

    fn insert_char(&mut self, ch: char) {
        let at = self.cursor;
        self.session.location_mut().insert(at, ch);
        self.cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let end = self.cursor;
        self.cursor_left();
        let start = self.cursor;
        self.session.location_mut().drain(start..end);
    }

    fn delete(&mut self) {
        let start = self.cursor;
        self.cursor_right();
        let end = self.cursor;
        self.cursor = start;
        self.session.location_mut().drain(start..end);
    }
}
