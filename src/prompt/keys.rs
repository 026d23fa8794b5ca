//! Built-in key bindings of the prompt.
//!
//! - **Cursor**: `↑/k`, `↓/j`
//! - **Pages**: `pgup`, `pgdn`
//! - **Jumps**: `g/home`, `G/end`
//! - **Search**: `/` enters search entry; in entry `enter` keeps the filter,
//!   `esc` clears it
//! - **Quit**: `q` (back out of a sub-list first), `ctrl+c` from anywhere
//!
//! Everything else is left to the view.

use crossterm::event::KeyCode;

use crate::key::{Binding, KeyMap, KeyPress};

#[derive(Debug, Clone)]
pub struct PromptKeyMap {
    pub cursor_up: Binding,
    pub cursor_down: Binding,
    pub page_up: Binding,
    pub page_down: Binding,
    pub go_to_start: Binding,
    pub go_to_end: Binding,
    pub select: Binding,
    pub search: Binding,
    pub clear_search: Binding,
    pub accept_search: Binding,
    pub cancel_search: Binding,
    pub quit: Binding,
    pub force_quit: Binding,
}

impl Default for PromptKeyMap {
    fn default() -> Self {
        Self {
            cursor_up: Binding::new(vec![KeyCode::Up.into(), KeyCode::Char('k').into()])
                .with_help("↑/k", "up"),
            cursor_down: Binding::new(vec![KeyCode::Down.into(), KeyCode::Char('j').into()])
                .with_help("↓/j", "down"),
            page_up: Binding::new(vec![KeyCode::PageUp.into()]).with_help("pgup", "page up"),
            page_down: Binding::new(vec![KeyCode::PageDown.into()]).with_help("pgdn", "page down"),
            go_to_start: Binding::new(vec![KeyCode::Home.into(), KeyCode::Char('g').into()])
                .with_help("g/home", "top"),
            go_to_end: Binding::new(vec![KeyCode::End.into(), KeyCode::Char('G').into()])
                .with_help("G/end", "bottom"),
            select: Binding::new(vec![KeyCode::Enter.into()]).with_help("enter", "select"),
            search: Binding::new(vec![KeyCode::Char('/').into()]).with_help("/", "search"),
            clear_search: Binding::new(vec![KeyCode::Esc.into()]).with_help("esc", "clear search"),
            accept_search: Binding::new(vec![KeyCode::Enter.into(), KeyCode::Tab.into()])
                .with_help("enter", "apply"),
            cancel_search: Binding::new(vec![KeyCode::Esc.into()]).with_help("esc", "clear"),
            quit: Binding::new(vec![KeyCode::Char('q').into()]).with_help("q", "quit"),
            force_quit: Binding::new(vec![KeyPress::ctrl('c')]).with_help("ctrl+c", "quit"),
        }
    }
}

impl PromptKeyMap {
    /// Hint bindings while typing a query.
    pub fn search_help(&self) -> Vec<&Binding> {
        vec![&self.accept_search, &self.cancel_search]
    }
}

impl KeyMap for PromptKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.search, &self.quit]
    }
}
