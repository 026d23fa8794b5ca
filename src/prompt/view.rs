//! The callback bundle a view plugs into the prompt.

use crossterm::event::KeyEvent;

use super::external::Spawn;
use crate::key::Binding;
use crate::list::{Item, List};

/// What the prompt does after a handler returns.
pub enum Outcome<I: Item> {
    Continue,
    Stop,
    /// Show this list instead. The current one is kept in a one-deep slot
    /// and comes back on `q`.
    Replace(List<I>),
}

impl<I: Item> std::fmt::Debug for Outcome<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Continue => f.write_str("Continue"),
            Outcome::Stop => f.write_str("Stop"),
            Outcome::Replace(list) => write!(f, "Replace({} items)", list.total()),
        }
    }
}

/// What handlers get to work with.
pub struct Context<'a, I: Item> {
    pub list: &'a mut List<I>,
    pub spawner: &'a mut dyn Spawn,
}

/// A view adapter: renders items and reacts to keys the prompt does not
/// handle itself.
pub trait View {
    type Item: Item;

    /// Text in front of the query on the first line.
    fn search_label(&self) -> String;

    /// View-specific bindings shown in the controls hint.
    fn controls(&self) -> Vec<Binding> {
        Vec::new()
    }

    /// One list row, without the cursor prefix. `positions` are the
    /// characters of `filter_value` that matched the query.
    fn render_item(&self, item: &Self::Item, positions: &[usize], selected: bool) -> String;

    /// Detail lines below the list for the selected item.
    fn render_info(&self, _item: Option<&Self::Item>) -> Vec<String> {
        Vec::new()
    }

    /// Shown instead of the rows when there is nothing to list and no query.
    fn render_empty(&self) -> Vec<String> {
        Vec::new()
    }

    fn on_key(&mut self, _key: &KeyEvent, _cx: &mut Context<'_, Self::Item>) -> Outcome<Self::Item> {
        Outcome::Continue
    }

    fn on_select(&mut self, _item: Self::Item, _cx: &mut Context<'_, Self::Item>) -> Outcome<Self::Item> {
        Outcome::Continue
    }

    /// Called after the prompt went back to the list saved by a
    /// [`Outcome::Replace`].
    fn on_back(&mut self) {}
}
