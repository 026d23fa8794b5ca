//! One-line controls hint.
//!
//! Renders a set of [`Binding`]s as `key desc • key desc • …`, skipping
//! disabled bindings and cutting off with an ellipsis when the line would
//! exceed the terminal width.
//!
//! ```rust
//! use crossterm::event::KeyCode;
//! use gitscope::help::Help;
//! use gitscope::key::Binding;
//!
//! let quit = Binding::new(vec![KeyCode::Char('q').into()]).with_help("q", "quit");
//! let line = Help::new().with_width(80).short_help_view(vec![&quit]);
//! assert!(gitscope::style::visible_width(&line) <= 80);
//! ```

use lipgloss_extras::prelude::*;

use crate::key::{Binding, KeyMap};
use crate::style::{visible_width, Theme, ELLIPSIS};

#[derive(Debug, Clone)]
pub struct Styles {
    pub key: Style,
    pub desc: Style,
    pub separator: Style,
    pub ellipsis: Style,
}

impl Styles {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            key: theme.hint_key.clone(),
            desc: theme.hint_desc.clone(),
            separator: theme.hint_separator.clone(),
            ellipsis: theme.hint_separator.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Help {
    /// Maximum width in columns; 0 means unbounded.
    pub width: usize,
    pub separator: String,
    pub styles: Styles,
}

impl Default for Help {
    fn default() -> Self {
        Self {
            width: 0,
            separator: " • ".to_string(),
            styles: Styles::from_theme(&Theme::default()),
        }
    }
}

impl Help {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.styles = Styles::from_theme(theme);
        self
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    pub fn view<K: KeyMap + ?Sized>(&self, keys: &K) -> String {
        self.short_help_view(keys.short_help())
    }

    pub fn short_help_view(&self, bindings: Vec<&Binding>) -> String {
        let separator = self.styles.separator.render(&self.separator);
        let mut line = String::new();
        let mut total = 0;

        for binding in bindings.into_iter().filter(|b| b.enabled()) {
            let sep = if total > 0 { separator.as_str() } else { "" };
            let help = binding.help();
            let item = format!(
                "{}{} {}",
                sep,
                self.styles.key.render(&help.key),
                self.styles.desc.render(&help.desc)
            );
            let width = visible_width(&item);

            if let Some(tail) = self.overflow_tail(total, width) {
                line.push_str(&tail);
                break;
            }
            total += width;
            line.push_str(&item);
        }
        line
    }

    /// `None` while the item still fits; otherwise the ellipsis tail to
    /// append, or an empty string when even that does not fit.
    fn overflow_tail(&self, total: usize, item: usize) -> Option<String> {
        if self.width == 0 || total + item <= self.width {
            return None;
        }
        let tail = format!(" {}", self.styles.ellipsis.render(ELLIPSIS));
        if total + visible_width(&tail) <= self.width {
            Some(tail)
        } else {
            Some(String::new())
        }
    }
}
