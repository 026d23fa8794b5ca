//! Type-safe key bindings.
//!
//! A [`Binding`] groups the key presses that trigger one action together
//! with the label shown for it in the controls hint. Views describe their
//! key map as a list of bindings; the prompt matches incoming key events
//! against them.
//!
//! ```rust
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//! use gitscope::key::Binding;
//!
//! let stage = Binding::new(vec![KeyCode::Char(' ').into()]).with_help("space", "stage");
//! assert!(stage.matches(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
//! ```

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// One concrete key press: a code plus the modifiers that must accompany it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPress {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Whether `event` is this press. Shift is ignored for characters since
    /// it is already folded into the character itself.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        if self.code != event.code {
            return false;
        }
        let wanted = self.modifiers.difference(KeyModifiers::SHIFT);
        let got = event.modifiers.difference(KeyModifiers::SHIFT);
        wanted == got
    }
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, modifiers): (KeyCode, KeyModifiers)) -> Self {
        Self::new(code, modifiers)
    }
}

/// Label pair rendered in the controls hint, e.g. `("space", "stage")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    pub key: String,
    pub desc: String,
}

#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

impl Binding {
    pub fn new(keys: Vec<KeyPress>) -> Self {
        Self {
            keys,
            help: Help::default(),
            disabled: false,
        }
    }

    pub fn with_help(mut self, key: &str, desc: &str) -> Self {
        self.help = Help {
            key: key.to_string(),
            desc: desc.to_string(),
        };
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    pub fn help(&self) -> &Help {
        &self.help
    }

    pub fn enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    /// Whether any of the binding's presses matches `event`. Disabled
    /// bindings never match.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.enabled() && self.keys.iter().any(|k| k.matches(event))
    }
}

/// Implemented by anything that can describe its key bindings for the
/// controls hint line.
pub trait KeyMap {
    fn short_help(&self) -> Vec<&Binding>;
}

impl KeyMap for Vec<Binding> {
    fn short_help(&self) -> Vec<&Binding> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_binding_matches_any_key() {
        let down = Binding::new(vec![KeyCode::Down.into(), KeyCode::Char('j').into()])
            .with_help("↓/j", "down");
        assert!(down.matches(&press(KeyCode::Down)));
        assert!(down.matches(&press(KeyCode::Char('j'))));
        assert!(!down.matches(&press(KeyCode::Char('k'))));
        assert_eq!(down.help().key, "↓/j");
    }

    #[test]
    fn test_modifiers_must_match() {
        let quit = Binding::new(vec![KeyPress::ctrl('c')]);
        assert!(quit.matches(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!quit.matches(&press(KeyCode::Char('c'))));
    }

    #[test]
    fn test_shift_is_folded_into_characters() {
        let force = Binding::new(vec![KeyCode::Char('D').into()]);
        assert!(force.matches(&KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT)));
        assert!(force.matches(&press(KeyCode::Char('D'))));
    }

    #[test]
    fn test_disabled_binding_never_matches() {
        let b = Binding::new(vec![KeyCode::Enter.into()]).with_disabled(true);
        assert!(!b.enabled());
        assert!(!b.matches(&press(KeyCode::Enter)));
    }
}
