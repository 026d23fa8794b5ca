//! The prompt shell: event loop, key dispatch and terminal ownership.
//!
//! A [`Prompt`] owns one [`List`] and one [`View`]. Each turn it paints a
//! frame, waits for a key or an update from the list's background work,
//! and dispatches:
//!
//! - in search entry, keys edit the query and every edit re-runs the search
//! - otherwise navigation keys move the cursor, `/` starts search entry,
//!   `enter` hands the selection to the view, `q` quits (or returns from a
//!   sub-list), and anything else goes to [`View::on_key`]
//!
//! Handlers answer with an [`Outcome`]; [`Outcome::Replace`] swaps in a
//! derived list and keeps the current one for `q`.

mod external;
mod keys;
mod render;
mod view;

pub use external::{ProcessSpawner, Spawn, TerminalSpawner};
pub use keys::PromptKeyMap;
pub use view::{Context, Outcome, View};

#[cfg(test)]
pub(crate) use external::fake;

use std::io::{self, Stdout};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Config;
use crate::error::Result;
use crate::help::Help;
use crate::list::List;
use crate::style::Theme;
use crate::term::{self, RawMode, Reader, Writer};
use external::lock;

/// How long the loop waits for a key before polling for list updates.
const TICK: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
}

pub struct Prompt<V: View> {
    view: V,
    list: List<V::Item>,
    previous: Option<List<V::Item>>,
    keys: PromptKeyMap,
    theme: Theme,
    help: Help,
    mode: Mode,
    /// Query being typed in search entry.
    query: String,
    stop: bool,
    show_controls: bool,
    cursor_glyph: String,
    config: Config,
    spawner: Box<dyn Spawn>,
}

impl<V: View> Prompt<V> {
    pub fn new(view: V, list: List<V::Item>, config: &Config) -> Self {
        let theme = Theme::default();
        Self {
            view,
            list,
            previous: None,
            keys: PromptKeyMap::default(),
            help: Help::new().with_theme(&theme),
            theme,
            mode: Mode::Normal,
            query: String::new(),
            stop: false,
            show_controls: config.show_controls,
            cursor_glyph: config.cursor_glyph.clone(),
            config: config.clone(),
            spawner: Box::new(ProcessSpawner),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.help = self.help.with_theme(&theme);
        self.theme = theme;
        self
    }

    pub fn with_spawner(mut self, spawner: Box<dyn Spawn>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn list(&self) -> &List<V::Item> {
        &self.list
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn should_stop(&self) -> bool {
        self.stop
    }

    /// Whether a sub-list is shown and `q` will go back.
    pub fn is_nested(&self) -> bool {
        self.previous.is_some()
    }

    /// Takes over the terminal on stdin/stdout and runs until the user
    /// quits. The terminal is handed back in its original state on every
    /// exit path.
    pub fn run(mut self) -> Result<()> {
        let raw = Arc::new(RawMode::enable()?);
        let reader = Reader::spawn();
        let writer: Arc<Mutex<Writer<Stdout>>> = Arc::new(Mutex::new(Writer::new(io::stdout())));
        self.spawner = Box::new(TerminalSpawner::new(
            Arc::clone(&writer),
            Arc::clone(&raw),
            reader.control(),
        ));
        log::debug!("prompt started");

        let hidden = lock(&writer).hide_cursor();
        let result = hidden.and_then(|_| self.event_loop(&reader, &writer));

        self.list.cancel_search();
        drop(reader);
        let mut w = lock(&writer);
        let teardown = w
            .clear()
            .and_then(|_| w.show_cursor())
            .and_then(|_| w.enable_wrap());
        drop(w);
        let restored = raw.restore();
        log::debug!("prompt stopped");

        result.and(teardown).and(restored)
    }

    fn event_loop(&mut self, reader: &Reader, writer: &Mutex<Writer<Stdout>>) -> Result<()> {
        let mut dirty = true;
        let mut last_size = (0, 0);
        while !self.stop {
            let (cols, rows) = term::size()?;
            if (cols, rows) != last_size {
                self.resize(rows);
                last_size = (cols, rows);
                dirty = true;
            }
            if dirty {
                self.render(&mut lock(writer), cols)?;
                dirty = false;
            }

            match reader.recv_timeout(TICK) {
                Ok(key) => {
                    self.handle_key(key);
                    dirty = true;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.list.take_update() {
                        dirty = true;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::debug!("key reader closed");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Fits the list window into a terminal with `rows` rows.
    pub fn resize(&mut self, rows: usize) {
        let height = self.config.fitted_height(rows);
        self.list.set_size(height);
        if let Some(previous) = self.previous.as_mut() {
            previous.set_size(height);
        }
    }

    /// Dispatches one key.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Null {
            return;
        }
        if self.keys.force_quit.matches(&key) {
            self.stop = true;
            return;
        }
        match self.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        if self.keys.accept_search.matches(&key) {
            self.mode = Mode::Normal;
        } else if self.keys.cancel_search.matches(&key) {
            self.mode = Mode::Normal;
            self.query.clear();
            self.list.cancel_search();
        } else if key.code == KeyCode::Up {
            self.list.prev();
        } else if key.code == KeyCode::Down {
            self.list.next();
        } else if key.code == KeyCode::Backspace {
            if self.query.pop().is_some() {
                self.list.search(&self.query);
            }
        } else if let KeyCode::Char(c) = key.code {
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                self.query.push(c);
                self.list.search(&self.query);
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let keys = &self.keys;
        if keys.cursor_up.matches(&key) {
            self.list.prev();
        } else if keys.cursor_down.matches(&key) {
            self.list.next();
        } else if keys.page_up.matches(&key) {
            self.list.page_up();
        } else if keys.page_down.matches(&key) {
            self.list.page_down();
        } else if keys.go_to_start.matches(&key) {
            self.list.home();
        } else if keys.go_to_end.matches(&key) {
            self.list.end();
        } else if keys.search.matches(&key) {
            self.mode = Mode::Search;
            self.query = self.list.query();
        } else if keys.clear_search.matches(&key) && !self.list.query().is_empty() {
            self.query.clear();
            self.list.cancel_search();
        } else if keys.quit.matches(&key) {
            self.back_or_stop();
        } else if keys.select.matches(&key) {
            if let Some(item) = self.list.selected() {
                let mut cx = Context {
                    list: &mut self.list,
                    spawner: self.spawner.as_mut(),
                };
                let outcome = self.view.on_select(item, &mut cx);
                self.apply(outcome);
            }
        } else {
            let mut cx = Context {
                list: &mut self.list,
                spawner: self.spawner.as_mut(),
            };
            let outcome = self.view.on_key(&key, &mut cx);
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Outcome<V::Item>) {
        match outcome {
            Outcome::Continue => {}
            Outcome::Stop => self.stop = true,
            Outcome::Replace(mut list) => {
                list.set_size(self.list.size());
                let old = std::mem::replace(&mut self.list, list);
                if let Some(mut dropped) = self.previous.replace(old) {
                    dropped.cancel_search();
                }
                self.query.clear();
                self.mode = Mode::Normal;
            }
        }
    }

    fn back_or_stop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                let mut nested = std::mem::replace(&mut self.list, previous);
                nested.cancel_search();
                self.query = self.list.query();
                self.view.on_back();
            }
            None => self.stop = true,
        }
    }
}
