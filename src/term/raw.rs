//! Raw-mode acquisition with a teardown hook.
//!
//! Raw mode comes from `crossterm`, which also disables signal generation
//! so Ctrl-C reaches the prompt as a key. The thread that enables raw mode
//! is recorded as the owner of the terminal; a panic on that thread puts
//! the terminal back before the panic message is printed. Panics on other
//! threads (search workers, producers) are logged and leave the terminal
//! alone, since the prompt keeps running.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use once_cell::sync::{Lazy, OnceCell};

use super::{SHOW_CURSOR, WRAP_ON};
use crate::error::{Error, Result};

/// The switch currently holding the terminal and the thread that owns it.
static OWNER: Lazy<Mutex<Option<(ThreadId, Arc<dyn Switch>)>>> = Lazy::new(|| Mutex::new(None));
static HOOK: OnceCell<()> = OnceCell::new();

/// Turns the terminal's raw mode on and off.
///
/// [`Crossterm`] is the real implementation; the trait exists so the
/// enter/restore bookkeeping of [`RawMode`] can run without a terminal.
pub trait Switch: Send + Sync {
    /// Enters raw mode.
    fn enable(&self) -> io::Result<()>;
    /// Returns to the mode that was active before [`Switch::enable`].
    fn disable(&self) -> io::Result<()>;
}

/// Raw mode through `crossterm::terminal`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crossterm;

impl Switch for Crossterm {
    fn enable(&self) -> io::Result<()> {
        if !io::stdin().is_terminal() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "standard input is not a terminal",
            ));
        }
        enable_raw_mode()
    }

    fn disable(&self) -> io::Result<()> {
        disable_raw_mode()
    }
}

/// Holds the terminal in raw mode for as long as it lives.
///
/// Dropping a `RawMode` restores the original terminal mode. Around an
/// external program the prompt calls [`RawMode::restore`] and
/// [`RawMode::enter`] explicitly; both are idempotent.
///
/// # Examples
///
/// ```no_run
/// use gitscope::term::RawMode;
///
/// let raw = RawMode::enable()?;
/// assert!(raw.is_active());
/// raw.restore()?;
/// assert!(!raw.is_active());
/// # Ok::<(), gitscope::Error>(())
/// ```
pub struct RawMode {
    switch: Arc<dyn Switch>,
    active: AtomicBool,
}

impl RawMode {
    /// Enters raw mode on the controlling terminal.
    ///
    /// # Errors
    ///
    /// [`Error::Terminal`] when standard input is not a terminal or its
    /// attributes cannot be changed.
    pub fn enable() -> Result<Self> {
        Self::with_switch(Arc::new(Crossterm))
    }

    /// Enters raw mode through `switch`. The calling thread becomes the
    /// owner of the terminal for the panic hook.
    pub fn with_switch(switch: Arc<dyn Switch>) -> Result<Self> {
        install_hook();
        let mode = Self {
            switch,
            active: AtomicBool::new(false),
        };
        mode.enter()?;
        *lock(&OWNER) = Some((thread::current().id(), Arc::clone(&mode.switch)));
        Ok(mode)
    }

    /// Re-enters raw mode, e.g. after an external program ran. Does
    /// nothing when raw mode is already active.
    pub fn enter(&self) -> Result<()> {
        if self.active.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.switch.enable().map_err(Error::Terminal)?;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Puts the original mode back. Does nothing when raw mode is not
    /// active.
    pub fn restore(&self) -> Result<()> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.switch.disable().map_err(Error::Terminal)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            log::error!("failed to restore terminal mode: {err}");
        }
        let mut owner = lock(&OWNER);
        if owner
            .as_ref()
            .is_some_and(|(_, switch)| Arc::ptr_eq(switch, &self.switch))
        {
            *owner = None;
        }
    }
}

/// Whether the current thread enabled the raw mode still in effect.
pub fn owns_terminal() -> bool {
    lock(&OWNER)
        .as_ref()
        .is_some_and(|(id, _)| *id == thread::current().id())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn install_hook() {
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let owner = if owns_terminal() { lock(&OWNER).take() } else { None };
            match owner {
                Some((_, switch)) => {
                    let _ = switch.disable();
                    let mut out = io::stdout();
                    let _ = out.write_all(SHOW_CURSOR);
                    let _ = out.write_all(WRAP_ON);
                    let _ = out.flush();
                    previous(info);
                }
                None if lock(&OWNER).is_some() => {
                    let name = thread::current().name().unwrap_or("unnamed").to_string();
                    log::error!("thread {name} panicked: {info}");
                }
                None => previous(info),
            }
        }));
    });
}
