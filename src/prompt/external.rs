//! Running programs that take over the terminal.
//!
//! Handlers never spawn processes directly; they go through [`Spawn`]. The
//! prompt installs a [`TerminalSpawner`] that hands the terminal over for
//! the duration of the child and takes it back afterwards. Tests install a
//! recording fake.

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::term::{RawMode, ReaderControl, Writer};

/// Runs a command to completion with the terminal attached.
pub trait Spawn {
    fn spawn(&mut self, cmd: &mut Command) -> io::Result<ExitStatus>;
}

/// Plain `Command::status` with inherited stdio. Used when no terminal is
/// owned, e.g. before the prompt starts.
#[derive(Debug, Default)]
pub struct ProcessSpawner;

impl Spawn for ProcessSpawner {
    fn spawn(&mut self, cmd: &mut Command) -> io::Result<ExitStatus> {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
    }
}

/// Suspends the prompt around a child process: clears the frame, shows the
/// cursor, parks the key reader and restores cooked mode; afterwards puts
/// everything back. The next frame is painted from scratch.
pub struct TerminalSpawner<W: Write> {
    writer: Arc<Mutex<Writer<W>>>,
    raw: Arc<RawMode>,
    reader: ReaderControl,
}

impl<W: Write> TerminalSpawner<W> {
    pub fn new(writer: Arc<Mutex<Writer<W>>>, raw: Arc<RawMode>, reader: ReaderControl) -> Self {
        Self {
            writer,
            raw,
            reader,
        }
    }

    fn suspend(&self) {
        let mut w = lock(&self.writer);
        if let Err(err) = w.clear().and_then(|_| w.show_cursor()) {
            log::warn!("could not clear frame before external command: {err}");
        }
        drop(w);
        self.reader.pause();
        if let Err(err) = self.raw.restore() {
            log::warn!("could not leave raw mode: {err}");
        }
    }

    fn resume(&self) {
        if let Err(err) = self.raw.enter() {
            log::error!("could not re-enter raw mode: {err}");
        }
        if let Err(err) = lock(&self.writer).hide_cursor() {
            log::warn!("could not hide cursor: {err}");
        }
        self.reader.resume();
    }
}

impl<W: Write> Spawn for TerminalSpawner<W> {
    fn spawn(&mut self, cmd: &mut Command) -> io::Result<ExitStatus> {
        self.suspend();
        let status = ProcessSpawner.spawn(cmd);
        self.resume();
        status
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::fake::{raw_mode, serial};
    use crate::term::{HIDE_CURSOR, SHOW_CURSOR};

    #[test]
    fn test_terminal_is_handed_over_and_taken_back() {
        let _guard = serial();
        let (term, raw) = raw_mode();
        let raw = Arc::new(raw);
        let writer = Arc::new(Mutex::new(Writer::new(Vec::new())));
        let reader = ReaderControl::default();
        let mut spawner = TerminalSpawner::new(Arc::clone(&writer), Arc::clone(&raw), reader.clone());

        let status = spawner.spawn(&mut Command::new("true")).unwrap();
        assert!(status.success());

        // cooked while the child ran, raw again afterwards
        assert_eq!(term.transitions(), ["raw", "cooked", "raw"]);
        assert!(raw.is_active());
        assert!(!reader.is_paused());
        let out = lock(&writer).get_ref().clone();
        let shown = out.windows(SHOW_CURSOR.len()).position(|s| s == SHOW_CURSOR).unwrap();
        let hidden = out.windows(HIDE_CURSOR.len()).rposition(|s| s == HIDE_CURSOR).unwrap();
        assert!(shown < hidden);

        drop(spawner);
        let raw = Arc::try_unwrap(raw).ok().unwrap();
        drop(raw);
        assert!(!term.is_raw());
    }
}
