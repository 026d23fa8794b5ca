//! Background key reader.
//!
//! The reader thread polls `crossterm` for events with a short timeout so
//! it can notice a stop or pause request without a pending key. Pausing
//! matters while an external program owns the terminal: the reader must
//! not steal its input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

const POLL: Duration = Duration::from_millis(20);
const PARK_SLEEP: Duration = Duration::from_millis(5);
const PAUSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Shared switches for a running [`Reader`].
#[derive(Debug, Clone, Default)]
pub struct ReaderControl {
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    parked: Arc<AtomicBool>,
}

impl ReaderControl {
    /// Stops reading and waits until the thread has acknowledged, so no
    /// event is consumed once this returns.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + PAUSE_TIMEOUT;
        while !self.parked.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(PARK_SLEEP);
        }
    }

    /// Lets a paused reader continue.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Reads key presses on a background thread and hands them over a
/// channel. Dropping the reader stops and joins the thread.
pub struct Reader {
    control: ReaderControl,
    keys: Receiver<KeyEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Reader {
    /// Starts reading terminal events. The terminal is expected to be in
    /// raw mode already.
    pub fn spawn() -> Self {
        let control = ReaderControl::default();
        let (tx, keys) = mpsc::channel();
        let thread_control = control.clone();
        let handle = thread::spawn(move || {
            while !thread_control.stop.load(Ordering::SeqCst) {
                if thread_control.is_paused() {
                    thread_control.parked.store(true, Ordering::SeqCst);
                    thread::sleep(PARK_SLEEP);
                    continue;
                }
                thread_control.parked.store(false, Ordering::SeqCst);

                match event::poll(POLL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        log::error!("polling terminal failed: {err}");
                        break;
                    }
                }
                if thread_control.is_paused() {
                    continue;
                }

                match event::read() {
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                        if tx.send(key).is_err() {
                            return;
                        }
                    }
                    // resizes are picked up by the prompt's size check
                    Ok(_) => {}
                    Err(err) => {
                        log::error!("reading terminal failed: {err}");
                        break;
                    }
                }
            }
        });

        Self {
            control,
            keys,
            handle: Some(handle),
        }
    }

    pub fn control(&self) -> ReaderControl {
        self.control.clone()
    }

    /// Waits up to `timeout` for the next key.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<KeyEvent, RecvTimeoutError> {
        self.keys.recv_timeout(timeout)
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.control.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
