//! Terminal I/O layer.
//!
//! - [`RawMode`] puts the controlling terminal into raw mode and restores
//!   it on every exit path.
//! - [`Reader`] reads `crossterm` key events on a background thread.
//! - [`Writer`] paints fixed-height frames in place using cursor control
//!   sequences.

mod raw;
mod reader;
mod writer;

pub use raw::{owns_terminal, Crossterm, RawMode, Switch};
#[cfg(test)]
pub(crate) use raw::fake;
pub use reader::{Reader, ReaderControl};
pub use writer::Writer;

use crate::error::{Error, Result};

/// Line-wrap off.
pub const WRAP_OFF: &[u8] = b"\x1b[?7l";
/// Line-wrap on.
pub const WRAP_ON: &[u8] = b"\x1b[?7h";
/// Cursor hidden.
pub const HIDE_CURSOR: &[u8] = b"\x1b[?25l";
/// Cursor shown.
pub const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
/// Clears the current line and returns to column zero.
pub const CLEAR_LINE: &[u8] = b"\x1b[2K\r";
/// Cursor one line up, same column.
pub const MOVE_UP: &[u8] = b"\x1b[1A";
/// Cursor one line down, same column.
pub const MOVE_DOWN: &[u8] = b"\x1b[1B";

/// Terminal size as `(columns, rows)`.
pub fn size() -> Result<(usize, usize)> {
    let (cols, rows) = crossterm::terminal::size().map_err(Error::Terminal)?;
    Ok((cols as usize, rows as usize))
}
