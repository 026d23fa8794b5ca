//! Frame writer.
//!
//! The writer addresses the terminal as a window of `height` physical
//! lines that is overwritten in place on every frame. Bytes are collected
//! in a buffer and written in one go by [`Writer::flush`], which leaves
//! the cursor rewind for the next frame queued in the buffer.
//!
//! ```rust
//! use gitscope::term::Writer;
//!
//! let mut w = Writer::new(Vec::new());
//! w.reset();
//! w.write_line(b"first").unwrap();
//! w.write_line(b"second").unwrap();
//! w.flush().unwrap();
//! assert_eq!(w.height(), 2);
//! ```

use std::io::Write;

use super::{CLEAR_LINE, HIDE_CURSOR, MOVE_DOWN, MOVE_UP, SHOW_CURSOR, WRAP_OFF, WRAP_ON};
use crate::error::{Error, Result};

/// Paints frames of whole lines in place over an output stream.
///
/// A frame is written with [`Writer::reset`], one [`Writer::write_line`]
/// per row and a final [`Writer::flush`]. Line wrap is off while a frame is
/// being written so a long row never takes two physical lines.
pub struct Writer<W: Write> {
    out: W,
    buf: Vec<u8>,
    /// Lines the current frame occupies on screen.
    height: usize,
    /// Line of the frame the next write lands on.
    cursor: usize,
    reset: bool,
    in_frame: bool,
}

impl<W: Write> Writer<W> {
    /// Creates a writer that has painted nothing yet.
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: Vec::new(),
            height: 0,
            cursor: 0,
            reset: false,
            in_frame: false,
        }
    }

    /// Discards anything buffered and marks the frame for clearing: the
    /// next write or flush first moves up over every line of the previous
    /// frame, clearing each.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.reset = true;
        self.in_frame = false;
    }

    /// Buffers one logical line.
    ///
    /// # Errors
    ///
    /// [`Error::LineBreak`] when `line` contains `\r` or `\n`; callers
    /// sanitize rendered text first.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if line.iter().any(|&b| b == b'\r' || b == b'\n') {
            return Err(Error::LineBreak);
        }
        self.begin();

        self.buf.extend_from_slice(CLEAR_LINE);
        self.buf.extend_from_slice(line);
        if self.cursor == self.height {
            self.buf.push(b'\n');
            self.height += 1;
        } else {
            self.buf.extend_from_slice(MOVE_DOWN);
        }
        self.cursor += 1;
        Ok(())
    }

    /// [`Writer::write_line`] for text.
    pub fn write_str(&mut self, line: &str) -> Result<()> {
        self.write_line(line.as_bytes())
    }

    /// Clears stale lines below the last write, writes the buffered frame,
    /// and queues the rewind to the frame origin.
    pub fn flush(&mut self) -> Result<()> {
        self.begin();
        for _ in self.cursor..self.height {
            self.buf.extend_from_slice(CLEAR_LINE);
            self.buf.extend_from_slice(MOVE_DOWN);
        }
        self.buf.extend_from_slice(WRAP_ON);

        self.out.write_all(&self.buf)?;
        self.out.flush()?;

        self.buf.clear();
        for _ in 0..self.height {
            self.buf.extend_from_slice(MOVE_UP);
        }
        self.cursor = 0;
        self.in_frame = false;
        Ok(())
    }

    /// Clears whatever the writer has painted and leaves the cursor at the
    /// frame origin with an empty frame.
    pub fn clear(&mut self) -> Result<()> {
        self.reset();
        self.flush()
    }

    /// Hides the cursor, written straight through.
    pub fn hide_cursor(&mut self) -> Result<()> {
        self.raw(HIDE_CURSOR)
    }

    /// Shows the cursor, written straight through.
    pub fn show_cursor(&mut self) -> Result<()> {
        self.raw(SHOW_CURSOR)
    }

    /// Re-enables line wrap outside of a frame.
    pub fn enable_wrap(&mut self) -> Result<()> {
        self.raw(WRAP_ON)
    }

    /// Physical lines the last flushed frame occupies.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The underlying output.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Gives back the underlying output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }

    fn begin(&mut self) {
        if self.in_frame {
            return;
        }
        if self.reset {
            for _ in 0..self.height {
                self.buf.extend_from_slice(MOVE_UP);
                self.buf.extend_from_slice(CLEAR_LINE);
            }
            self.height = 0;
            self.cursor = 0;
            self.reset = false;
        }
        self.buf.extend_from_slice(WRAP_OFF);
        self.in_frame = true;
    }
}
