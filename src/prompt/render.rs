//! Frame assembly.
//!
//! A frame is, top to bottom: the search line, `size` list rows (padded
//! so the detail pane does not jump), the view's info lines and, when
//! enabled, the controls hint.

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use super::{Mode, Prompt, View};
use crate::error::Result;
use crate::key::{Binding, KeyMap};
use crate::style::{sanitize, truncate};
use crate::term::Writer;

/// Caret shown after the query while typing.
const CARET: &str = "▏";

impl<V: View> Prompt<V> {
    /// Paints one frame for a terminal `cols` columns wide.
    pub fn render<W: Write>(&self, w: &mut Writer<W>, cols: usize) -> Result<()> {
        w.reset();
        w.write_str(&sanitize(&self.search_line(cols)))?;

        let window = self.list.visible();
        let size = self.list.size();
        let mut painted = 0;
        if window.rows.is_empty() && self.list.query().is_empty() && !self.list.is_searching() {
            for line in self.view.render_empty().iter().take(size) {
                w.write_str(&sanitize(line))?;
                painted += 1;
            }
        } else {
            let glyph_width = self.cursor_glyph.width();
            for (i, row) in window.rows.iter().enumerate() {
                let selected = window.active == Some(i);
                let prefix = if selected {
                    self.theme.cursor.render(&self.cursor_glyph)
                } else {
                    " ".repeat(glyph_width)
                };
                let body = self.view.render_item(&row.item, &row.positions, selected);
                w.write_str(&format!("{prefix} {}", sanitize(&body)))?;
                painted += 1;
            }
        }
        for _ in painted..size {
            w.write_str("")?;
        }

        for line in self.view.render_info(window.selected()) {
            w.write_str(&sanitize(&line))?;
        }

        if self.show_controls {
            w.write_str(&self.controls_line(cols))?;
        }
        w.flush()
    }

    fn search_line(&self, cols: usize) -> String {
        let label = self.theme.label.render(&truncate(&self.view.search_label(), cols));
        let query = self.theme.query.render(&self.shown_query());
        let caret = if self.mode == Mode::Search { CARET } else { "" };
        let mut line = format!("{label} {query}{caret}");
        if self.list.is_searching() {
            line.push_str(&self.theme.faint.render(" …"));
        } else if !self.list.query().is_empty() {
            let count = format!(" {}/{}", self.list.len(), self.list.total());
            line.push_str(&self.theme.faint.render(&count));
        }
        line
    }

    /// While typing, the buffer; otherwise the query the list holds.
    fn shown_query(&self) -> String {
        match self.mode {
            Mode::Search => self.query.clone(),
            Mode::Normal => self.list.query(),
        }
    }

    fn controls_line(&self, cols: usize) -> String {
        let help = self.help.clone().with_width(cols.saturating_sub(1));
        if self.mode == Mode::Search {
            return help.short_help_view(self.keys.search_help());
        }
        let view_keys = self.view.controls();
        let mut bindings: Vec<&Binding> = view_keys.iter().collect();
        bindings.extend(self.keys.short_help());
        help.short_help_view(bindings)
    }
}
