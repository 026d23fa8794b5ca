//! Theme and text helpers.
//!
//! The [`Theme`] is an immutable bundle of `lipgloss` styles handed to the
//! renderers at construction. Colours are plain ANSI palette indices so the
//! output follows the user's terminal scheme and no background probing is
//! needed.

use std::borrow::Cow;

use lipgloss_extras::prelude::*;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: &str = "…";

#[derive(Debug, Clone)]
pub struct Theme {
    pub label: Style,
    pub query: Style,
    pub cursor: Style,
    pub selected: Style,
    pub normal: Style,
    pub matched: Style,
    pub faint: Style,
    pub info_key: Style,
    pub info_value: Style,
    pub hint_key: Style,
    pub hint_desc: Style,
    pub hint_separator: Style,

    pub staged: Style,
    pub unstaged: Style,
    pub untracked: Style,
    pub conflicted: Style,

    pub hash: Style,
    pub date: Style,
    pub head_ref: Style,
    pub local_ref: Style,
    pub remote_ref: Style,
    pub tag_ref: Style,
    pub ahead: Style,
    pub behind: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let faint = Style::new().foreground(Color::from("8"));
        Self {
            label: Style::new().foreground(Color::from("5")).bold(true),
            query: Style::new().foreground(Color::from("15")),
            cursor: Style::new().foreground(Color::from("5")).bold(true),
            selected: Style::new().bold(true),
            normal: Style::new(),
            matched: Style::new().underline(true).bold(true),
            faint: faint.clone(),
            info_key: faint.clone(),
            info_value: Style::new(),
            hint_key: Style::new().foreground(Color::from("7")),
            hint_desc: faint.clone(),
            hint_separator: faint,

            staged: Style::new().foreground(Color::from("2")),
            unstaged: Style::new().foreground(Color::from("1")),
            untracked: Style::new().foreground(Color::from("8")),
            conflicted: Style::new().foreground(Color::from("5")).bold(true),

            hash: Style::new().foreground(Color::from("3")),
            date: Style::new().foreground(Color::from("4")),
            head_ref: Style::new().foreground(Color::from("6")).bold(true),
            local_ref: Style::new().foreground(Color::from("2")).bold(true),
            remote_ref: Style::new().foreground(Color::from("1")).bold(true),
            tag_ref: Style::new().foreground(Color::from("3")).bold(true),
            ahead: Style::new().foreground(Color::from("2")),
            behind: Style::new().foreground(Color::from("1")),
        }
    }
}

/// Renders `text` with `base`, switching to `highlight` for every
/// character whose index appears in `positions`. Positions are character
/// (codepoint) indices as produced by the fuzzy matcher; out-of-range
/// positions are ignored. Control characters are replaced as in
/// [`sanitize`] before styling.
pub fn highlight(text: &str, positions: &[usize], base: &Style, highlight: &Style) -> String {
    let sanitized = sanitize(text);
    let text: &str = &sanitized;
    if positions.is_empty() {
        return base.render(text);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = String::new();
    let mut current = 0;
    for &idx in &sorted {
        if idx >= chars.len() {
            continue;
        }
        if current < idx {
            let segment: String = chars[current..idx].iter().collect();
            out.push_str(&base.render(&segment));
        }
        out.push_str(&highlight.render(&chars[idx].to_string()));
        current = idx + 1;
    }
    if current < chars.len() {
        let rest: String = chars[current..].iter().collect();
        out.push_str(&base.render(&rest));
    }
    out
}

/// Makes a rendered line safe to paint as one terminal row.
///
/// Tabs become a space and every other control character, line breaks
/// included, becomes `?`, the way `ls` shows odd file names. `ESC` is kept
/// so styling sequences survive. Text without control characters is
/// returned as is.
///
/// # Examples
///
/// ```rust
/// use gitscope::style::sanitize;
///
/// assert_eq!(sanitize("a\rb.txt"), "a?b.txt");
/// assert_eq!(sanitize("\x1b[1mbold\x1b[0m"), "\x1b[1mbold\x1b[0m");
/// ```
pub fn sanitize(line: &str) -> Cow<'_, str> {
    if !line.chars().any(|c| c.is_control() && c != ESC) {
        return Cow::Borrowed(line);
    }
    Cow::Owned(
        line.chars()
            .map(|c| match c {
                '\t' => ' ',
                ESC => ESC,
                c if c.is_control() => '?',
                c => c,
            })
            .collect(),
    )
}

const ESC: char = '\x1b';

/// Display width of `s` ignoring any ANSI escape sequences it carries.
pub fn visible_width(s: &str) -> usize {
    strip_ansi_escapes::strip_str(s).width()
}

/// Cuts plain text to at most `width` columns, ending in an ellipsis when
/// something was dropped. Never splits a grapheme cluster.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let budget = width - ELLIPSIS.width();
    let mut out = String::new();
    let mut used = 0;
    for g in text.graphemes(true) {
        let w = g.width();
        if used + w > budget {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push_str(ELLIPSIS);
    out
}
