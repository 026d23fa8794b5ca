//! Runtime configuration.
//!
//! `Config` starts from sensible defaults and is adjusted with chained
//! `with_*` options, the same way the widgets in this crate are built:
//!
//! ```rust
//! use gitscope::config::{Config, ViewKind};
//!
//! let config = Config::default()
//!     .with_height(15)
//!     .with_view(ViewKind::Log)
//!     .with_controls(false);
//! assert_eq!(config.height, 15);
//! ```

use std::path::PathBuf;

use log::LevelFilter;

/// Rows used by the prompt around the list itself: the search line,
/// the info pane and the controls hint.
pub const CHROME_ROWS: usize = 6;

/// Default number of list rows.
pub const DEFAULT_HEIGHT: usize = 10;

/// The view the prompt starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewKind {
    #[default]
    Status,
    Log,
    Branch,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Repository (or any path inside its working tree).
    pub path: PathBuf,
    /// Initial view.
    pub view: ViewKind,
    /// Requested list height; clamped to the terminal at run time.
    pub height: usize,
    /// Whether the controls hint line is rendered below the info pane.
    pub show_controls: bool,
    /// Glyph drawn in front of the selected row.
    pub cursor_glyph: String,
    /// Log destination; `None` disables logging.
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            view: ViewKind::default(),
            height: DEFAULT_HEIGHT,
            show_controls: true,
            cursor_glyph: "❯".to_string(),
            log_file: None,
            log_level: LevelFilter::Warn,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_view(mut self, view: ViewKind) -> Self {
        self.view = view;
        self
    }

    /// Sets the list height. Zero is bumped to one row.
    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height.max(1);
        self
    }

    pub fn with_controls(mut self, show: bool) -> Self {
        self.show_controls = show;
        self
    }

    pub fn with_cursor_glyph(mut self, glyph: &str) -> Self {
        self.cursor_glyph = glyph.to_string();
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Maps a `-v` count onto a log level: 0 warn, 1 info, 2 debug, 3+ trace.
    pub fn with_verbosity(mut self, count: u8) -> Self {
        self.log_level = match count {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        self
    }

    /// List height that fits a terminal with `rows` rows.
    pub fn fitted_height(&self, rows: usize) -> usize {
        let chrome = if self.show_controls {
            CHROME_ROWS
        } else {
            CHROME_ROWS - 1
        };
        self.height.min(rows.saturating_sub(chrome)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.view, ViewKind::Status);
        assert!(config.show_controls);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_zero_height_is_bumped() {
        assert_eq!(Config::new().with_height(0).height, 1);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Config::new().with_verbosity(1).log_level, LevelFilter::Info);
        assert_eq!(Config::new().with_verbosity(2).log_level, LevelFilter::Debug);
        assert_eq!(Config::new().with_verbosity(9).log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_fitted_height_clamps_to_terminal() {
        let config = Config::new().with_height(40);
        assert_eq!(config.fitted_height(24), 24 - CHROME_ROWS);
        assert_eq!(config.fitted_height(3), 1);

        let small = Config::new().with_height(5);
        assert_eq!(small.fitted_height(100), 5);
    }
}
