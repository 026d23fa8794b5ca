//! # gitscope
//!
//! A keyboard-driven terminal front-end for a git working copy. Three
//! views, status, log and branches, share one interactive list with
//! incremental fuzzy search; heavier work (diffs, commits, checkouts) is
//! handed to `git` itself with the terminal attached.
//!
//! ## Layers
//!
//! - [`term`]: raw mode, key decoding and a frame writer that repaints in
//!   place below the cursor
//! - [`list`]: the list engine; a cursor/window over a filtered scope,
//!   fed by an optional producer thread and searched on a worker thread
//! - [`prompt`]: the event loop tying a list to a [`prompt::View`]
//! - [`views`]: the status, log and branch screens
//! - [`repo`]: the repository operations the views need
//!
//! ## Example
//!
//! ```rust
//! use gitscope::list::List;
//!
//! let mut list = List::new(vec!["fix leak".to_string(), "add cache".to_string()], 10);
//! list.search("cache");
//! list.wait();
//! assert_eq!(list.scope(), vec!["add cache".to_string()]);
//! ```

pub mod config;
pub mod error;
pub mod help;
pub mod key;
pub mod list;
pub mod prompt;
pub mod repo;
pub mod style;
pub mod term;
pub mod views;

pub use config::{Config, ViewKind};
pub use error::{Error, Result};
