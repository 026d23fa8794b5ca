//! Searchable list engine.
//!
//! A [`List`] holds an append-only sequence of [`Item`]s and a *scope*: the
//! subsequence currently shown, in ranking order. Without a query the scope
//! is every item in insertion order; with a query it holds the fuzzy
//! matches, best first, filled in by a background search.
//!
//! ## Threads
//!
//! All state sits behind one `RwLock`. Three parties take it:
//! - the event loop, for navigation, search requests and rendering
//! - the search drain, once per flushed batch (see [`filtering`])
//! - the producer of a [`List::streaming`] list, once per batch
//!
//! Background work announces progress through a size-one channel; the
//! event loop polls it with [`List::take_update`] and repaints.
//!
//! ## Viewport
//!
//! `cursor` indexes the scope, `start` is the first visible row and `size`
//! the window height. Every mutation re-establishes
//! `start <= cursor < start + size` and keeps the cursor inside the scope.
//! [`List::visible`] returns the window together with the cursor's row.

pub mod filtering;
mod model;
mod navigation;
pub mod producer;
mod api;
pub mod types;

pub use filtering::{fuzzy_matches, FLUSH_THRESHOLD};
pub use model::List;
pub use producer::BATCH_SIZE;
pub use types::{Cancellation, Item, Match, Row, SearchState, UpdateSignal, Window};
