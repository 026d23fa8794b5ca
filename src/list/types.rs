//! Core types and traits for the list engine.
//!
//! - [`Item`]: what a list holds; searchable text plus an identity
//! - [`Match`]: one fuzzy hit produced by the search pipeline
//! - [`Row`] / [`Window`]: the visible slice handed to renderers
//! - [`UpdateSignal`]: coalescing wake-up for the render loop
//! - [`Cancellation`]: stop flag shared with background workers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

/// A value displayed and searched by a [`List`](super::List).
///
/// `filter_value` is the text the fuzzy matcher runs against; match
/// positions always index into it. `fingerprint` identifies the item across
/// reloads so the cursor can stay on it when the underlying value changes
/// (a file going from unstaged to staged keeps its path, for instance).
pub trait Item: Clone + Send + Sync + 'static {
    fn filter_value(&self) -> String;

    fn fingerprint(&self) -> String {
        self.filter_value()
    }
}

impl Item for String {
    fn filter_value(&self) -> String {
        self.clone()
    }
}

/// A fuzzy hit: the item's index in the master sequence, the matched
/// character positions and the matcher's score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub positions: Vec<usize>,
    pub score: i64,
}

impl Match {
    /// Ranking order: higher score first, ties by original index.
    pub fn ranks_before(&self, other: &Match) -> bool {
        ranks_before((self.score, self.index), (other.score, other.index))
    }
}

pub(super) fn ranks_before(a: (i64, usize), b: (i64, usize)) -> bool {
    a.0 > b.0 || (a.0 == b.0 && a.1 < b.1)
}

/// Score and positions stored for an item in scope while a query is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Hit {
    pub score: i64,
    pub positions: Vec<usize>,
}

/// Whether a background search is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Running,
}

/// One visible row.
#[derive(Debug, Clone)]
pub struct Row<I> {
    /// Index of the item in the master sequence.
    pub index: usize,
    pub item: I,
    /// Highlighted character positions; empty without a query.
    pub positions: Vec<usize>,
}

/// The rendered slice of the scope plus the position of the cursor in it.
/// `active` is `None` exactly when the scope is empty.
#[derive(Debug, Clone)]
pub struct Window<I> {
    pub rows: Vec<Row<I>>,
    pub active: Option<usize>,
}

impl<I> Window<I> {
    /// The item under the cursor, taken from the same snapshot as the rows.
    pub fn selected(&self) -> Option<&I> {
        self.rows.get(self.active?).map(|row| &row.item)
    }
}

/// Size-one wake-up channel. Several notifications between two frames
/// collapse into a single pending signal.
#[derive(Debug, Clone)]
pub struct UpdateSignal {
    tx: SyncSender<()>,
}

impl UpdateSignal {
    pub fn channel() -> (Self, Receiver<()>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { tx }, rx)
    }

    pub fn notify(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::trace!("update listener gone");
            }
        }
    }
}

/// Cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
