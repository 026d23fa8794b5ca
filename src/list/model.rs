//! The `List` handle and its shared state.
//!
//! `State` is the only object shared across threads. It lives behind a
//! single `RwLock`: the event loop takes it when a key arrives or a frame
//! is rendered, the search worker and the async producer take it to flush
//! batches.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::filtering::SearchContext;
use super::producer::Producer;
use super::types::{Hit, Item, UpdateSignal};

pub(super) struct State<I> {
    /// Append-only master sequence.
    pub items: Arc<Vec<I>>,
    /// Indices into `items`, in ranking order.
    pub scope: Vec<usize>,
    pub cursor: usize,
    pub start: usize,
    pub size: usize,
    pub query: String,
    pub hits: HashMap<usize, Hit>,
    /// Bumped by every search so stale flushes can be told apart.
    pub generation: u64,
}

impl<I> State<I> {
    pub fn new(items: Vec<I>, size: usize) -> Self {
        let scope = (0..items.len()).collect();
        Self {
            items: Arc::new(items),
            scope,
            cursor: 0,
            start: 0,
            size: size.max(1),
            query: String::new(),
            hits: HashMap::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.scope.len()
    }

    /// Restores the full, unranked scope.
    pub fn unfilter(&mut self) {
        self.scope = (0..self.items.len()).collect();
        self.hits.clear();
    }
}

/// A searchable, optionally asynchronously populated list with a cursor
/// and a fixed-height viewport.
///
/// ```rust
/// use gitscope::list::List;
///
/// let mut list = List::new(vec!["alpha".to_string(), "beta".to_string()], 10);
/// list.next();
/// assert_eq!(list.selected().as_deref(), Some("beta"));
/// ```
pub struct List<I: Item> {
    pub(super) state: Arc<RwLock<State<I>>>,
    pub(super) search: Option<SearchContext>,
    pub(super) producer: Option<Producer>,
    pub(super) signal: UpdateSignal,
    pub(super) updates: Receiver<()>,
}

impl<I: Item> List<I> {
    /// Creates a list over `items` with a window of `size` rows.
    pub fn new(items: Vec<I>, size: usize) -> Self {
        let (signal, updates) = UpdateSignal::channel();
        Self {
            state: Arc::new(RwLock::new(State::new(items, size))),
            search: None,
            producer: None,
            signal,
            updates,
        }
    }

    /// Creates an empty list fed from `source` on a producer thread. Items
    /// are flushed in batches; the list stays usable with whatever arrived
    /// if the sender goes away early.
    pub fn streaming(source: Receiver<I>, size: usize) -> Self {
        let mut list = Self::new(Vec::new(), size);
        list.producer = Some(Producer::spawn(
            Arc::clone(&list.state),
            source,
            list.signal.clone(),
        ));
        list
    }

    /// Appends one item on the producer side.
    pub fn push(&mut self, item: I) {
        self.extend(std::iter::once(item));
    }

    /// Appends items; they join the scope unless a query is active.
    pub fn extend(&mut self, items: impl IntoIterator<Item = I>) {
        let mut st = self.write();
        let base = st.items.len();
        Arc::make_mut(&mut st.items).extend(items);
        let end = st.items.len();
        if st.query.is_empty() {
            st.scope.extend(base..end);
        }
        st.clamp();
    }

    /// Swaps in a fresh master sequence, e.g. after the repository changed.
    ///
    /// The query survives and is re-run. Without a query the cursor moves to
    /// the item with the same fingerprint as the one selected before, or
    /// stays at the (clamped) old index when that item is gone.
    pub fn replace_items(&mut self, items: Vec<I>) {
        self.cancel_running();
        if let Some(mut producer) = self.producer.take() {
            producer.cancel();
        }
        let previous = self.selected().map(|item| item.fingerprint());
        let query = {
            let mut st = self.write();
            let old_cursor = st.cursor;
            st.items = Arc::new(items);
            st.generation += 1;
            st.unfilter();
            if st.query.is_empty() {
                let found = previous.and_then(|fp| {
                    st.items.iter().position(|item| item.fingerprint() == fp)
                });
                st.cursor = found.unwrap_or(old_cursor);
                st.clamp();
            }
            st.query.clone()
        };
        if !query.is_empty() {
            self.search(&query);
        }
    }

    /// Returns true once per pending wake-up from the producer or the
    /// search pipeline.
    pub fn take_update(&self) -> bool {
        self.updates.try_recv().is_ok()
    }

    /// Blocks until the producer has drained its source and the running
    /// search, if any, has flushed its last batch.
    pub fn wait(&mut self) {
        if let Some(producer) = self.producer.as_mut() {
            producer.wait();
        }
        if let Some(search) = self.search.as_mut() {
            search.wait();
        }
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, State<I>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, State<I>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn cancel_running(&mut self) {
        if let Some(mut search) = self.search.take() {
            search.cancel();
        }
    }
}

impl<I: Item> Drop for List<I> {
    fn drop(&mut self) {
        self.cancel_running();
        if let Some(mut producer) = self.producer.take() {
            producer.cancel();
        }
    }
}
