//! Asynchronous list population.
//!
//! The producer thread drains a channel into the list in batches: a flush
//! happens after [`BATCH_SIZE`] items, whenever the channel runs dry, and at
//! end of stream. Items join the scope only while no query is active; a
//! running query picks them up on its next `search`.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::model::State;
use super::types::{Cancellation, Item, UpdateSignal};

pub const BATCH_SIZE: usize = 4096;

const IDLE_POLL: Duration = Duration::from_millis(20);

pub(super) struct Producer {
    cancel: Cancellation,
    handle: Option<JoinHandle<()>>,
}

impl Producer {
    pub fn spawn<I: Item>(
        state: Arc<RwLock<State<I>>>,
        source: Receiver<I>,
        signal: UpdateSignal,
    ) -> Self {
        let cancel = Cancellation::new();
        let token = cancel.clone();
        let handle = thread::spawn(move || {
            let mut batch = Vec::with_capacity(BATCH_SIZE);
            let mut open = true;
            while open && !token.is_cancelled() {
                match source.recv_timeout(IDLE_POLL) {
                    Ok(item) => batch.push(item),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                while batch.len() < BATCH_SIZE {
                    match source.try_recv() {
                        Ok(item) => batch.push(item),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            open = false;
                            break;
                        }
                    }
                }
                if !append(&state, &mut batch, &token) {
                    return;
                }
                signal.notify();
            }
            log::debug!("producer finished");
        });
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stops the thread at its next poll without waiting for it.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.handle.take();
    }

    /// Blocks until the source is exhausted.
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("producer panicked");
            }
        }
    }
}

/// Moves `batch` into the list. The token is checked under the write lock,
/// so a stream cancelled by `replace_items` never lands in the new items.
fn append<I: Item>(state: &RwLock<State<I>>, batch: &mut Vec<I>, token: &Cancellation) -> bool {
    let mut st = state.write().unwrap_or_else(PoisonError::into_inner);
    if token.is_cancelled() {
        return false;
    }
    let base = st.items.len();
    Arc::make_mut(&mut st.items).append(batch);
    let end = st.items.len();
    if st.query.is_empty() {
        st.scope.extend(base..end);
    }
    st.clamp();
    true
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use crate::list::List;

    #[test]
    fn test_streams_everything_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut list = List::streaming(rx, 10);
        let sender = std::thread::spawn(move || {
            for i in 0..10_000 {
                tx.send(format!("commit {i}")).unwrap();
            }
        });
        sender.join().unwrap();
        list.wait();

        assert_eq!(list.total(), 10_000);
        assert_eq!(list.len(), 10_000);
        let window = list.visible();
        assert_eq!(window.rows[0].item, "commit 0");
        assert_eq!(window.rows[9].item, "commit 9");
    }

    #[test]
    fn test_signals_updates() {
        let (tx, rx) = mpsc::channel();
        let mut list = List::streaming(rx, 10);
        tx.send("one".to_string()).unwrap();
        drop(tx);
        list.wait();
        assert!(list.take_update());
        assert!(!list.take_update());
    }

    #[test]
    fn test_early_close_keeps_received_items() {
        let (tx, rx) = mpsc::channel::<String>();
        tx.send("a".into()).unwrap();
        tx.send("b".into()).unwrap();
        drop(tx);
        let mut list = List::streaming(rx, 10);
        list.wait();
        assert_eq!(list.scope(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_replaced_stream_adds_nothing() {
        let (tx, rx) = mpsc::channel();
        tx.send("old".to_string()).unwrap();
        let mut list = List::streaming(rx, 10);
        while list.total() < 1 {
            std::thread::yield_now();
        }

        list.replace_items(vec!["new".to_string()]);
        for i in 0..100 {
            if tx.send(format!("stale {i}")).is_err() {
                break;
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(60));
        drop(tx);
        list.wait();
        assert_eq!(list.items(), vec!["new".to_string()]);
        assert_eq!(list.scope(), vec!["new".to_string()]);
    }

    #[test]
    fn test_items_during_query_stay_out_of_scope() {
        let (tx, rx) = mpsc::channel();
        tx.send("apple".to_string()).unwrap();
        let mut list = List::streaming(rx, 10);
        while list.total() < 1 {
            std::thread::yield_now();
        }
        list.search("app");
        list.wait_search();
        tx.send("apricot".to_string()).unwrap();
        tx.send("application".to_string()).unwrap();
        drop(tx);
        list.wait();

        assert_eq!(list.total(), 3);
        assert_eq!(list.scope(), vec!["apple".to_string()]);
        list.search("app");
        list.wait();
        assert_eq!(list.len(), 2);
    }
}
