//! Background fuzzy search.
//!
//! A search runs on two threads. The matcher walks an `items` snapshot and
//! sends every hit over a bounded channel; the drain buffers hits and
//! flushes them into the list's scope under the write lock. The first flush
//! happens as soon as a window's worth of matches is buffered so the screen
//! fills quickly, later flushes every [`FLUSH_THRESHOLD`] matches and once at
//! the end. Each flush is sorted and merged into the already ranked scope.
//!
//! Cancelling sets the shared [`Cancellation`] and joins the drain, which
//! drops its receiver (unblocking the matcher) and joins the matcher in
//! turn. Nothing touches the list after `cancel` returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::model::State;
use super::types::{ranks_before, Cancellation, Hit, Item, Match, UpdateSignal};

/// Matches buffered before a flush once the first window has been shown.
pub const FLUSH_THRESHOLD: usize = 16384;

/// Capacity of the matcher to drain channel.
const MATCH_CHANNEL_BOUND: usize = 1024;

/// Lazily fuzzy-matches `query` against every item, in item order.
///
/// Iteration stops early once `cancel` is set.
///
/// ```rust
/// use gitscope::list::{fuzzy_matches, Cancellation};
///
/// let items = vec!["fix memory leak".to_string(), "docs".to_string()];
/// let hits: Vec<_> = fuzzy_matches(&items, "fml", &Cancellation::new()).collect();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].index, 0);
/// ```
pub fn fuzzy_matches<'a, I: Item>(
    items: &'a [I],
    query: &'a str,
    cancel: &'a Cancellation,
) -> impl Iterator<Item = Match> + 'a {
    let matcher = SkimMatcherV2::default();
    items
        .iter()
        .enumerate()
        .take_while(move |_| !cancel.is_cancelled())
        .filter_map(move |(index, item)| {
            matcher
                .fuzzy_indices(&item.filter_value(), query)
                .map(|(score, positions)| Match {
                    index,
                    positions,
                    score,
                })
        })
}

/// Handle on a running search.
pub(super) struct SearchContext {
    cancel: Cancellation,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SearchContext {
    pub fn spawn<I: Item>(
        state: Arc<RwLock<State<I>>>,
        items: Arc<Vec<I>>,
        query: String,
        generation: u64,
        window: usize,
        signal: UpdateSignal,
    ) -> Self {
        let cancel = Cancellation::new();
        let running = Arc::new(AtomicBool::new(true));

        let worker = Drain {
            state,
            cancel: cancel.clone(),
            generation,
            signal,
        };
        let done = Arc::clone(&running);
        let handle = thread::spawn(move || {
            worker.run(items, query, window);
            done.store(false, Ordering::SeqCst);
        });

        Self {
            cancel,
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cancels and joins.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.wait();
    }

    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("search drain panicked");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

struct Drain<I> {
    state: Arc<RwLock<State<I>>>,
    cancel: Cancellation,
    generation: u64,
    signal: UpdateSignal,
}

impl<I: Item> Drain<I> {
    fn run(&self, items: Arc<Vec<I>>, query: String, window: usize) {
        let (tx, rx) = mpsc::sync_channel::<Match>(MATCH_CHANNEL_BOUND);
        let matcher_cancel = self.cancel.clone();
        let matcher = thread::spawn(move || {
            for hit in fuzzy_matches(&items, &query, &matcher_cancel) {
                if tx.send(hit).is_err() {
                    return;
                }
            }
        });

        let mut buffer = Vec::new();
        let mut threshold = window.max(1);
        for hit in rx.iter() {
            buffer.push(hit);
            if buffer.len() >= threshold {
                if !self.flush(&mut buffer) {
                    break;
                }
                threshold = FLUSH_THRESHOLD;
            }
            if self.cancel.is_cancelled() {
                break;
            }
        }
        drop(rx);

        if matcher.join().is_err() {
            log::warn!("fuzzy matcher panicked, search abandoned");
            return;
        }
        if !self.cancel.is_cancelled() {
            self.flush(&mut buffer);
        }
        self.signal.notify();
    }

    /// Sorts the buffer and merges it into the scope. Returns false when the
    /// search went stale and must stop.
    fn flush(&self, buffer: &mut Vec<Match>) -> bool {
        buffer.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        let batch = std::mem::take(buffer);
        {
            let mut st = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if self.cancel.is_cancelled() || st.generation != self.generation {
                return false;
            }
            if batch.is_empty() {
                return true;
            }

            let ranked: Vec<(i64, usize)> = st
                .scope
                .iter()
                .map(|&i| (st.hits.get(&i).map_or(0, |h| h.score), i))
                .collect();
            let incoming: Vec<(i64, usize)> = batch.iter().map(|m| (m.score, m.index)).collect();
            st.scope = merge_ranked(&ranked, &incoming);
            for m in batch {
                st.hits.insert(
                    m.index,
                    Hit {
                        score: m.score,
                        positions: m.positions,
                    },
                );
            }
            st.clamp();
            log::trace!("search flushed, scope now {}", st.scope.len());
        }
        self.signal.notify();
        true
    }
}

/// Merges two `(score, index)` runs that are each in ranking order.
fn merge_ranked(a: &[(i64, usize)], b: &[(i64, usize)]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if ranks_before(b[j], a[i]) {
            out.push(b[j].1);
            j += 1;
        } else {
            out.push(a[i].1);
            i += 1;
        }
    }
    out.extend(a[i..].iter().map(|&(_, idx)| idx));
    out.extend(b[j..].iter().map(|&(_, idx)| idx));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{List, SearchState};

    const TARGET: usize = 4711;

    fn commit_log() -> Vec<String> {
        (0..10_000)
            .map(|i| match i {
                TARGET => "fix memory leak in cache".to_string(),
                i if i % 100 == 7 => format!("abc widget {i}"),
                i => format!("commit number {i}"),
            })
            .collect()
    }

    fn score(text: &str, query: &str) -> Option<i64> {
        SkimMatcherV2::default().fuzzy_match(text, query)
    }

    #[test]
    fn test_merge_ranked() {
        let a = [(90, 3), (50, 1), (10, 0)];
        let b = [(90, 2), (50, 4), (5, 5)];
        assert_eq!(merge_ranked(&a, &b), vec![2, 3, 1, 4, 0, 5]);
    }

    #[test]
    fn test_fuzzy_matches_respects_cancellation() {
        let items = commit_log();
        let cancel = Cancellation::new();
        cancel.cancel();
        assert_eq!(fuzzy_matches(&items, "commit", &cancel).count(), 0);
    }

    #[test]
    fn test_empty_search_restores_items() {
        let items = vec!["alpha".to_string(), "beta".into(), "gamma".into()];
        let mut list = List::new(items.clone(), 2);
        list.search("ta");
        list.wait();
        list.search("   ");
        assert_eq!(list.scope(), items);
        assert_eq!(list.query(), "");
        assert!((0..3).all(|i| list.matches(i).is_empty()));
    }

    #[test]
    fn test_search_finds_target_in_first_window() {
        let mut list = List::new(commit_log(), 10);
        list.search("fxmlk");
        list.wait();

        let window = list.visible();
        assert_eq!(window.active, Some(0));
        let top = &window.rows[0];
        assert_eq!(top.index, TARGET);
        let chars: Vec<char> = top.item.chars().collect();
        let picked: String = top.positions.iter().map(|&p| chars[p]).collect();
        assert_eq!(picked, "fxmlk");
    }

    #[test]
    fn test_search_results_are_ranked() {
        let mut list = List::new(commit_log(), 10);
        list.search("cmt 1");
        list.wait();

        let items = commit_log();
        let scope = list.scope_indices();
        assert!(!scope.is_empty());
        let keys: Vec<(i64, usize)> = scope
            .iter()
            .map(|&i| (score(&items[i], "cmt 1").expect("scope item must match"), i))
            .collect();
        for pair in keys.windows(2) {
            assert!(ranks_before(pair[0], pair[1]), "{:?} before {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_new_search_discards_previous_results() {
        let mut list = List::new(commit_log(), 10);
        list.search("fxmlk");
        list.search("abc");
        list.wait();

        let items = commit_log();
        let scope = list.scope_indices();
        assert_eq!(scope.len(), 100);
        assert!(!scope.contains(&TARGET));
        assert!(scope.iter().all(|&i| score(&items[i], "abc").is_some()));
        assert_eq!(list.search_state(), SearchState::Idle);
    }

    #[test]
    fn test_cancel_search_resets_scope() {
        let mut list = List::new(commit_log(), 10);
        list.search("abc");
        list.next();
        list.cancel_search();
        assert_eq!(list.len(), 10_000);
        assert_eq!(list.cursor(), 0);
        assert!(list.matches(7).is_empty());
    }

    #[derive(Clone)]
    struct Fragile(&'static str);

    impl Item for Fragile {
        fn filter_value(&self) -> String {
            if self.0 == "boom" {
                panic!("unreadable item");
            }
            self.0.to_string()
        }
    }

    #[test]
    fn test_matcher_panic_leaves_list_usable() {
        let mut list = List::new(vec![Fragile("one"), Fragile("boom"), Fragile("two")], 5);
        list.search("o");
        list.wait();
        assert!(!list.is_searching());
        list.search("");
        assert_eq!(list.len(), 3);
    }
}
