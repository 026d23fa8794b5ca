//! Search entry points and read accessors.

use std::sync::Arc;

use super::filtering::SearchContext;
use super::types::{Item, Row, SearchState, Window};
use super::List;

impl<I: Item> List<I> {
    /// Filters the list by `term`.
    ///
    /// The term is trimmed and recorded as the query; cursor and viewport
    /// go back to the top. An empty term restores the full item sequence
    /// synchronously. Anything else cancels the running search, empties the
    /// scope and starts a background search over the current items; results
    /// arrive in batches, each announced through [`List::take_update`].
    ///
    /// ```rust
    /// use gitscope::list::List;
    ///
    /// let mut list = List::new(vec!["main".to_string(), "feature/x".to_string()], 10);
    /// list.search("feat");
    /// list.wait();
    /// assert_eq!(list.scope(), vec!["feature/x".to_string()]);
    /// ```
    pub fn search(&mut self, term: &str) {
        let term = term.trim();
        self.cancel_running();

        let pending = {
            let mut st = self.write();
            st.generation += 1;
            st.cursor = 0;
            st.start = 0;
            st.query = term.to_string();
            if term.is_empty() {
                st.unfilter();
                None
            } else {
                st.scope.clear();
                st.hits.clear();
                Some((Arc::clone(&st.items), st.generation, st.size))
            }
        };

        if let Some((items, generation, window)) = pending {
            log::debug!("searching {} items for {term:?}", items.len());
            self.search = Some(SearchContext::spawn(
                Arc::clone(&self.state),
                items,
                term.to_string(),
                generation,
                window,
                self.signal.clone(),
            ));
        }
    }

    /// Drops the query and any running search, restoring every item.
    pub fn cancel_search(&mut self) {
        self.search("");
    }

    /// Blocks until the running search has flushed its last batch.
    pub fn wait_search(&mut self) {
        if let Some(search) = self.search.as_mut() {
            search.wait();
        }
    }

    pub fn search_state(&self) -> SearchState {
        match &self.search {
            Some(search) if search.is_running() => SearchState::Running,
            _ => SearchState::Idle,
        }
    }

    pub fn is_searching(&self) -> bool {
        self.search_state() == SearchState::Running
    }

    /// The rows inside the viewport and the cursor's position among them.
    pub fn visible(&self) -> Window<I> {
        let st = self.read();
        let end = (st.start + st.size).min(st.len());
        let begin = st.start.min(end);
        let rows = st.scope[begin..end]
            .iter()
            .map(|&index| Row {
                index,
                item: st.items[index].clone(),
                positions: st
                    .hits
                    .get(&index)
                    .map(|hit| hit.positions.clone())
                    .unwrap_or_default(),
            })
            .collect();
        let active = if st.scope.is_empty() {
            None
        } else {
            Some(st.cursor - st.start)
        };
        Window { rows, active }
    }

    /// Highlight positions for the item at `index` in the master sequence.
    /// Empty without a query or when the item is not in scope.
    pub fn matches(&self, index: usize) -> Vec<usize> {
        let st = self.read();
        if st.query.is_empty() {
            return Vec::new();
        }
        st.hits
            .get(&index)
            .map(|hit| hit.positions.clone())
            .unwrap_or_default()
    }

    /// The item under the cursor.
    pub fn selected(&self) -> Option<I> {
        let st = self.read();
        st.scope.get(st.cursor).map(|&i| st.items[i].clone())
    }

    /// Items in scope, in display order.
    pub fn scope(&self) -> Vec<I> {
        let st = self.read();
        st.scope.iter().map(|&i| st.items[i].clone()).collect()
    }

    /// Master-sequence indices of the items in scope.
    pub fn scope_indices(&self) -> Vec<usize> {
        self.read().scope.clone()
    }

    /// Every item, ignoring the query.
    pub fn items(&self) -> Vec<I> {
        self.read().items.as_ref().clone()
    }

    /// Number of items in scope.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items regardless of the query.
    pub fn total(&self) -> usize {
        self.read().items.len()
    }

    pub fn query(&self) -> String {
        self.read().query.clone()
    }

    pub fn cursor(&self) -> usize {
        self.read().cursor
    }

    pub fn start(&self) -> usize {
        self.read().start
    }

    pub fn size(&self) -> usize {
        self.read().size
    }
}
