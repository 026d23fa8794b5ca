//! Cursor and viewport movement.
//!
//! Every operation leaves `0 <= start <= cursor < max(1, len)` and
//! `cursor < start + size`.

use super::model::State;
use super::types::Item;
use super::List;

impl<I> State<I> {
    pub fn next(&mut self) {
        if self.cursor + 1 < self.len() {
            self.cursor += 1;
        }
        if self.cursor >= self.start + self.size {
            self.start = self.cursor + 1 - self.size;
        }
        self.clamp();
    }

    pub fn prev(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        if self.cursor < self.start {
            self.start = self.cursor;
        }
        self.clamp();
    }

    pub fn page_down(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + self.size).min(len - 1);
        self.start = len.saturating_sub(self.size).min(self.start + self.size);
        self.clamp();
    }

    pub fn page_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(self.size);
        self.start = self.start.saturating_sub(self.size);
        self.clamp();
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
        self.clamp();
    }

    pub fn set_start(&mut self, start: usize) {
        self.start = start.min(self.cursor);
        self.clamp();
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size.max(1);
        self.clamp();
    }

    /// Pulls cursor and start back into range after any mutation, moving
    /// the viewport as little as possible.
    pub fn clamp(&mut self) {
        let len = self.len();
        if len == 0 {
            self.cursor = 0;
            self.start = 0;
            return;
        }
        self.cursor = self.cursor.min(len - 1);
        if self.start > self.cursor {
            self.start = self.cursor;
        }
        if self.cursor >= self.start + self.size {
            self.start = self.cursor + 1 - self.size;
        }
    }
}

impl<I: Item> List<I> {
    /// Moves the cursor down one row, scrolling the window when the cursor
    /// would leave it. Does nothing on the last row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gitscope::list::List;
    ///
    /// let mut list: List<String> = List::new((0..5).map(|i| i.to_string()).collect(), 2);
    /// list.next();
    /// list.next();
    /// assert_eq!(list.cursor(), 2);
    /// assert_eq!(list.start(), 1);
    /// ```
    pub fn next(&mut self) {
        self.write().next();
    }

    /// Moves the cursor up one row, scrolling the window when the cursor
    /// would leave it. Does nothing on the first row.
    pub fn prev(&mut self) {
        self.write().prev();
    }

    /// Moves cursor and window down by one window height.
    ///
    /// The window never scrolls past the point where the last item sits on
    /// the bottom row, and the cursor stops at the last item.
    pub fn page_down(&mut self) {
        self.write().page_down();
    }

    /// Moves cursor and window up by one window height, stopping at the
    /// top.
    pub fn page_up(&mut self) {
        self.write().page_up();
    }

    /// Puts the cursor on scope position `cursor`.
    ///
    /// # Arguments
    ///
    /// * `cursor` - Position in the scope. Values past the end select the
    ///   last item; the window follows the cursor.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.write().set_cursor(cursor);
    }

    /// Scrolls the window so it begins at `start`, never past the cursor.
    pub fn set_start(&mut self, start: usize) {
        self.write().set_start(start);
    }

    /// Jumps to the first item.
    pub fn home(&mut self) {
        self.set_cursor(0);
    }

    /// Jumps to the last item in scope.
    pub fn end(&mut self) {
        let mut st = self.write();
        let last = st.len().saturating_sub(1);
        st.set_cursor(last);
    }

    /// Resizes the window, e.g. after the terminal changed size.
    ///
    /// # Arguments
    ///
    /// * `size` - Rows in the window; zero is treated as one.
    pub fn set_size(&mut self, size: usize) {
        self.write().set_size(size);
    }

    /// Whether rows exist above the window.
    pub fn can_page_up(&self) -> bool {
        self.read().start > 0
    }

    /// Whether rows exist below the window.
    pub fn can_page_down(&self) -> bool {
        let st = self.read();
        st.start + st.size < st.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(len: usize, size: usize) -> State<usize> {
        State::new((0..len).collect(), size)
    }

    fn assert_invariants(st: &State<usize>) {
        let len = st.len();
        assert!(st.start <= st.cursor, "start {} > cursor {}", st.start, st.cursor);
        assert!(st.cursor < len.max(1), "cursor {} out of {}", st.cursor, len);
        assert!(st.cursor < st.start + st.size);
    }

    #[test]
    fn test_next_scrolls_window() {
        let mut st = state(20, 5);
        for _ in 0..7 {
            st.next();
        }
        assert_eq!(st.cursor, 7);
        assert_eq!(st.start, 3);
    }

    #[test]
    fn test_next_stops_at_end() {
        let mut st = state(3, 5);
        for _ in 0..10 {
            st.next();
        }
        assert_eq!(st.cursor, 2);
    }

    #[test]
    fn test_prev_scrolls_back() {
        let mut st = state(20, 5);
        st.set_cursor(10);
        assert_eq!(st.start, 6);
        for _ in 0..5 {
            st.prev();
        }
        assert_eq!(st.cursor, 5);
        assert_eq!(st.start, 5);
    }

    #[test]
    fn test_page_down_and_up() {
        let mut st = state(25, 10);
        st.set_cursor(3);
        st.page_down();
        assert_eq!((st.cursor, st.start), (13, 10));
        st.page_down();
        assert_eq!((st.cursor, st.start), (23, 15));
        st.page_down();
        assert_eq!((st.cursor, st.start), (24, 15));
        st.page_up();
        assert_eq!((st.cursor, st.start), (14, 5));
        st.page_up();
        assert_eq!((st.cursor, st.start), (4, 0));
    }

    #[test]
    fn test_set_start_is_clamped_to_cursor() {
        let mut st = state(20, 5);
        st.set_cursor(8);
        st.set_start(15);
        assert_eq!(st.start, 8);
        st.set_start(0);
        // cursor must stay inside the window
        assert_eq!(st.start, 4);
    }

    #[test]
    fn test_empty_scope() {
        let mut st = state(0, 5);
        st.next();
        st.page_down();
        st.prev();
        st.page_up();
        assert_eq!((st.cursor, st.start), (0, 0));
    }

    #[test]
    fn test_invariants_hold_for_operation_sequences() {
        // deterministic pseudo-random walk over all navigation operations
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut rand = move |n: u64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed % n
        };
        for len in [0usize, 1, 2, 7, 31] {
            for size in [1usize, 3, 10] {
                let mut st = state(len, size);
                for _ in 0..500 {
                    match rand(8) {
                        0 => st.next(),
                        1 => st.prev(),
                        2 => st.page_down(),
                        3 => st.page_up(),
                        4 => st.set_cursor(rand(40) as usize),
                        5 => st.set_start(rand(40) as usize),
                        6 => st.set_size(1 + rand(12) as usize),
                        _ => {
                            let keep = rand(len as u64 + 1) as usize;
                            st.scope.truncate(keep);
                            st.clamp();
                        }
                    }
                    assert_invariants(&st);
                }
            }
        }
    }

    #[test]
    fn test_can_page() {
        let mut list: List<String> = List::new((0..25).map(|i| i.to_string()).collect(), 10);
        assert!(!list.can_page_up());
        assert!(list.can_page_down());
        list.end();
        assert!(list.can_page_up());
        assert!(!list.can_page_down());
    }
}
