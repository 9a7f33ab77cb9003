//! Randomized non-repeating visiting order over the session URL list.
//!
//! Every non-blank URL is visited exactly once per round, in a uniformly
//! random order. A fresh permutation is drawn only at round boundaries, so
//! the order never changes mid-round; rows whose URL is blank are excluded
//! entirely.

use rand::seq::SliceRandom;
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct QueueItem {
    row: usize,
    url: String,
}

#[derive(Debug, Default)]
pub struct ShuffleQueue {
    items: Vec<QueueItem>,
    /// Permutation of `items` indices, non-blank URLs only.
    order: Vec<usize>,
    /// Slot in `order` of the most recently visited item; `None` before the
    /// first advance of a round.
    position: Option<usize>,
    /// Rows visited this round (display bookkeeping).
    opened: HashSet<usize>,
    /// Set when `items` changed since the order was built.
    stale: bool,
}

impl ShuffleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row and return its index. Blank URLs still occupy a row
    /// (they are session slots) but never enter the visiting order.
    pub fn push(&mut self, url: impl Into<String>) -> usize {
        let row = self.items.len();
        self.items.push(QueueItem { row, url: url.into() });
        self.stale = true;
        row
    }

    /// Replace a row's URL in place.
    pub fn set_url(&mut self, row: usize, url: impl Into<String>) {
        if let Some(item) = self.items.get_mut(row) {
            item.url = url.into();
            self.stale = true;
        }
    }

    /// Number of rows, including blank ones.
    pub fn rows(&self) -> usize {
        self.items.len()
    }

    /// Number of playable (non-blank) URLs.
    pub fn eligible(&self) -> usize {
        self.items.iter().filter(|i| !i.url.trim().is_empty()).count()
    }

    pub fn is_opened(&self, row: usize) -> bool {
        self.opened.contains(&row)
    }

    /// 1-based position within the current round and the round length.
    pub fn progress(&self) -> (usize, usize) {
        (self.position.map(|p| p + 1).unwrap_or(0), self.order.len())
    }

    /// Draw a fresh permutation over the eligible rows and restart the
    /// round.
    pub fn rebuild(&mut self) {
        self.order = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.url.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        self.order.shuffle(&mut rand::rng());
        self.position = None;
        self.opened.clear();
        self.stale = false;
    }

    /// Step to the next URL in the visiting order, reshuffling exactly at
    /// round boundaries. Returns the row and URL, or `None` when no
    /// eligible URL exists.
    pub fn advance(&mut self) -> Option<(usize, String)> {
        if self.stale || self.order.is_empty() {
            self.rebuild();
        }
        if self.order.is_empty() {
            return None;
        }

        let slot = match self.position {
            Some(p) if p + 1 >= self.order.len() => {
                self.rebuild();
                0
            }
            Some(p) => p + 1,
            None => 0,
        };

        self.position = Some(slot);
        let item = &self.items[self.order[slot]];
        self.opened.insert(item.row);
        Some((item.row, item.url.clone()))
    }

    /// Continue the round from a manually opened row: if the row is in the
    /// current order, move the position to its slot so the next `advance`
    /// picks up after it. Rows outside the order leave the position alone.
    pub fn align_to(&mut self, row: usize) {
        if self.stale || self.order.is_empty() {
            self.rebuild();
        }
        if let Some(slot) =
            self.order.iter().position(|&i| self.items[i].row == row)
        {
            self.position = Some(slot);
            self.opened.insert(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn queue_of(urls: &[&str]) -> ShuffleQueue {
        let mut q = ShuffleQueue::new();
        for url in urls {
            q.push(*url);
        }
        q
    }

    #[test]
    fn test_round_visits_each_url_exactly_once() {
        let urls = ["a", "b", "c", "d", "e"];
        let mut q = queue_of(&urls);

        let mut seen = HashSet::new();
        for _ in 0..urls.len() {
            let (_, url) = q.advance().unwrap();
            assert!(seen.insert(url), "duplicate within a round");
        }
        assert_eq!(seen.len(), urls.len());
    }

    #[test]
    fn test_round_boundary_reshuffles_and_loops() {
        let mut q = queue_of(&["a", "b", "c"]);
        for _ in 0..3 {
            q.advance().unwrap();
        }

        // The fourth advance starts a new round; it must still yield one of
        // the three URLs and restart the coverage guarantee.
        let (_, url) = q.advance().unwrap();
        assert!(["a", "b", "c"].contains(&url.as_str()));
        assert_eq!(q.progress().0, 1);

        let mut seen = HashSet::new();
        seen.insert(url);
        for _ in 0..2 {
            seen.insert(q.advance().unwrap().1);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_empty_queue_yields_none_forever() {
        let mut q = ShuffleQueue::new();
        assert!(q.advance().is_none());
        assert!(q.advance().is_none());

        // Blank rows are session slots, not playable items.
        q.push("");
        q.push("   ");
        assert!(q.advance().is_none());
        assert_eq!(q.eligible(), 0);
        assert_eq!(q.rows(), 2);
    }

    #[test]
    fn test_blank_rows_are_skipped_but_keep_indices() {
        let mut q = queue_of(&["a", "", "c"]);

        let mut rows = HashSet::new();
        for _ in 0..2 {
            let (row, url) = q.advance().unwrap();
            assert!(!url.is_empty());
            rows.insert(row);
        }
        assert_eq!(rows, HashSet::from([0, 2]));
    }

    #[test]
    fn test_list_change_triggers_rebuild() {
        let mut q = queue_of(&["a", "b"]);
        q.advance().unwrap();

        let row = q.push("c");
        assert_eq!(row, 2);

        // The next advance rebuilds over all three and restarts the round.
        let mut seen = HashSet::new();
        for _ in 0..3 {
            seen.insert(q.advance().unwrap().1);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_align_to_continues_round_from_row() {
        let mut q = queue_of(&["a", "b", "c"]);
        q.rebuild();

        q.align_to(1);
        assert!(q.is_opened(1));
        assert!(q.progress().0 >= 1);

        // Advancing a full round minus one from here never revisits row 1.
        let remaining = q.progress().1 - q.progress().0;
        for _ in 0..remaining {
            let (row, _) = q.advance().unwrap();
            assert_ne!(row, 1);
        }
    }

    #[test]
    fn test_align_to_unknown_row_leaves_position() {
        let mut q = queue_of(&["a", "", "c"]);
        q.advance().unwrap();
        let before = q.progress();

        // Row 1 is blank, so it is not in the order.
        q.align_to(1);
        assert_eq!(q.progress(), before);

        q.align_to(99);
        assert_eq!(q.progress(), before);
    }

    #[test]
    fn test_set_url_marks_stale() {
        let mut q = queue_of(&["a", "b"]);
        q.advance().unwrap();

        q.set_url(0, "z");
        let mut seen = HashSet::new();
        for _ in 0..2 {
            seen.insert(q.advance().unwrap().1);
        }
        assert_eq!(seen, HashSet::from(["z".to_string(), "b".to_string()]));
    }
}
