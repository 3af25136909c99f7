use std::collections::BTreeMap;

use tracing::debug;

use crate::select::types::ResultPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Page became part of the list (plus any parked pages it unblocked).
    Applied,
    /// Arrived ahead of the cursor; held until the gap is filled.
    Parked,
    /// Offset is behind the cursor; dropped.
    Stale,
}

/// Единственный писатель списка результатов. Курсор == длина списка.
#[derive(Debug, Clone)]
pub struct ResultList<T> {
    items: Vec<T>,
    total: usize,
    has_more: bool,
    parked: BTreeMap<usize, ResultPage<T>>,
}

impl<T> Default for ResultList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: true,
            parked: BTreeMap::new(),
        }
    }
}

impl<T> ResultList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Next offset to request.
    pub fn cursor(&self) -> usize {
        self.items.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// `append == false` replaces the list with the page (first page of a query);
    /// otherwise the page is appended if it starts exactly at the cursor.
    pub fn apply(&mut self, page: ResultPage<T>, append: bool) -> Applied {
        if append {
            let cursor = self.cursor();
            if page.offset > cursor {
                self.parked.insert(page.offset, page);
                return Applied::Parked;
            }
            if page.offset < cursor {
                return Applied::Stale;
            }
        } else {
            self.items.clear();
            self.parked.retain(|&offset, _| offset > 0);
        }
        self.push_page(page);

        while let Some(entry) = self.parked.first_entry() {
            let offset = *entry.key();
            if offset > self.items.len() {
                break;
            }
            let next = entry.remove();
            if offset == self.items.len() {
                self.push_page(next);
            }
        }
        Applied::Applied
    }

    fn push_page(&mut self, page: ResultPage<T>) {
        let ResultPage {
            mut items, total, ..
        } = page;
        let got_items = !items.is_empty();
        // длина списка никогда не превышает заявленный total
        let room = total.saturating_sub(self.items.len());
        items.truncate(room);
        self.items.extend(items);
        self.total = total;
        self.has_more = got_items && self.cursor() < total;
        if !got_items && self.cursor() < total {
            debug!(
                cursor = self.cursor(),
                total,
                "empty page before the reported total, pagination stopped"
            );
        }
    }

    /// A failed fetch: keep what we have, stop paginating.
    pub fn fail(&mut self, keep_items: bool) {
        if !keep_items {
            self.items.clear();
            self.total = 0;
        }
        self.has_more = false;
        self.parked.clear();
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.total = 0;
        self.has_more = true;
        self.parked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(range: std::ops::Range<usize>, total: usize) -> ResultPage<usize> {
        ResultPage::new(range.clone().collect(), total, range.start)
    }

    #[test]
    fn cursor_is_sum_of_applied_pages() {
        let mut list = ResultList::new();
        assert_eq!(list.apply(page(0..10, 23), false), Applied::Applied);
        assert_eq!((list.cursor(), list.has_more()), (10, true));
        list.apply(page(10..20, 23), true);
        assert_eq!((list.cursor(), list.has_more()), (20, true));
        list.apply(page(20..23, 23), true);
        assert_eq!((list.cursor(), list.has_more()), (23, false));
        assert_eq!(list.items(), (0..23).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn overlapping_items_are_not_filtered() {
        let mut list = ResultList::new();
        list.apply(ResultPage::new(vec![1, 2, 3], 6, 0), false);
        list.apply(ResultPage::new(vec![3, 4, 5], 6, 3), true);
        assert_eq!(list.items(), &[1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn early_page_waits_for_its_predecessor() {
        let mut list = ResultList::new();
        assert_eq!(list.apply(page(10..20, 25), true), Applied::Parked);
        assert!(list.is_empty());
        assert_eq!(list.apply(page(0..10, 25), false), Applied::Applied);
        assert_eq!(list.items(), (0..20).collect::<Vec<_>>().as_slice());
        assert!(list.has_more());
    }

    #[test]
    fn page_behind_cursor_is_stale() {
        let mut list = ResultList::new();
        list.apply(page(0..10, 30), false);
        list.apply(page(10..20, 30), true);
        assert_eq!(list.apply(page(10..20, 30), true), Applied::Stale);
        assert_eq!(list.len(), 20);
    }

    #[test]
    fn never_exceeds_total() {
        let mut list = ResultList::new();
        list.apply(page(0..10, 4), false);
        assert_eq!(list.len(), 4);
        assert!(!list.has_more());
    }

    #[test]
    fn empty_append_stops_pagination() {
        let mut list = ResultList::new();
        list.apply(page(0..10, 50), false);
        list.apply(ResultPage::new(vec![], 50, 10), true);
        assert!(!list.has_more());
    }

    #[test]
    fn failure_keeps_or_drops_items() {
        let mut list = ResultList::new();
        list.apply(page(0..10, 50), false);
        list.fail(true);
        assert_eq!((list.len(), list.has_more()), (10, false));
        list.fail(false);
        assert!(list.is_empty());
        list.reset();
        assert!(list.has_more());
    }
}
