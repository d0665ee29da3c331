#![forbid(unsafe_code)]

//! Selection math over the flattened result list.
//!
//! The controller only knows the row count, so grouped and flat catalogs go
//! through exactly the same code once they are flattened with
//! [`FlatIndexMap`](crate::action::FlatIndexMap).
//!
//! Up/down wrap around; paging and home/end clamp. Every method returns the
//! new selection, or `None` when there is nothing to move to (empty list).
//! An index at or past the end, which can only come from a stale
//! `set_selected_index`, is treated as the last row.

use crate::action::FlatIndexMap;

/// Stateless navigation over `len` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationController {
    len: usize,
}

impl NavigationController {
    /// Controller for a list of `len` rows.
    pub const fn new(len: usize) -> Self {
        Self { len }
    }

    /// Controller for a flattened list.
    pub fn for_list(flat: &FlatIndexMap) -> Self {
        Self::new(flat.len())
    }

    /// Row count.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there is nothing to navigate.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Next row, wrapping from the last row (or no selection) to the first.
    pub fn down(&self, selected: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        match selected {
            Some(i) if i < self.len - 1 => Some(i + 1),
            _ => Some(0),
        }
    }

    /// Previous row, wrapping from the first row (or no selection) to the last.
    pub fn up(&self, selected: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let last = self.len - 1;
        match selected {
            None | Some(0) => Some(last),
            Some(i) => Some(i.min(self.len) - 1),
        }
    }

    /// First row.
    pub fn first(&self) -> Option<usize> {
        (!self.is_empty()).then_some(0)
    }

    /// Last row.
    pub fn last(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    /// Move `page` rows down, stopping at the last row.
    pub fn page_down(&self, selected: Option<usize>, page: usize) -> Option<usize> {
        let last = self.last()?;
        Some(match selected {
            None => page.saturating_sub(1).min(last),
            Some(i) => i.saturating_add(page).min(last),
        })
    }

    /// Move `page` rows up, stopping at the first row.
    pub fn page_up(&self, selected: Option<usize>, page: usize) -> Option<usize> {
        let last = self.last()?;
        Some(match selected {
            None => 0,
            Some(i) => i.min(last).saturating_sub(page),
        })
    }

    /// Row that activation applies to.
    ///
    /// No selection means the first row. A stale index past the end yields
    /// `None` so nothing unexpected gets activated.
    pub fn current(&self, selected: Option<usize>) -> Option<usize> {
        match selected {
            None => self.first(),
            Some(i) if i < self.len => Some(i),
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_cycles_from_none() {
        let nav = NavigationController::new(3);
        let mut sel = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            sel = nav.down(sel);
            seen.push(sel.unwrap());
        }
        assert_eq!(seen, [0, 1, 2, 0]);
    }

    #[test]
    fn up_cycles_in_reverse() {
        let nav = NavigationController::new(3);
        let mut sel = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            sel = nav.up(sel);
            seen.push(sel.unwrap());
        }
        assert_eq!(seen, [2, 1, 0, 2]);
    }

    #[test]
    fn empty_list_is_noop() {
        let nav = NavigationController::new(0);
        assert_eq!(nav.down(None), None);
        assert_eq!(nav.up(Some(2)), None);
        assert_eq!(nav.first(), None);
        assert_eq!(nav.last(), None);
        assert_eq!(nav.page_down(None, 5), None);
        assert_eq!(nav.page_up(Some(1), 5), None);
        assert_eq!(nav.current(None), None);
    }

    #[test]
    fn stale_index_is_clamped() {
        let nav = NavigationController::new(3);
        assert_eq!(nav.down(Some(9)), Some(0));
        assert_eq!(nav.up(Some(9)), Some(2));
        assert_eq!(nav.current(Some(9)), None);
        assert_eq!(nav.down(Some(usize::MAX)), Some(0));
        assert_eq!(nav.up(Some(usize::MAX)), Some(2));
        assert_eq!(nav.page_down(Some(usize::MAX), 6), Some(2));
        assert_eq!(nav.page_up(Some(usize::MAX), 6), Some(0));
        assert_eq!(nav.current(Some(usize::MAX)), None);
    }

    #[test]
    fn current_defaults_to_first() {
        let nav = NavigationController::new(2);
        assert_eq!(nav.current(None), Some(0));
        assert_eq!(nav.current(Some(1)), Some(1));
    }

    #[test]
    fn paging_clamps() {
        let nav = NavigationController::new(20);
        assert_eq!(nav.page_down(None, 10), Some(9));
        assert_eq!(nav.page_down(Some(15), 10), Some(19));
        assert_eq!(nav.page_up(Some(15), 10), Some(5));
        assert_eq!(nav.page_up(Some(3), 10), Some(0));
        assert_eq!(nav.page_up(None, 10), Some(0));
        assert_eq!(nav.first(), Some(0));
        assert_eq!(nav.last(), Some(19));
    }

    #[test]
    fn single_row_wraps_to_itself() {
        let nav = NavigationController::new(1);
        assert_eq!(nav.down(Some(0)), Some(0));
        assert_eq!(nav.up(Some(0)), Some(0));
    }
}
