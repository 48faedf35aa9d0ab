//! Message selection that survives page and view changes.
//!
//! The selected set is global; page-level operations only ever look at the
//! ids of the page currently shown.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::types::MessageId;

/// Selection indicator for a page's "select all" checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    Empty,
    Full,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<MessageId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a single id; returns whether it is now selected
    pub fn toggle(&mut self, id: MessageId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// "Select all" for the page: selects every page id when none of them is
    /// selected, otherwise deselects exactly the page ids
    pub fn toggle_page(&mut self, page_ids: &[MessageId]) {
        if self.selected_on_page(page_ids).is_empty() {
            self.selected.extend(page_ids.iter().copied());
        } else {
            for id in page_ids {
                self.selected.remove(id);
            }
        }
    }

    /// Drop ids that are no longer in the collection
    pub fn prune<I>(&mut self, existing: I) -> usize
    where
        I: IntoIterator<Item = MessageId>,
    {
        let existing: HashSet<MessageId> = existing.into_iter().collect();
        let before = self.selected.len();
        self.selected.retain(|id| existing.contains(id));
        before - self.selected.len()
    }

    /// Selected ids among `page_ids`, in page order
    pub fn selected_on_page(&self, page_ids: &[MessageId]) -> Vec<MessageId> {
        page_ids
            .iter()
            .copied()
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    pub fn page_state(&self, page_ids: &[MessageId]) -> SelectionState {
        let selected = self.selected_on_page(page_ids).len();
        if selected == 0 {
            SelectionState::Empty
        } else if selected == page_ids.len() {
            SelectionState::Full
        } else {
            SelectionState::Mixed
        }
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.selected.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_single() {
        let mut selection = Selection::new();
        assert!(selection.toggle(4));
        assert!(selection.contains(4));
        assert!(!selection.toggle(4));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_across_pages() {
        let page_one: Vec<MessageId> = (1..=20).collect();
        let page_two: Vec<MessageId> = (21..=25).collect();
        let mut selection = Selection::new();

        selection.toggle_page(&page_one);
        assert_eq!(selection.page_state(&page_one), SelectionState::Full);
        assert_eq!(selection.page_state(&page_two), SelectionState::Empty);

        selection.toggle_page(&page_two);
        assert_eq!(selection.ids(), (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_partial_page_toggle_clears_page_only() {
        let page: Vec<MessageId> = vec![1, 2, 3];
        let mut selection = Selection::new();
        selection.toggle(2);
        selection.toggle(40);
        assert_eq!(selection.page_state(&page), SelectionState::Mixed);

        selection.toggle_page(&page);
        assert_eq!(selection.page_state(&page), SelectionState::Empty);
        assert_eq!(selection.ids(), vec![40]);
    }

    #[test]
    fn test_prune_drops_vanished_ids() {
        let mut selection = Selection::new();
        for id in [1, 2, 3] {
            selection.toggle(id);
        }
        assert_eq!(selection.prune([1, 3, 9]), 1);
        assert_eq!(selection.ids(), vec![1, 3]);
    }

    #[test]
    fn test_empty_page_reports_empty() {
        let selection = Selection::new();
        assert_eq!(selection.page_state(&[]), SelectionState::Empty);
        assert!(selection.selected_on_page(&[]).is_empty());
    }
}
