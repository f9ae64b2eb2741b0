//! Expanded-row tracking
//!
//! Rows move through `Collapsed → Expanding → Expanded → Collapsed`.
//! Membership is keyed by row identifier so it survives page replacement.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Entry, Page, Row};

/// Per-row expansion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Collapsed,
    /// Selected, detail fetch in flight
    Expanding,
    Expanded,
}

/// Result of toggling a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    Collapsed,
    /// Detail was already cached on the row
    Expanded,
    /// Caller must fetch the detail for this row id
    FetchDetail(String),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    rows: HashMap<String, RowState>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &str) -> RowState {
        self.rows.get(id).copied().unwrap_or(RowState::Collapsed)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Selected identifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rows.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn toggle<R: Row, D>(&mut self, entry: &Entry<R, D>) -> Toggle {
        let id = entry.id();
        if self.rows.remove(id).is_some() {
            debug!(row = id, "collapsed");
            return Toggle::Collapsed;
        }

        if entry.detail.is_some() {
            self.rows.insert(id.to_string(), RowState::Expanded);
            return Toggle::Expanded;
        }

        self.rows.insert(id.to_string(), RowState::Expanding);
        debug!(row = id, "expanding");
        Toggle::FetchDetail(id.to_string())
    }

    /// A detail fetch for `id` finished. Returns false if the row is no
    /// longer waiting for it (collapsed or refreshed away meanwhile).
    pub fn detail_resolved(&mut self, id: &str) -> bool {
        match self.rows.get_mut(id) {
            Some(state) if *state == RowState::Expanding => {
                *state = RowState::Expanded;
                true
            }
            _ => {
                debug!(row = id, "discarding detail for row not awaiting it");
                false
            }
        }
    }

    /// Bring the selection in line with a newly applied page.
    ///
    /// A fresh filter clears the selection and auto-expands a lone result.
    /// A same-filter refresh keeps rows that are still present. Applied pages
    /// never carry details over, so every surviving row goes back to
    /// `Expanding`; the returned ids need their detail fetched.
    pub fn reconcile<R: Row, D>(&mut self, page: &Page<R, D>, fresh: bool) -> Vec<String> {
        if fresh {
            self.rows.clear();
            if let [only] = page.entries.as_slice() {
                debug!(row = only.id(), "auto-expanding single result");
                self.rows.insert(only.id().to_string(), RowState::Expanding);
            }
        } else {
            self.rows.retain(|id, _| page.contains(id));
        }

        let mut pending = Vec::with_capacity(self.rows.len());
        for (id, state) in self.rows.iter_mut() {
            let cached = page.find(id).map(|e| e.detail.is_some()).unwrap_or(false);
            *state = if cached {
                RowState::Expanded
            } else {
                pending.push(id.clone());
                RowState::Expanding
            };
        }
        pending.sort();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Filter, User};

    fn page(names: &[&str]) -> Page<User, Vec<String>> {
        Page {
            filter: Filter::default(),
            entries: names
                .iter()
                .map(|n| {
                    Entry::new(User {
                        username: n.to_string(),
                    })
                })
                .collect(),
        }
    }

    #[test]
    fn test_toggle_state_machine() {
        let page = page(&["alice"]);
        let mut selection = SelectionTracker::new();

        assert_eq!(
            selection.toggle(&page.entries[0]),
            Toggle::FetchDetail("alice".into())
        );
        assert_eq!(selection.state("alice"), RowState::Expanding);

        assert!(selection.detail_resolved("alice"));
        assert_eq!(selection.state("alice"), RowState::Expanded);

        assert_eq!(selection.toggle(&page.entries[0]), Toggle::Collapsed);
        assert_eq!(selection.state("alice"), RowState::Collapsed);
    }

    #[test]
    fn test_cached_detail_skips_expanding() {
        let mut page = page(&["alice"]);
        page.entries[0].detail = Some(vec!["admin".into()]);
        let mut selection = SelectionTracker::new();

        assert_eq!(selection.toggle(&page.entries[0]), Toggle::Expanded);
        assert_eq!(selection.state("alice"), RowState::Expanded);
    }

    #[test]
    fn test_late_detail_after_collapse_discarded() {
        let page = page(&["alice"]);
        let mut selection = SelectionTracker::new();
        selection.toggle(&page.entries[0]);
        selection.toggle(&page.entries[0]);

        assert!(!selection.detail_resolved("alice"));
        assert!(!selection.is_selected("alice"));
    }

    #[test]
    fn test_fresh_single_result_auto_expands() {
        let mut selection = SelectionTracker::new();
        let pending = selection.reconcile(&page(&["ann"]), true);
        assert_eq!(pending, vec!["ann"]);
        assert_eq!(selection.ids(), vec!["ann"]);
    }

    #[test]
    fn test_fresh_filter_clears_selection() {
        let mut selection = SelectionTracker::new();
        let first = page(&["alice", "bob"]);
        selection.toggle(&first.entries[0]);

        let pending = selection.reconcile(&page(&["alice", "carol"]), true);
        assert!(pending.is_empty());
        assert!(selection.is_empty());
    }

    #[test]
    fn test_same_filter_refresh_keeps_surviving_rows() {
        let mut selection = SelectionTracker::new();
        let first = page(&["alice", "bob", "carol"]);
        selection.toggle(&first.entries[0]);
        selection.toggle(&first.entries[1]);
        selection.detail_resolved("alice");

        let pending = selection.reconcile(&page(&["alice", "carol"]), false);
        assert_eq!(pending, vec!["alice"]);
        assert_eq!(selection.ids(), vec!["alice"]);
        assert_eq!(selection.state("alice"), RowState::Expanding);
        assert_eq!(selection.state("bob"), RowState::Collapsed);
    }

    #[test]
    fn test_same_filter_single_row_not_auto_expanded() {
        let mut selection = SelectionTracker::new();
        let pending = selection.reconcile(&page(&["ann"]), false);
        assert!(pending.is_empty());
        assert!(selection.is_empty());
    }
}
