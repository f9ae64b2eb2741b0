//! Query coordination with stale-response guarding
//!
//! Every refresh takes a snapshot of the filter and stamps it with a sequence
//! number. Items and count responses are applied only while that snapshot is
//! still the latest one; anything older is dropped on arrival.

use tracing::{debug, info, warn};

use crate::error::{ListError, Result};
use crate::model::{page_count, Entry, Filter, Page, Row};

/// Filter snapshot shared by the items and count fetches of one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub seq: u64,
    pub filter: Filter,
}

/// What happened to an items response
#[derive(Debug, Clone, PartialEq)]
pub enum ItemsOutcome {
    /// Page replaced. `fresh` is true when the filter differs from the
    /// previously applied page (or there was none).
    Applied { fresh: bool },
    /// Superseded by a newer refresh, ignored
    Stale,
    /// Fetch failed, previous page kept
    Failed(ListError),
}

/// What happened to a count response
#[derive(Debug, Clone, PartialEq)]
pub enum CountOutcome {
    Applied,
    Stale,
    Failed(ListError),
}

/// Owns the filter, the current page and the total count
#[derive(Debug, Clone)]
pub struct QueryCoordinator<R, D> {
    filter: Filter,
    seq: u64,
    page: Option<Page<R, D>>,
    count: Option<u64>,
}

impl<R: Row, D> QueryCoordinator<R, D> {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            seq: 0,
            page: None,
            count: None,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn page(&self) -> Option<&Page<R, D>> {
        self.page.as_ref()
    }

    pub fn entries(&self) -> &[Entry<R, D>] {
        self.page.as_ref().map(|p| p.entries.as_slice()).unwrap_or(&[])
    }

    /// Total matching rows, unset until a count fetch succeeded
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    pub fn page_count(&self) -> usize {
        self.count
            .map(|c| page_count(c, self.filter.limit))
            .unwrap_or(0)
    }

    pub fn has_next_page(&self) -> bool {
        self.filter.page_index() + 1 < self.page_count()
    }

    pub fn has_previous_page(&self) -> bool {
        self.filter.offset > 0
    }

    /// Apply a released filter text. Returns true if the filter changed.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.filter.set_text(text)
    }

    /// Move to a page. Returns true if the offset changed.
    pub fn go_to_page(&mut self, index: usize) -> Result<bool> {
        let before = self.filter.offset;
        self.filter.go_to_page(index)?;
        Ok(before != self.filter.offset)
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        // Bounded by the page count, so the offset always fits
        self.go_to_page(self.filter.page_index() + 1)
            .unwrap_or(false)
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous_page() {
            return false;
        }
        self.go_to_page(self.filter.page_index() - 1)
            .unwrap_or(false)
    }

    /// Change the page size. Returns true if the filter changed.
    pub fn set_page_size(&mut self, size: usize) -> Result<bool> {
        let before = self.filter.clone();
        self.filter.set_page_size(size)?;
        Ok(before != self.filter)
    }

    /// Take a snapshot for a new refresh, superseding all earlier ones
    pub fn begin_refresh(&mut self) -> QueryTicket {
        self.seq += 1;
        debug!(seq = self.seq, filter = ?self.filter, "refresh started");
        QueryTicket {
            seq: self.seq,
            filter: self.filter.clone(),
        }
    }

    /// True while `ticket` is the latest snapshot of the current filter
    pub fn is_current(&self, ticket: &QueryTicket) -> bool {
        ticket.seq == self.seq && ticket.filter == self.filter
    }

    pub fn apply_items(&mut self, ticket: &QueryTicket, result: Result<Vec<R>>) -> ItemsOutcome {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.seq, "discarding stale items response");
            return ItemsOutcome::Stale;
        }

        let mut rows = match result {
            Ok(rows) => rows,
            Err(err) => {
                warn!(seq = ticket.seq, error = %err, "items fetch failed");
                return ItemsOutcome::Failed(err);
            }
        };

        if rows.len() > ticket.filter.limit {
            warn!(
                received = rows.len(),
                limit = ticket.filter.limit,
                "gateway returned more rows than requested, truncating"
            );
            rows.truncate(ticket.filter.limit);
        }

        let fresh = self
            .page
            .as_ref()
            .map(|p| p.filter != ticket.filter)
            .unwrap_or(true);

        info!(seq = ticket.seq, rows = rows.len(), fresh, "page applied");
        self.page = Some(Page {
            filter: ticket.filter.clone(),
            entries: rows.into_iter().map(Entry::new).collect(),
        });
        ItemsOutcome::Applied { fresh }
    }

    pub fn apply_count(&mut self, ticket: &QueryTicket, result: Result<u64>) -> CountOutcome {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.seq, "discarding stale count response");
            return CountOutcome::Stale;
        }

        match result {
            Ok(count) => {
                self.count = Some(count);
                CountOutcome::Applied
            }
            Err(err) => {
                warn!(seq = ticket.seq, error = %err, "count fetch failed");
                CountOutcome::Failed(err)
            }
        }
    }

    /// Attach a fetched detail to the row it belongs to.
    /// Returns false if the row is no longer on the current page.
    pub fn merge_detail(&mut self, id: &str, detail: D) -> bool {
        match self.page.as_mut().and_then(|p| p.find_mut(id)) {
            Some(entry) => {
                entry.detail = Some(detail);
                true
            }
            None => false,
        }
    }

    /// Mutable access to a cached detail
    pub fn detail_mut(&mut self, id: &str) -> Option<&mut D> {
        self.page
            .as_mut()
            .and_then(|p| p.find_mut(id))
            .and_then(|e| e.detail.as_mut())
    }
}
