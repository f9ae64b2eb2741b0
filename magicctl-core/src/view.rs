//! Filtered remote list driver
//!
//! `ListView` owns one filter input, query coordinator and selection tracker
//! plus a gateway handle. Gateway calls run as spawned tasks and post their
//! completion back over a channel; the owner applies them one at a time via
//! [`ListView::next_update`], so view state is only ever touched from the
//! owning task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::config::ListConfig;
use crate::error::{ListError, Result};
use crate::filter::{FilterInput, DEFAULT_DEBOUNCE};
use crate::gateway::RemoteGateway;
use crate::model::{Entry, Filter, DEFAULT_PAGE_SIZE};
use crate::notice::{Notice, Notices};
use crate::query::{CountOutcome, ItemsOutcome, QueryCoordinator, QueryTicket};
use crate::selection::{RowState, SelectionTracker, Toggle};

/// How a confirmation or editor dialog was closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome<T> {
    Committed(T),
    Cancelled,
}

/// What an editor dialog did with the row it was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: usize,
    pub debounce: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl From<&ListConfig> for ListSettings {
    fn from(config: &ListConfig) -> Self {
        Self {
            page_size: config.page_size,
            debounce: config.debounce(),
        }
    }
}

/// What processing one event changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Debounced filter text released and a refresh issued
    Filter,
    /// Debounce window elapsed on an unchanged value
    FilterUnchanged,
    Items,
    Count,
    Detail,
    Removed,
    /// A failed request, reported as a notice
    Failed,
    /// A superseded response, ignored
    Stale,
}

enum Completion<R, D> {
    Items {
        ticket: QueryTicket,
        result: Result<Vec<R>>,
    },
    Count {
        ticket: QueryTicket,
        result: Result<u64>,
    },
    Detail {
        id: String,
        result: Result<D>,
    },
    Removed {
        id: String,
        result: Result<()>,
    },
}

pub struct ListView<G: RemoteGateway> {
    gateway: Arc<G>,
    input: FilterInput,
    query: QueryCoordinator<G::Row, G::Detail>,
    selection: SelectionTracker,
    notices: Notices,
    tx: mpsc::UnboundedSender<Completion<G::Row, G::Detail>>,
    rx: mpsc::UnboundedReceiver<Completion<G::Row, G::Detail>>,
    in_flight: usize,
}

impl<G: RemoteGateway> ListView<G> {
    pub fn new(gateway: Arc<G>, settings: ListSettings) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            gateway,
            input: FilterInput::new(settings.debounce),
            query: QueryCoordinator::new(Filter::new(settings.page_size)?),
            selection: SelectionTracker::new(),
            notices: Notices::new(),
            tx,
            rx,
            in_flight: 0,
        })
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn filter(&self) -> &Filter {
        self.query.filter()
    }

    /// Filter text as typed, possibly not yet released
    pub fn filter_text(&self) -> &str {
        self.input.text()
    }

    pub fn entries(&self) -> &[Entry<G::Row, G::Detail>] {
        self.query.entries()
    }

    pub fn count(&self) -> Option<u64> {
        self.query.count()
    }

    pub fn page_count(&self) -> usize {
        self.query.page_count()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn row_state(&self, id: &str) -> RowState {
        self.selection.state(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// True while requests are in flight or a filter change is buffered
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0 || self.input.deadline().is_some()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Initial load
    pub fn mount(&mut self) {
        self.refresh();
    }

    /// Fetch items and count for the current filter
    pub fn refresh(&mut self) -> QueryTicket {
        let ticket = self.query.begin_refresh();

        let gateway = Arc::clone(&self.gateway);
        let t = ticket.clone();
        self.spawn(async move {
            let result = gateway.list(&t.filter).await;
            Completion::Items { ticket: t, result }
        });

        let gateway = Arc::clone(&self.gateway);
        let t = ticket.clone();
        self.spawn(async move {
            let result = gateway.count(&t.filter.text).await;
            Completion::Count { ticket: t, result }
        });

        ticket
    }

    /// Record a keystroke in the filter box
    pub fn input(&mut self, raw: impl Into<String>) {
        self.input.input(raw, Instant::now());
    }

    /// Apply filter text without waiting for the debounce window
    pub fn submit_filter(&mut self, raw: impl Into<String>) {
        if let Some(text) = self.input.submit(raw) {
            self.query.set_text(text);
            self.refresh();
        }
    }

    /// Jump straight to a filter and zero-based page with a single fetch.
    /// A page index out of range is rejected before anything changes.
    pub fn open_at(&mut self, raw: impl Into<String>, page_index: usize) -> Result<QueryTicket> {
        let limit = self.query.filter().limit;
        if page_index.checked_mul(limit).is_none() {
            return Err(ListError::validation(
                "page",
                format!("{} is out of range", page_index),
            ));
        }
        if let Some(text) = self.input.submit(raw) {
            self.query.set_text(text);
        }
        self.query.go_to_page(page_index)?;
        Ok(self.refresh())
    }

    /// Empty the filter box and go back to the first page right away
    pub fn clear_filter(&mut self) {
        let text_changed = self
            .input
            .clear()
            .map(|text| self.query.set_text(text))
            .unwrap_or(false);
        let moved = self.query.go_to_page(0).unwrap_or(false);
        if text_changed || moved {
            self.refresh();
        }
    }

    pub fn go_to_page(&mut self, index: usize) -> Result<()> {
        if self.query.go_to_page(index)? {
            self.refresh();
        }
        Ok(())
    }

    pub fn next_page(&mut self) {
        if self.query.next_page() {
            self.refresh();
        }
    }

    pub fn previous_page(&mut self) {
        if self.query.previous_page() {
            self.refresh();
        }
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        if self.query.set_page_size(size)? {
            self.refresh();
        }
        Ok(())
    }

    /// Expand or collapse a row on the current page.
    /// Returns false if no such row is displayed.
    pub fn toggle(&mut self, id: &str) -> bool {
        let toggle = match self.query.page().and_then(|p| p.find(id)) {
            Some(entry) => self.selection.toggle(entry),
            None => return false,
        };
        if let Toggle::FetchDetail(id) = toggle {
            self.fetch_detail(id);
        }
        true
    }

    /// Delete a row, then refresh with the same filter
    pub fn remove(&mut self, id: &str) {
        let gateway = Arc::clone(&self.gateway);
        let id = id.to_string();
        self.spawn(async move {
            let result = gateway.remove(&id).await;
            Completion::Removed { id, result }
        });
    }

    /// Delete a row once the confirmation dialog was accepted.
    /// Returns true if a delete was issued.
    pub fn confirm_remove(&mut self, id: &str, outcome: DialogOutcome<()>) -> bool {
        match outcome {
            DialogOutcome::Committed(()) => {
                self.remove(id);
                true
            }
            DialogOutcome::Cancelled => false,
        }
    }

    /// An editor dialog closed. A committed row name is announced and the
    /// list refreshed; a cancelled dialog changes nothing.
    pub fn editor_closed(&mut self, outcome: DialogOutcome<String>, kind: EditKind) {
        let name = match outcome {
            DialogOutcome::Committed(name) => name,
            DialogOutcome::Cancelled => return,
        };
        let verb = match kind {
            EditKind::Created => "created",
            EditKind::Updated => "updated",
        };
        self.notices.info(format!("'{}' successfully {}", name, verb));
        self.refresh();
    }

    /// Edit a cached detail in place, e.g. after removing one of its parts
    /// on the backend. Returns false if the row has no cached detail.
    pub fn update_detail(&mut self, id: &str, f: impl FnOnce(&mut G::Detail)) -> bool {
        match self.query.detail_mut(id) {
            Some(detail) => {
                f(detail);
                true
            }
            None => false,
        }
    }

    /// Queue an informational notice on behalf of the caller
    pub fn announce(&mut self, message: impl Into<String>) {
        self.notices.info(message);
    }

    // ------------------------------------------------------------------
    // Event processing
    // ------------------------------------------------------------------

    /// Wait for the next completion or debounce deadline and apply it.
    ///
    /// Cancel-safe: dropping the future before it resolves loses nothing.
    /// Never resolves while the view is idle (see [`ListView::is_busy`]).
    pub async fn next_update(&mut self) -> Update {
        let deadline = self.input.deadline();
        tokio::select! {
            Some(completion) = self.rx.recv() => self.apply(completion),
            _ = wait_until(deadline) => self.release_filter(),
        }
    }

    /// Process events until nothing is in flight or buffered
    pub async fn settle(&mut self) {
        while self.is_busy() {
            self.next_update().await;
        }
    }

    fn release_filter(&mut self) -> Update {
        match self.input.poll(Instant::now()) {
            Some(text) => {
                self.query.set_text(text);
                self.refresh();
                Update::Filter
            }
            None => Update::FilterUnchanged,
        }
    }

    fn apply(&mut self, completion: Completion<G::Row, G::Detail>) -> Update {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Items { ticket, result } => {
                match self.query.apply_items(&ticket, result) {
                    ItemsOutcome::Applied { fresh } => {
                        let pending = match self.query.page() {
                            Some(page) => self.selection.reconcile(page, fresh),
                            None => Vec::new(),
                        };
                        for id in pending {
                            self.fetch_detail(id);
                        }
                        Update::Items
                    }
                    ItemsOutcome::Stale => Update::Stale,
                    ItemsOutcome::Failed(err) => {
                        self.notices.error(&err);
                        Update::Failed
                    }
                }
            }
            Completion::Count { ticket, result } => match self.query.apply_count(&ticket, result) {
                CountOutcome::Applied => Update::Count,
                CountOutcome::Stale => Update::Stale,
                CountOutcome::Failed(err) => {
                    self.notices.error(&err);
                    Update::Failed
                }
            },
            Completion::Detail { id, result } => {
                if self.selection.state(&id) != RowState::Expanding {
                    debug!(row = %id, "detail arrived for row no longer expanding");
                    return Update::Stale;
                }
                match result {
                    Ok(detail) => {
                        self.query.merge_detail(&id, detail);
                        self.selection.detail_resolved(&id);
                        Update::Detail
                    }
                    Err(err) => {
                        // Row stays open without detail; toggling again retries
                        self.selection.detail_resolved(&id);
                        self.notices.error(&err);
                        Update::Failed
                    }
                }
            }
            Completion::Removed { id, result } => match result {
                Ok(()) => {
                    self.notices.info(format!("'{}' was successfully deleted", id));
                    self.refresh();
                    Update::Removed
                }
                Err(err) => {
                    self.notices.error(&err);
                    Update::Failed
                }
            },
        }
    }

    fn fetch_detail(&mut self, id: String) {
        let gateway = Arc::clone(&self.gateway);
        self.spawn(async move {
            let result = gateway.detail(&id).await;
            Completion::Detail { id, result }
        });
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = Completion<G::Row, G::Detail>> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // Receiver lives as long as the view; a send error means it is gone
            let _ = tx.send(fut.await);
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
