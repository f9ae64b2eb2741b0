//! Remote Gateway abstraction
//!
//! The list components only ever talk to the backend through this trait.
//! Transport details (URLs, headers, tokens) belong to the implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ListError, Result};
use crate::local::filter_local;
use crate::model::{Filter, Row};

#[async_trait]
pub trait RemoteGateway: Send + Sync + 'static {
    type Row: Row;
    type Detail: Clone + Send + Sync + 'static;

    /// One page of rows matching `filter`
    async fn list(&self, filter: &Filter) -> Result<Vec<Self::Row>>;

    /// Total rows matching `text`
    async fn count(&self, text: &str) -> Result<u64>;

    /// Detail record for a single row
    async fn detail(&self, id: &str) -> Result<Self::Detail>;

    async fn remove(&self, id: &str) -> Result<()>;
}

struct MockState<R, D> {
    rows: Vec<R>,
    details: HashMap<String, D>,
    delays: HashMap<String, Duration>,
    list_failures: VecDeque<ListError>,
    count_failures: VecDeque<ListError>,
    detail_failures: VecDeque<ListError>,
    remove_failures: VecDeque<ListError>,
    list_calls: Vec<Filter>,
    count_calls: Vec<String>,
    detail_calls: Vec<String>,
}

/// In-memory gateway for testing
///
/// Serves `rows` filtered by identifier substring, with optional per-text
/// latency and scripted failures consumed one per call.
pub struct MockGateway<R, D> {
    state: Mutex<MockState<R, D>>,
}

impl<R: Row, D: Clone> MockGateway<R, D> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            state: Mutex::new(MockState {
                rows,
                details: HashMap::new(),
                delays: HashMap::new(),
                list_failures: VecDeque::new(),
                count_failures: VecDeque::new(),
                detail_failures: VecDeque::new(),
                remove_failures: VecDeque::new(),
                list_calls: Vec::new(),
                count_calls: Vec::new(),
                detail_calls: Vec::new(),
            }),
        }
    }

    pub fn set_detail(&self, id: impl Into<String>, detail: D) {
        self.state.lock().unwrap().details.insert(id.into(), detail);
    }

    /// Delay list and count responses for this filter text
    pub fn set_delay(&self, text: impl Into<String>, delay: Duration) {
        self.state.lock().unwrap().delays.insert(text.into(), delay);
    }

    pub fn fail_next_list(&self, err: ListError) {
        self.state.lock().unwrap().list_failures.push_back(err);
    }

    pub fn fail_next_count(&self, err: ListError) {
        self.state.lock().unwrap().count_failures.push_back(err);
    }

    pub fn fail_next_detail(&self, err: ListError) {
        self.state.lock().unwrap().detail_failures.push_back(err);
    }

    pub fn fail_next_remove(&self, err: ListError) {
        self.state.lock().unwrap().remove_failures.push_back(err);
    }

    /// Filters passed to `list`, in call order
    pub fn list_calls(&self) -> Vec<Filter> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn count_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().count_calls.clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().detail_calls.clone()
    }

    pub fn rows(&self) -> Vec<R> {
        self.state.lock().unwrap().rows.clone()
    }

    fn delay_for(state: &MockState<R, D>, text: &str) -> Option<Duration> {
        state.delays.get(text).copied()
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<R: Row, D: Clone + Send + Sync + 'static> RemoteGateway for MockGateway<R, D> {
    type Row = R;
    type Detail = D;

    async fn list(&self, filter: &Filter) -> Result<Vec<R>> {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            state.list_calls.push(filter.clone());
            let delay = Self::delay_for(&state, &filter.text);
            let result = match state.list_failures.pop_front() {
                Some(err) => Err(err),
                None => Ok(filter_local(&state.rows, &filter.text)
                    .into_iter()
                    .skip(filter.offset)
                    .take(filter.limit)
                    .cloned()
                    .collect()),
            };
            (result, delay)
        };
        pause(delay).await;
        result
    }

    async fn count(&self, text: &str) -> Result<u64> {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            state.count_calls.push(text.to_string());
            let delay = Self::delay_for(&state, text);
            let result = match state.count_failures.pop_front() {
                Some(err) => Err(err),
                None => Ok(filter_local(&state.rows, text).len() as u64),
            };
            (result, delay)
        };
        pause(delay).await;
        result
    }

    async fn detail(&self, id: &str) -> Result<D> {
        let mut state = self.state.lock().unwrap();
        state.detail_calls.push(id.to_string());
        if let Some(err) = state.detail_failures.pop_front() {
            return Err(err);
        }
        state
            .details
            .get(id)
            .cloned()
            .ok_or_else(|| ListError::status(404, format!("no detail for '{}'", id)))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.remove_failures.pop_front() {
            return Err(err);
        }
        let before = state.rows.len();
        state.rows.retain(|r| r.id() != id);
        if state.rows.len() == before {
            return Err(ListError::status(404, format!("'{}' not found", id)));
        }
        Ok(())
    }
}
