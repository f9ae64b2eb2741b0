//! Filter, page and row types shared by the list components

use serde::{Deserialize, Serialize};

use crate::error::{ListError, Result};

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A list entry with a stable identifier.
///
/// Rows are compared by identifier, never by reference: every applied page
/// replaces the previous row values wholesale.
pub trait Row: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Search text plus pagination window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub text: String,
    pub offset: usize,
    pub limit: usize,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            text: String::new(),
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Filter {
    /// Create an empty filter on the first page
    pub fn new(limit: usize) -> Result<Self> {
        validate_page_size(limit)?;
        Ok(Self {
            limit,
            ..Self::default()
        })
    }

    /// Zero-based index of the current page
    pub fn page_index(&self) -> usize {
        self.offset / self.limit
    }

    /// Replace the search text. Returns true if it changed, in which case
    /// pagination is back on the first page.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }
        self.text = text;
        self.offset = 0;
        true
    }

    /// Jump to a zero-based page. An index whose offset does not fit is
    /// rejected and the filter is left as it was.
    pub fn go_to_page(&mut self, index: usize) -> Result<()> {
        self.offset = index
            .checked_mul(self.limit)
            .ok_or_else(|| ListError::validation("page", format!("{} is out of range", index)))?;
        Ok(())
    }

    /// Change the page size, keeping the first visible row on screen
    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        validate_page_size(size)?;
        let index = self.offset / size;
        self.limit = size;
        self.offset = index * size;
        Ok(())
    }
}

fn validate_page_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(ListError::validation(
            "page size",
            "must be greater than zero",
        ));
    }
    Ok(())
}

/// Number of pages needed to show `count` rows
pub fn page_count(count: u64, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    count.div_ceil(limit as u64) as usize
}

/// A row plus its lazily fetched detail record
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<R, D> {
    pub row: R,
    pub detail: Option<D>,
}

impl<R: Row, D> Entry<R, D> {
    pub fn new(row: R) -> Self {
        Self { row, detail: None }
    }

    pub fn id(&self) -> &str {
        self.row.id()
    }
}

/// One applied page of rows, tagged with the filter that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R, D> {
    pub filter: Filter,
    pub entries: Vec<Entry<R, D>>,
}

impl<R: Row, D> Page<R, D> {
    pub fn find(&self, id: &str) -> Option<&Entry<R, D>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Entry<R, D>> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id().to_string()).collect()
    }
}

// ============================================================================
// Magic backend rows
// ============================================================================

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl Row for User {
    fn id(&self) -> &str {
        &self.username
    }
}

/// One role association as returned by the user-roles endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub role: String,
}

/// A user currently connected over web sockets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketUser {
    pub username: String,
    #[serde(default)]
    pub connections: Vec<String>,
}

impl Row for SocketUser {
    fn id(&self) -> &str {
        &self.username
    }
}

/// `{count}` response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub count: u64,
}

/// `{affected}` response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affected {
    pub affected: u64,
}
