//! Client-side filtering for endpoints that return the whole collection

use crate::model::Row;

/// Rows whose identifier contains `text`. Case-sensitive; empty text keeps all.
pub fn filter_local<'a, R: Row>(rows: &'a [R], text: &str) -> Vec<&'a R> {
    rows.iter().filter(|r| r.id().contains(text)).collect()
}
