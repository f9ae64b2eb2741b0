//! Interactive users browser
//!
//! A single filtered list: typing edits the debounced filter, arrows move
//! the cursor and page, Enter expands a user to show their roles.

pub mod app;
pub mod terminal;
pub mod ui;

pub use terminal::run_browse;
