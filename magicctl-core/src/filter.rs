//! Debounced filter text input
//!
//! A timer-gated single-slot buffer: every keystroke replaces the buffered
//! value and re-arms the deadline. The value is released once the input has
//! been quiet for the whole window and differs from the last released value.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Quiet period before a filter change is released
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    deadline: Instant,
}

/// Filter text input with debounce and distinctness
#[derive(Debug, Clone)]
pub struct FilterInput {
    window: Duration,
    /// What the user currently sees in the input box
    text: String,
    pending: Option<Pending>,
    /// Last value handed to the query side
    emitted: String,
}

impl Default for FilterInput {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl FilterInput {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            text: String::new(),
            pending: None,
            emitted: String::new(),
        }
    }

    /// Raw text as typed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last released (normalized) filter value
    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    /// When the buffered value becomes due, if anything is buffered
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Record a keystroke. Replaces any buffered value and restarts the window.
    pub fn input(&mut self, raw: impl Into<String>, now: Instant) {
        let raw = raw.into();
        let text = normalize(&raw);
        self.text = raw;
        self.pending = Some(Pending {
            text,
            deadline: now + self.window,
        });
    }

    /// Release the buffered value if its window has elapsed.
    ///
    /// Returns `None` while still inside the window, or when the settled value
    /// equals the last released one.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(p) if p.deadline <= now => {}
            _ => return None,
        }
        let pending = self.pending.take()?;
        if pending.text == self.emitted {
            debug!(filter = %pending.text, "filter settled on unchanged value");
            return None;
        }
        self.emitted = pending.text.clone();
        debug!(filter = %pending.text, "filter changed");
        Some(pending.text)
    }

    /// Release a value right away, skipping the window (scripted or one-shot
    /// commands). Same distinctness rule as [`FilterInput::poll`].
    pub fn submit(&mut self, raw: impl Into<String>) -> Option<String> {
        let raw = raw.into();
        let text = normalize(&raw);
        self.text = raw;
        self.pending = None;
        if text == self.emitted {
            return None;
        }
        self.emitted = text.clone();
        debug!(filter = %text, "filter submitted");
        Some(text)
    }

    /// Reset to empty text immediately, dropping anything buffered.
    ///
    /// Returns `Some("")` if that is a change from the last released value.
    pub fn clear(&mut self) -> Option<String> {
        self.text.clear();
        self.pending = None;
        if self.emitted.is_empty() {
            return None;
        }
        self.emitted.clear();
        Some(String::new())
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}
