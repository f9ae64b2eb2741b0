//! Browser state and key handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use magicctl_core::{DialogOutcome, ListView, Notice, RemoteGateway, User};

/// Input mode for the browser
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Typing filters, arrows navigate
    #[default]
    Normal,
    /// Waiting for y/n on deleting the named user
    ConfirmDelete(String),
}

/// Result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    Continue,
    Quit,
}

pub struct App<G>
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    pub view: ListView<G>,
    pub mode: Mode,
    /// Cursor position on the current page
    pub cursor: usize,
    /// Most recent notice, shown in the status bar
    pub status: Option<Notice>,
}

impl<G> App<G>
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    pub fn new(view: ListView<G>) -> Self {
        Self {
            view,
            mode: Mode::Normal,
            cursor: 0,
            status: None,
        }
    }

    pub fn selected_id(&self) -> Option<String> {
        self.view
            .entries()
            .get(self.cursor)
            .map(|e| e.id().to_string())
    }

    /// Pull notices and keep the cursor on the page after the list changed
    pub fn sync(&mut self) {
        if let Some(last) = self.view.drain_notices().pop() {
            self.status = Some(last);
        }
        let len = self.view.entries().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> HandleResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return HandleResult::Quit;
        }

        let result = match std::mem::take(&mut self.mode) {
            Mode::ConfirmDelete(id) => {
                let outcome = match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => DialogOutcome::Committed(()),
                    _ => DialogOutcome::Cancelled,
                };
                self.view.confirm_remove(&id, outcome);
                HandleResult::Continue
            }
            Mode::Normal => self.handle_normal(key),
        };
        self.sync();
        result
    }

    fn handle_normal(&mut self, key: KeyEvent) -> HandleResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_id() {
                        self.mode = Mode::ConfirmDelete(id);
                    }
                }
                KeyCode::Char('r') => {
                    self.view.refresh();
                }
                _ => {}
            }
            return HandleResult::Continue;
        }

        match key.code {
            KeyCode::Esc => {
                if self.view.filter_text().is_empty() {
                    return HandleResult::Quit;
                }
                self.view.clear_filter();
                self.cursor = 0;
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.view.toggle(&id);
                }
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.view.entries().len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::PageDown | KeyCode::Right => {
                self.view.next_page();
                self.cursor = 0;
            }
            KeyCode::PageUp | KeyCode::Left => {
                self.view.previous_page();
                self.cursor = 0;
            }
            KeyCode::Backspace => {
                let mut text = self.view.filter_text().to_string();
                if text.pop().is_some() {
                    self.view.input(text);
                }
            }
            KeyCode::Char(c) => {
                let mut text = self.view.filter_text().to_string();
                text.push(c);
                self.view.input(text);
            }
            _ => {}
        }
        HandleResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use magicctl_core::{ListSettings, MockGateway, NoticeLevel, RowState};

    type Gateway = MockGateway<User, Vec<String>>;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn app(names: &[&str]) -> (Arc<Gateway>, App<Gateway>) {
        let gw = Arc::new(MockGateway::new(
            names
                .iter()
                .map(|n| User {
                    username: n.to_string(),
                })
                .collect(),
        ));
        for n in names {
            gw.set_detail(*n, vec!["guest".to_string()]);
        }
        let mut view = ListView::new(Arc::clone(&gw), ListSettings::default()).unwrap();
        view.mount();
        view.settle().await;
        (gw, App::new(view))
    }

    async fn settle(app: &mut App<Gateway>) {
        app.view.settle().await;
        app.sync();
    }

    #[tokio::test(start_paused = true)]
    async fn typing_builds_debounced_filter() {
        let (gw, mut app) = app(&["alice", "bob"]).await;

        for c in "bo".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.view.filter_text(), "bo");
        assert_eq!(app.view.filter().text, "");

        settle(&mut app).await;
        assert_eq!(app.view.filter().text, "bo");
        assert_eq!(gw.list_calls().len(), 2);

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.view.filter_text(), "b");
    }

    #[tokio::test(start_paused = true)]
    async fn esc_clears_filter_then_quits() {
        let (_gw, mut app) = app(&["alice", "bob"]).await;

        app.handle_key(key(KeyCode::Char('b')));
        settle(&mut app).await;

        assert_eq!(app.handle_key(key(KeyCode::Esc)), HandleResult::Continue);
        settle(&mut app).await;
        assert_eq!(app.view.entries().len(), 2);

        assert_eq!(app.handle_key(key(KeyCode::Esc)), HandleResult::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_toggles_row_under_cursor() {
        let (_gw, mut app) = app(&["alice", "bob"]).await;

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor, 1);

        app.handle_key(key(KeyCode::Enter));
        settle(&mut app).await;
        assert_eq!(app.view.row_state("bob"), RowState::Expanded);
        assert_eq!(app.view.row_state("alice"), RowState::Collapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_needs_confirmation() {
        let (gw, mut app) = app(&["alice", "bob"]).await;

        app.handle_key(ctrl('d'));
        assert_eq!(app.mode, Mode::ConfirmDelete("alice".into()));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(gw.rows().len(), 2);

        app.handle_key(ctrl('d'));
        app.handle_key(key(KeyCode::Char('y')));
        settle(&mut app).await;

        assert_eq!(gw.rows().len(), 1);
        let status = app.status.clone().unwrap();
        assert_eq!(status.level, NoticeLevel::Info);
        assert_eq!(status.message, "'alice' was successfully deleted");
        assert_eq!(app.selected_id().as_deref(), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_stays_on_shrunken_page() {
        let (_gw, mut app) = app(&["alice", "bob", "carol"]).await;
        app.cursor = 2;

        app.handle_key(key(KeyCode::Char('a')));
        settle(&mut app).await;

        // "alice" and "carol" match
        assert_eq!(app.view.entries().len(), 2);
        assert_eq!(app.cursor, 1);
    }
}
