//! End-to-end behaviour of the filtered remote list against a mock gateway

use std::sync::Arc;
use std::time::Duration;

use magicctl_core::{
    DialogOutcome, ListError, ListSettings, ListView, MockGateway, NoticeLevel, RowState, Update,
    User,
};

type Gateway = MockGateway<User, Vec<String>>;

fn gateway(names: &[&str]) -> Arc<Gateway> {
    let gw = MockGateway::new(
        names
            .iter()
            .map(|n| User {
                username: n.to_string(),
            })
            .collect(),
    );
    for n in names {
        gw.set_detail(*n, vec!["guest".to_string()]);
    }
    Arc::new(gw)
}

fn usernames(view: &ListView<Gateway>) -> Vec<String> {
    view.entries().iter().map(|e| e.id().to_string()).collect()
}

async fn mounted(gw: &Arc<Gateway>, settings: ListSettings) -> ListView<Gateway> {
    let mut view = ListView::new(Arc::clone(gw), settings).unwrap();
    view.mount();
    view.settle().await;
    view
}

#[tokio::test(start_paused = true)]
async fn keystrokes_within_window_coalesce() {
    let gw = gateway(&["alice", "ann", "annika", "bob"]);
    let mut view = mounted(&gw, ListSettings::default()).await;

    view.input("a");
    tokio::time::sleep(Duration::from_millis(150)).await;
    view.input("an");
    tokio::time::sleep(Duration::from_millis(150)).await;
    view.input("ann");
    view.settle().await;

    let texts: Vec<String> = gw.list_calls().into_iter().map(|f| f.text).collect();
    assert_eq!(texts, vec!["", "ann"]);
    assert_eq!(gw.count_calls(), vec!["", "ann"]);
    assert_eq!(usernames(&view), vec!["ann", "annika"]);
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_refresh_never_overwrites_later_one() {
    let gw = gateway(&["xavier", "xena", "yara"]);
    gw.set_delay("x", Duration::from_millis(300));
    gw.set_delay("y", Duration::from_millis(10));

    let settings = ListSettings {
        debounce: Duration::from_millis(50),
        ..ListSettings::default()
    };
    let mut view = mounted(&gw, settings).await;

    view.input("x");
    assert_eq!(view.next_update().await, Update::Filter);
    view.input("y");
    assert_eq!(view.next_update().await, Update::Filter);

    let mut stale = 0;
    while view.is_busy() {
        if view.next_update().await == Update::Stale {
            stale += 1;
        }
    }

    // Both the items and the count response of the "x" refresh were dropped
    assert_eq!(stale, 2);
    assert_eq!(usernames(&view), vec!["yara"]);
    assert_eq!(view.count(), Some(1));
    assert_eq!(view.filter().text, "y");
}

#[tokio::test(start_paused = true)]
async fn single_result_for_new_filter_is_auto_expanded() {
    let gw = gateway(&["ann", "bob", "carl"]);
    let mut view = mounted(&gw, ListSettings::default()).await;
    assert!(view.selected_ids().is_empty());

    view.input("ann");
    view.settle().await;

    assert_eq!(view.filter().limit, 5);
    assert_eq!(view.selected_ids(), vec!["ann"]);
    assert_eq!(view.row_state("ann"), RowState::Expanded);
    assert_eq!(view.entries()[0].detail, Some(vec!["guest".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn failed_items_fetch_keeps_list_and_reports_once() {
    let gw = gateway(&["alice", "bob"]);
    let mut view = mounted(&gw, ListSettings::default()).await;
    assert_eq!(usernames(&view), vec!["alice", "bob"]);

    gw.fail_next_list(ListError::status(503, "backend unavailable"));
    view.refresh();
    view.settle().await;

    assert_eq!(usernames(&view), vec!["alice", "bob"]);
    let notices = view.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("backend unavailable"));
}

#[tokio::test(start_paused = true)]
async fn failed_count_does_not_block_items() {
    let gw = gateway(&["alice", "bob"]);
    gw.fail_next_count(ListError::transport("connection reset"));
    let mut view = mounted(&gw, ListSettings::default()).await;

    assert_eq!(usernames(&view), vec!["alice", "bob"]);
    assert_eq!(view.count(), None);
    assert_eq!(view.drain_notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn filter_change_resets_offset_before_fetch() {
    let names: Vec<String> = (0..20).map(|i| format!("user{:02}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let gw = gateway(&refs);
    let mut view = mounted(&gw, ListSettings::default()).await;

    view.go_to_page(2).unwrap();
    view.settle().await;
    assert_eq!(view.filter().offset, 10);
    assert_eq!(usernames(&view)[0], "user10");

    view.input("user1");
    view.settle().await;

    let last = gw.list_calls().pop().unwrap();
    assert_eq!(last.text, "user1");
    assert_eq!(last.offset, 0);
}

#[tokio::test(start_paused = true)]
async fn selection_follows_same_filter_refresh() {
    let gw = gateway(&["alice", "bob", "carol"]);
    let mut view = mounted(&gw, ListSettings::default()).await;

    view.toggle("alice");
    view.toggle("bob");
    view.settle().await;
    assert_eq!(view.selected_ids(), vec!["alice", "bob"]);

    view.confirm_remove("bob", DialogOutcome::Committed(()));
    view.settle().await;

    assert_eq!(usernames(&view), vec!["alice", "carol"]);
    assert_eq!(view.selected_ids(), vec!["alice"]);
    assert_eq!(view.row_state("alice"), RowState::Expanded);

    let notices = view.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "'bob' was successfully deleted");

    // The refresh after the delete reused the filter
    let calls = gw.list_calls();
    assert_eq!(calls[calls.len() - 1], calls[calls.len() - 2]);
}

#[tokio::test(start_paused = true)]
async fn failed_remove_leaves_list_alone() {
    let gw = gateway(&["alice", "bob"]);
    gw.fail_next_remove(ListError::status(403, "forbidden"));
    let mut view = mounted(&gw, ListSettings::default()).await;
    let calls_before = gw.list_calls().len();

    view.remove("bob");
    view.settle().await;

    assert_eq!(usernames(&view), vec!["alice", "bob"]);
    assert_eq!(gw.list_calls().len(), calls_before);
    let notices = view.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test(start_paused = true)]
async fn new_filter_drops_selection() {
    let gw = gateway(&["alice", "albert", "bob"]);
    let mut view = mounted(&gw, ListSettings::default()).await;

    view.toggle("bob");
    view.settle().await;

    view.input("al");
    view.settle().await;

    assert_eq!(usernames(&view), vec!["alice", "albert"]);
    assert!(view.selected_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn page_size_change_refetches_aligned_window() {
    let names: Vec<String> = (0..20).map(|i| format!("user{:02}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let gw = gateway(&refs);
    let mut view = mounted(&gw, ListSettings::default()).await;

    view.go_to_page(3).unwrap();
    view.settle().await;
    view.set_page_size(10).unwrap();
    view.settle().await;

    assert_eq!(view.filter().offset, 10);
    assert_eq!(view.entries().len(), 10);
    assert_eq!(view.page_count(), 2);
    assert!(view.set_page_size(0).is_err());
}

#[tokio::test(start_paused = true)]
async fn open_at_fetches_filter_and_page_once() {
    let names: Vec<String> = (0..12).map(|i| format!("user{:02}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let gw = gateway(&refs);

    let mut view = ListView::new(Arc::clone(&gw), ListSettings::default()).unwrap();
    view.open_at("user", 2).unwrap();
    view.settle().await;

    assert_eq!(gw.list_calls().len(), 1);
    assert_eq!(view.filter().offset, 10);
    assert_eq!(usernames(&view), vec!["user10", "user11"]);
    assert_eq!(view.count(), Some(12));
}

#[tokio::test(start_paused = true)]
async fn out_of_range_page_is_rejected_without_fetching() {
    let gw = gateway(&["alice", "bob"]);
    let mut view = mounted(&gw, ListSettings::default()).await;

    assert!(matches!(
        view.go_to_page(usize::MAX),
        Err(ListError::Validation { .. })
    ));
    assert!(matches!(
        view.open_at("al", usize::MAX),
        Err(ListError::Validation { .. })
    ));

    assert!(!view.is_busy());
    assert_eq!(view.filter().offset, 0);
    assert_eq!(view.filter().text, "");
    assert_eq!(gw.list_calls().len(), 1);
}
