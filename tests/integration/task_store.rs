//! Integration tests for the task store against the in-memory service.
//!
//! Covers the observable contract of `TaskStore`: page loads, the
//! optimistic splice after each mutation, the two failure policies,
//! authentication gating, filter merging, and overlapping operations.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::redundant_clone
)]

use std::time::Duration;

use taskdeck::api::ApiError;
use taskdeck::api::memory::{InMemoryTaskApi, Operation};
use taskdeck::auth::AuthFlag;
use taskdeck::store::{DELETE_FAILED, LOAD_FAILED, TaskStore};
use taskdeck_proto::task::{
    CreateTaskRequest, Task, TaskFilters, TaskId, TaskStatus, UpdateTaskRequest,
};
use taskdeck_proto::validation::{check_task_title, field_error_message};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn todo(id: &str) -> Task {
    Task::new(id, format!("Task {id}"), TaskStatus::Todo)
}

fn done(id: &str) -> Task {
    Task::new(id, format!("Task {id}"), TaskStatus::Done)
}

/// A signed-in store over `tasks` with the first page already loaded.
async fn loaded_store(tasks: Vec<Task>) -> (TaskStore<InMemoryTaskApi, AuthFlag>, InMemoryTaskApi) {
    let api = InMemoryTaskApi::with_tasks(tasks);
    let store = TaskStore::new(api.clone(), AuthFlag::new(true));
    store.load_page(1, 10).await;
    (store, api)
}

fn ids(store: &TaskStore<InMemoryTaskApi, AuthFlag>) -> Vec<String> {
    store.tasks().into_iter().map(|t| t.id.to_string()).collect()
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn toggle_single_todo_task_to_done() {
    let (store, _api) = loaded_store(vec![todo("1")]).await;
    let loading_before = store.is_loading();

    assert!(store.toggle_completion(&TaskId::new("1"), None).await);

    let tasks = store.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id.as_str(), "1");
    assert_eq!(tasks[0].status, TaskStatus::Done);
    assert_eq!(store.is_loading(), loading_before);
}

#[tokio::test]
async fn toggle_twice_round_trips_status() {
    let (store, api) = loaded_store(vec![todo("1")]).await;
    let id = TaskId::new("1");

    assert!(store.toggle_completion(&id, None).await);
    assert_eq!(
        api.last_update().unwrap().1,
        UpdateTaskRequest::status_only(TaskStatus::Done)
    );

    assert!(store.toggle_completion(&id, None).await);
    assert_eq!(
        api.last_update().unwrap().1,
        UpdateTaskRequest::status_only(TaskStatus::Todo)
    );
    assert_eq!(store.task(&id).unwrap().status, TaskStatus::Todo);
}

#[tokio::test]
async fn toggle_unknown_task_issues_no_request() {
    let (store, api) = loaded_store(vec![todo("1")]).await;
    let calls_before = api.total_calls();

    assert!(!store.toggle_completion(&TaskId::new("404"), None).await);
    assert_eq!(api.total_calls(), calls_before);
}

#[tokio::test]
async fn short_title_is_caught_before_create() {
    let (store, api) = loaded_store(vec![]).await;
    let request = CreateTaskRequest::new("ab");

    let message = field_error_message(check_task_title(&request.title));
    assert!(message.contains("must be at least 3 characters"));
    assert!(request.validate().is_err());

    // A correctly composed caller stops here.
    assert_eq!(api.calls(Operation::Create), 0);
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn failed_delete_reports_through_state_only() {
    let (store, api) = loaded_store(vec![todo("x")]).await;
    api.fail_next(Operation::Delete, ApiError::status(500, "Internal Server Error"));

    let deleted = store.delete(&TaskId::new("x")).await;

    assert!(!deleted);
    assert_eq!(ids(&store), vec!["x"]);
    assert_eq!(store.error().as_deref(), Some(DELETE_FAILED));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn unauthenticated_load_never_calls_service() {
    let api = InMemoryTaskApi::with_tasks(vec![todo("1"), todo("2")]);
    let auth = AuthFlag::new(false);
    let store = TaskStore::new(api.clone(), auth.clone());

    store.load_page(1, 10).await;
    assert_eq!(api.total_calls(), 0);
    assert!(!store.is_loading());
    assert!(store.tasks().is_empty());

    auth.set(true);
    store.load_page(1, 10).await;
    assert_eq!(api.calls(Operation::List), 1);
    assert_eq!(store.tasks().len(), 2);
}

#[tokio::test]
async fn signing_out_keeps_previous_collection() {
    let api = InMemoryTaskApi::with_tasks(vec![todo("1")]);
    let auth = AuthFlag::new(true);
    let store = TaskStore::new(api.clone(), auth.clone());
    store.load_page(1, 10).await;

    auth.set(false);
    store.load_page(2, 10).await;

    assert_eq!(ids(&store), vec!["1"]);
    assert_eq!(store.pagination().unwrap().page, 1);
    assert_eq!(api.calls(Operation::List), 1);
}

#[tokio::test]
async fn filters_merge_across_calls() {
    let (store, _api) = loaded_store(vec![]).await;
    store.apply_filters(&TaskFilters::new().with("status", "done"));
    store.apply_filters(&TaskFilters::new().with("priority", "high"));

    let filters = store.filters();
    assert_eq!(filters.get("status"), Some("done"));
    assert_eq!(filters.get("priority"), Some("high"));
}

#[tokio::test]
async fn filtered_reload_supersedes_previous_view() {
    let (store, _api) = loaded_store(vec![todo("1"), done("2"), todo("3")]).await;
    assert_eq!(store.tasks().len(), 3);

    store.apply_filters(&TaskFilters::new().with_status(&TaskStatus::Done));
    assert_eq!(store.tasks().len(), 3);

    store.load_page(1, 10).await;
    assert_eq!(ids(&store), vec!["2"]);
    assert_eq!(store.pagination().unwrap().total, 1);
}

#[tokio::test]
async fn cleared_filter_restores_unfiltered_list() {
    let (store, api) = loaded_store(vec![todo("1"), done("2")]).await;

    store.apply_filters(&TaskFilters::new().with_status(&TaskStatus::Done));
    store.load_page(1, 10).await;
    assert_eq!(ids(&store), vec!["2"]);

    let remaining = store.apply_filters(&TaskFilters::new().without("status"));
    assert!(remaining.is_empty());
    store.load_page(1, 10).await;

    assert_eq!(ids(&store), vec!["1", "2"]);
    assert!(api.last_list().unwrap().0.is_empty());
}

// ===========================================================================
// Mutations splice without re-fetching
// ===========================================================================

#[tokio::test]
async fn mutations_never_refetch_or_touch_pagination() {
    let (store, api) = loaded_store(vec![todo("1"), todo("2")]).await;
    let pagination = store.pagination();

    let created = store.create(&CreateTaskRequest::new("Third task")).await.unwrap();
    assert_eq!(ids(&store)[0], created.id.to_string());

    store
        .update(&TaskId::new("2"), &UpdateTaskRequest::default().with_title("Second, renamed"))
        .await
        .unwrap();
    assert_eq!(store.tasks()[2].title, "Second, renamed");

    assert!(store.delete(&TaskId::new("1")).await);
    assert!(store.toggle_completion(&created.id, Some(true)).await);

    assert_eq!(store.tasks().len(), 2);
    assert_eq!(api.calls(Operation::List), 1);
    assert_eq!(store.pagination(), pagination);
}

#[tokio::test]
async fn update_failure_returns_error_and_keeps_items() {
    let (store, api) = loaded_store(vec![todo("1")]).await;
    api.fail_next(Operation::Update, ApiError::status(401, "Not authenticated"));

    let err = store
        .update(&TaskId::new("1"), &UpdateTaskRequest::default().with_title("Changed"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(store.tasks()[0].title, "Task 1");
    assert!(!store.is_loading());
}

#[tokio::test]
async fn load_failure_message_is_generic() {
    let (store, api) = loaded_store(vec![todo("1")]).await;
    api.fail_next(
        Operation::List,
        ApiError::Transport("connection reset by peer".to_string()),
    );

    store.load_page(1, 10).await;

    let error = store.error().unwrap();
    assert_eq!(error, LOAD_FAILED);
    assert!(!error.contains("connection reset"));
    assert_eq!(ids(&store), vec!["1"]);
}

// ===========================================================================
// Overlapping operations
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn stale_list_response_is_discarded() {
    let api = InMemoryTaskApi::with_tasks((0..20).map(|i| todo(&i.to_string())));
    let store = TaskStore::new(api.clone(), AuthFlag::new(true));

    api.set_latency(Some(Duration::from_millis(200)));
    tokio::join!(store.load_page(1, 10), async {
        tokio::task::yield_now().await;
        api.set_latency(None);
        store.load_page(2, 10).await;
    });

    assert_eq!(api.calls(Operation::List), 2);
    assert_eq!(store.pagination().unwrap().page, 2);
    assert_eq!(store.tasks()[0].id.as_str(), "10");
    assert!(!store.is_loading());
}

#[tokio::test(start_paused = true)]
async fn concurrent_toggles_are_not_coalesced() {
    let (store, api) = loaded_store(vec![todo("1")]).await;
    let id = TaskId::new("1");
    api.set_latency(Some(Duration::from_millis(50)));

    let (first, second) = tokio::join!(
        store.toggle_completion(&id, None),
        store.toggle_completion(&id, None)
    );

    assert!(first && second);
    assert_eq!(api.calls(Operation::Update), 2);
    // Both read `todo` from the cache before either finished.
    assert_eq!(store.task(&id).unwrap().status, TaskStatus::Done);
}

#[tokio::test(start_paused = true)]
async fn subscriber_observes_loading_transition() {
    let api = InMemoryTaskApi::with_tasks(vec![todo("1")]);
    let store = TaskStore::new(api.clone(), AuthFlag::new(true));
    let mut rx = store.subscribe();
    api.set_latency(Some(Duration::from_millis(100)));

    let watcher = async {
        rx.changed().await.unwrap();
        let during = rx.borrow_and_update().is_loading;
        rx.changed().await.unwrap();
        let after = rx.borrow_and_update().clone();
        (during, after)
    };
    let ((during, after), ()) = tokio::join!(watcher, store.load_page(1, 10));

    assert!(during);
    assert!(!after.is_loading);
    assert_eq!(after.items.len(), 1);
}
