//! Task store: the cached, observable task list.
//!
//! [`TaskStore`] keeps a local copy of one page of tasks in sync with the
//! remote service. List fetches replace the page wholesale; creates,
//! updates and deletes splice the service's answer into the cached list
//! without re-fetching.
//!
//! Two failure policies coexist:
//! - `create` and `update` record a message in state *and* return the
//!   error, so a form can stay open.
//! - `load_page`, `delete` and `toggle_completion` only record the message
//!   and report success as `()`/`bool`.
//!
//! Messages stored in [`TaskCollectionState::error`] are generic; the
//! underlying [`ApiError`] is logged, never shown.

mod state;

pub use state::TaskCollectionState;

use std::sync::atomic::{AtomicU64, Ordering};

use taskdeck_proto::api::{DEFAULT_PER_PAGE, PageRequest, Pagination};
use taskdeck_proto::task::{
    CreateTaskRequest, Task, TaskFilters, TaskId, TaskStatus, UpdateTaskRequest,
};
use tokio::sync::watch;

use crate::api::{ApiError, TaskApi};
use crate::auth::AuthOracle;

/// Shown when a list fetch fails.
pub const LOAD_FAILED: &str = "Failed to load tasks. Please try again.";
/// Shown when a create fails.
pub const CREATE_FAILED: &str = "Failed to add task.";
/// Shown when an update or completion toggle fails.
pub const UPDATE_FAILED: &str = "Failed to update task.";
/// Shown when a delete fails.
pub const DELETE_FAILED: &str = "Failed to delete task.";

/// Cached, observable view of the remote task list.
///
/// All operations take `&self`; state changes happen synchronously between
/// network calls, so overlapping operations each apply their own result and
/// the collection reflects whichever finished last. Only list fetches are
/// sequenced: a list response that arrives after a newer list request was
/// issued is discarded.
pub struct TaskStore<A, U> {
    api: A,
    auth: U,
    state: watch::Sender<TaskCollectionState>,
    /// Sequence number of the most recently issued list request.
    list_seq: AtomicU64,
    per_page: u32,
}

impl<A: TaskApi, U: AuthOracle> TaskStore<A, U> {
    /// Creates an idle store with an empty collection and no filters.
    pub fn new(api: A, auth: U) -> Self {
        let (state, _) = watch::channel(TaskCollectionState::default());
        Self {
            api,
            auth,
            state,
            list_seq: AtomicU64::new(0),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Creates a store with `filters` and immediately loads the first page.
    pub async fn open(api: A, auth: U, filters: TaskFilters) -> Self {
        let store = Self::new(api, auth).with_filters(filters);
        store.refresh().await;
        store
    }

    /// Sets the initial filters. Empty values are dropped.
    #[must_use]
    pub fn with_filters(self, filters: TaskFilters) -> Self {
        self.state.send_modify(|s| s.filters.merge(&filters));
        self
    }

    /// Sets the page size [`refresh`](Self::refresh) uses before the first
    /// successful load.
    #[must_use]
    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Whether list fetches are currently allowed to reach the service.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// The remote service this store talks to.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Fetches one page of tasks using the current filters and replaces the
    /// cached collection with it.
    ///
    /// Does nothing beyond clearing `is_loading` when the caller is not
    /// authenticated. On failure the previous items and pagination stay and
    /// `error` is set.
    pub async fn load_page(&self, page: u32, per_page: u32) {
        if !self.auth.is_authenticated() {
            tracing::debug!("not authenticated, skipping task list fetch");
            self.state.send_modify(|s| s.is_loading = false);
            return;
        }

        let request = PageRequest::new(page, per_page);
        let seq = self.list_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut filters = TaskFilters::new();
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
            filters.clone_from(&s.filters);
        });

        let result = self.api.list(&filters, request).await;

        if self.list_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(
                page = request.page,
                "discarding task list response superseded by a newer fetch"
            );
            return;
        }

        match result {
            Ok(response) => {
                let (items, pagination) = response.into_parts();
                tracing::debug!(
                    page = pagination.page,
                    pages = pagination.pages,
                    total = pagination.total,
                    count = items.len(),
                    "loaded tasks"
                );
                self.state.send_modify(|s| {
                    let dropped = s.replace_page(items, pagination);
                    if dropped > 0 {
                        tracing::warn!(dropped, "task list contained repeated ids");
                    }
                    s.is_loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, page = request.page, "failed to fetch tasks");
                self.state.send_modify(|s| {
                    s.error = Some(LOAD_FAILED.to_string());
                    s.is_loading = false;
                });
            }
        }
    }

    /// Reloads the page last loaded, or the first page before any load.
    pub async fn refresh(&self) {
        let request = self
            .pagination()
            .map_or_else(|| PageRequest::new(1, self.per_page), |p| p.page_request());
        self.load_page(request.page, request.per_page).await;
    }

    /// Creates a task and puts it at the front of the cached list.
    ///
    /// The request is sent as given; callers validate it first.
    ///
    /// # Errors
    ///
    /// Returns the service error after recording a generic message in state.
    pub async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        self.state.send_modify(|s| s.is_loading = true);
        match self.api.create(request).await {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, "created task");
                self.state.send_modify(|s| {
                    s.prepend(task.clone());
                    s.is_loading = false;
                });
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to add task");
                self.fail(CREATE_FAILED, true);
                Err(e)
            }
        }
    }

    /// Applies a partial update and swaps the result into the cached list
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns the service error after recording a generic message in state.
    pub async fn update(&self, id: &TaskId, request: &UpdateTaskRequest) -> Result<Task, ApiError> {
        self.state.send_modify(|s| s.is_loading = true);
        match self.api.update(id, request).await {
            Ok(task) => {
                tracing::debug!(task_id = %id, "updated task");
                self.state.send_modify(|s| {
                    s.replace(id, task.clone());
                    s.is_loading = false;
                });
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(error = %e, task_id = %id, "failed to update task");
                self.fail(UPDATE_FAILED, true);
                Err(e)
            }
        }
    }

    /// Deletes a task and drops it from the cached list.
    ///
    /// Returns `false` on failure; the reason is recorded in state only.
    pub async fn delete(&self, id: &TaskId) -> bool {
        self.state.send_modify(|s| s.is_loading = true);
        match self.api.delete(id).await {
            Ok(()) => {
                tracing::debug!(task_id = %id, "deleted task");
                self.state.send_modify(|s| {
                    s.remove(id);
                    s.is_loading = false;
                });
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, task_id = %id, "failed to delete task");
                self.fail(DELETE_FAILED, true);
                false
            }
        }
    }

    /// Marks a cached task done or not done.
    ///
    /// With `completed` given, `true` means done and `false` means todo;
    /// without it the cached status is flipped. Only the status is sent.
    /// Returns `false` without calling the service if `id` is not cached,
    /// and `false` on failure. Leaves `is_loading` alone.
    pub async fn toggle_completion(&self, id: &TaskId, completed: Option<bool>) -> bool {
        let current = self.state.borrow().get(id).map(|t| t.status.clone());
        let Some(current) = current else {
            tracing::debug!(task_id = %id, "toggle requested for task not in cache");
            return false;
        };

        let target = completed.map_or_else(|| current.toggled(), TaskStatus::from_completed);
        let request = UpdateTaskRequest::status_only(target);

        match self.api.update(id, &request).await {
            Ok(task) => {
                tracing::debug!(task_id = %id, status = %task.status, "toggled task");
                self.state.send_modify(|s| {
                    s.replace(id, task);
                });
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, task_id = %id, "failed to toggle task completion");
                self.fail(UPDATE_FAILED, false);
                false
            }
        }
    }

    /// Merges `partial` into the active filters and returns the result.
    /// Keys with an empty value in `partial` are cleared.
    ///
    /// Does not fetch; call [`load_page`](Self::load_page) once the filters
    /// are set.
    pub fn apply_filters(&self, partial: &TaskFilters) -> TaskFilters {
        let mut merged = TaskFilters::new();
        self.state.send_modify(|s| {
            s.filters.merge(partial);
            merged.clone_from(&s.filters);
        });
        merged
    }

    /// Clears the recorded error message, if any.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// A snapshot of the whole state.
    pub fn state(&self) -> TaskCollectionState {
        self.state.borrow().clone()
    }

    /// A receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<TaskCollectionState> {
        self.state.subscribe()
    }

    /// The cached tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().items.clone()
    }

    /// Looks up one cached task.
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.borrow().get(id).cloned()
    }

    /// Position of the last successful list response.
    pub fn pagination(&self) -> Option<Pagination> {
        self.state.borrow().pagination
    }

    /// The active filters.
    pub fn filters(&self) -> TaskFilters {
        self.state.borrow().filters.clone()
    }

    /// Whether an operation the consumer waits on is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// The last recorded error message.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    fn fail(&self, message: &str, clear_loading: bool) {
        self.state.send_modify(|s| {
            s.error = Some(message.to_string());
            if clear_loading {
                s.is_loading = false;
            }
        });
    }
}
