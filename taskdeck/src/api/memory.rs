//! In-process task service for testing.
//!
//! [`InMemoryTaskApi`] behaves like a minimal remote service: it assigns
//! ids, returns newest tasks first, filters by exact field match and pages
//! results. It also records how often each operation was called and can
//! be told to fail or stall, which is what store tests need to observe.
//! Clones share the same backing state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taskdeck_proto::api::{PageRequest, Paginated, Pagination};
use taskdeck_proto::task::{
    CreateTaskRequest, Task, TaskFilters, TaskId, TaskStatus, UpdateTaskRequest,
};
use uuid::Uuid;

use super::{ApiError, TaskApi};

/// The four remote operations, used to target failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    /// Newest first.
    tasks: Vec<Task>,
    calls: HashMap<Operation, usize>,
    /// One-shot failures, consumed in order.
    queued_failures: HashMap<Operation, VecDeque<ApiError>>,
    /// Failures returned on every call until cleared.
    sticky_failures: HashMap<Operation, ApiError>,
    latency: Option<Duration>,
    last_list: Option<(TaskFilters, PageRequest)>,
    last_update: Option<(TaskId, UpdateTaskRequest)>,
}

impl Inner {
    fn take_failure(&mut self, op: Operation) -> Option<ApiError> {
        if let Some(err) = self.queued_failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Some(err);
        }
        self.sticky_failures.get(&op).cloned()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }
}

/// Fake task service backed by a shared in-memory list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskApi {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTaskApi {
    /// An empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A service pre-populated with `tasks`, first item treated as newest.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let api = Self::new();
        api.inner.lock().tasks = tasks.into_iter().collect();
        api
    }

    /// Inserts a task as the newest entry, replacing one with the same id.
    pub fn insert(&self, task: Task) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.position(&task.id) {
            inner.tasks.remove(pos);
        }
        inner.tasks.insert(0, task);
    }

    /// Snapshot of every stored task, newest first.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    /// Makes the next call to `op` fail with `error`. Queued failures are
    /// consumed one per call.
    pub fn fail_next(&self, op: Operation, error: ApiError) {
        self.inner
            .lock()
            .queued_failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Makes every call to `op` fail with `error` until cleared.
    pub fn fail_always(&self, op: Operation, error: ApiError) {
        self.inner.lock().sticky_failures.insert(op, error);
    }

    /// Drops all queued and sticky failures.
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock();
        inner.queued_failures.clear();
        inner.sticky_failures.clear();
    }

    /// Delays every subsequent call by `latency`. Each call samples the
    /// value when it starts.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.lock().latency = latency;
    }

    /// Number of calls made to `op`, failed ones included.
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of calls made across all operations.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.inner.lock().calls.values().sum()
    }

    /// Filters and page of the most recent list call.
    #[must_use]
    pub fn last_list(&self) -> Option<(TaskFilters, PageRequest)> {
        self.inner.lock().last_list.clone()
    }

    /// Id and payload of the most recent update call.
    #[must_use]
    pub fn last_update(&self) -> Option<(TaskId, UpdateTaskRequest)> {
        self.inner.lock().last_update.clone()
    }

    /// Records the call, waits out any latency, then reports an injected
    /// failure if one is pending.
    async fn enter(&self, op: Operation) -> Result<(), ApiError> {
        let (latency, failure) = {
            let mut inner = self.inner.lock();
            *inner.calls.entry(op).or_insert(0) += 1;
            (inner.latency, inner.take_failure(op))
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

fn not_found(id: &TaskId) -> ApiError {
    ApiError::status(404, format!("Task {id} not found"))
}

impl TaskApi for InMemoryTaskApi {
    async fn list(
        &self,
        filters: &TaskFilters,
        page: PageRequest,
    ) -> Result<Paginated<Task>, ApiError> {
        self.inner.lock().last_list = Some((filters.clone(), page));
        self.enter(Operation::List).await?;

        let inner = self.inner.lock();
        let matching: Vec<&Task> = inner.tasks.iter().filter(|t| filters.matches(t)).collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.per_page as usize)
            .cloned()
            .collect();
        drop(inner);

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            pages: Pagination::page_count(total, page.per_page),
        })
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<Task, ApiError> {
        self.enter(Operation::Create).await?;

        let task = Task {
            id: TaskId::new(Uuid::now_v7().to_string()),
            title: request.title.clone(),
            description: request.description.clone(),
            status: request.status.clone().unwrap_or(TaskStatus::Todo),
            extra: request.extra.clone(),
        };
        self.inner.lock().tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, request: &UpdateTaskRequest) -> Result<Task, ApiError> {
        self.inner.lock().last_update = Some((id.clone(), request.clone()));
        self.enter(Operation::Update).await?;

        let mut inner = self.inner.lock();
        let pos = inner.position(id).ok_or_else(|| not_found(id))?;
        let task = &mut inner.tasks[pos];
        request.apply_to(task);
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        self.enter(Operation::Delete).await?;

        let mut inner = self.inner.lock();
        let pos = inner.position(id).ok_or_else(|| not_found(id))?;
        inner.tasks.remove(pos);
        Ok(())
    }
}
