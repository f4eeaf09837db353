//! The cached task collection and its splice operations.

use std::collections::HashSet;

use taskdeck_proto::api::Pagination;
use taskdeck_proto::task::{Task, TaskFilters, TaskId};

/// Everything a consumer observes about the task list.
///
/// Owned by [`TaskStore`](super::TaskStore); consumers get clones or watch
/// it through a receiver and never mutate it directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCollectionState {
    /// Cached tasks in server order, newly created ones first.
    pub items: Vec<Task>,
    /// Position of the last successful list response.
    pub pagination: Option<Pagination>,
    /// Constraints applied to the next list fetch.
    pub filters: TaskFilters,
    /// An operation the consumer is waiting on is in flight.
    pub is_loading: bool,
    /// User-facing message from the last failed operation.
    pub error: Option<String>,
}

impl TaskCollectionState {
    /// Looks up a cached task.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.items.iter().find(|t| &t.id == id)
    }

    /// Returns `true` if a task with `id` is cached.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.items.iter().position(|t| &t.id == id)
    }

    /// Replaces the whole collection with a list response, keeping the
    /// first occurrence of any id the server repeated. Returns how many
    /// duplicates were dropped.
    pub(crate) fn replace_page(&mut self, items: Vec<Task>, pagination: Pagination) -> usize {
        let received = items.len();
        let mut seen = HashSet::with_capacity(received);
        self.items = items
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        self.pagination = Some(pagination);
        received - self.items.len()
    }

    /// Puts a newly created task at the front. A cached entry with the same
    /// id is dropped first so ids stay unique.
    pub(crate) fn prepend(&mut self, task: Task) {
        if let Some(pos) = self.position(&task.id) {
            self.items.remove(pos);
        }
        self.items.insert(0, task);
    }

    /// Swaps the entry cached under `id` for `task`, keeping its position.
    /// Returns `false` if nothing is cached under `id`.
    pub(crate) fn replace(&mut self, id: &TaskId, task: Task) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        // The server may in principle hand back a different id; drop any
        // other entry already holding it.
        if &task.id != id {
            if let Some(other) = self.position(&task.id) {
                self.items.remove(other);
                let pos = if other < pos { pos - 1 } else { pos };
                self.items[pos] = task;
                return true;
            }
        }
        self.items[pos] = task;
        true
    }

    /// Drops the entry cached under `id`. Returns `false` if absent.
    pub(crate) fn remove(&mut self, id: &TaskId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.items.remove(pos);
        true
    }
}
