//! Task record and request payload types.
//!
//! The remote task service owns every [`Task`]; clients only ever hold a
//! cached copy. Fields the service adds beyond the ones modelled here are
//! kept in an opaque `extra` map so they survive a decode/encode cycle
//! untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimum task title length in characters, measured after trimming.
pub const MIN_TASK_TITLE_LENGTH: usize = 3;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 200;

/// Maximum allowed task description length in characters.
pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 2000;

/// Opaque, server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a server-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as sent by the server.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status of a task.
///
/// Only `todo` and `done` carry meaning for completion toggling. Any other
/// value the server reports is preserved verbatim in [`TaskStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Not completed.
    Todo,
    /// Completed.
    Done,
    /// A server-defined status this client does not interpret.
    Other(String),
}

impl TaskStatus {
    /// Maps a completion flag onto a status: `true` is done, `false` is todo.
    #[must_use]
    pub const fn from_completed(completed: bool) -> Self {
        if completed { Self::Done } else { Self::Todo }
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Todo => "todo",
            Self::Done => "done",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` if the task is completed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The status a completion toggle moves to.
    ///
    /// `done` flips back to `todo`; every other status, including ones the
    /// client does not know, moves to `done`.
    #[must_use]
    pub const fn toggled(&self) -> Self {
        if self.is_done() { Self::Todo } else { Self::Done }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "todo" => Self::Todo,
            "done" => Self::Done,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached copy of a task owned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier, unique within the service.
    pub id: TaskId,
    /// Short human-readable title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion status.
    pub status: TaskStatus,
    /// Server-defined fields this client passes through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Builds a task with no description and no extra fields.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status,
            extra: Map::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a pass-through field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns a field's value rendered as a string, the way it would
    /// appear in a list query parameter.
    ///
    /// Known fields are looked up first, then the pass-through map. String
    /// values are returned without JSON quoting.
    #[must_use]
    pub fn field_value(&self, key: &str) -> Option<String> {
        match key {
            "id" => Some(self.id.to_string()),
            "title" => Some(self.title.clone()),
            "description" => self.description.clone(),
            "status" => Some(self.status.to_string()),
            other => self.extra.get(other).map(|v| match v {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            }),
        }
    }
}

/// Payload for creating a task.
///
/// Callers are expected to run [`CreateTaskRequest::validate`] before
/// submitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Initial status; the server picks its default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Additional server-defined fields (priority, due date, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateTaskRequest {
    /// Creates a payload with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a pass-through field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Partial payload for updating a task. Absent fields are left untouched
/// by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Additional server-defined fields to change.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpdateTaskRequest {
    /// A payload that changes only the status.
    #[must_use]
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a pass-through field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the payload would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.extra.is_empty()
    }

    /// Applies this partial update to a task, the way the server would.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        for (key, value) in &self.extra {
            task.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Query constraints applied to list requests.
///
/// Keys are query parameter names (`status`, `priority`, `search`, ...).
/// Updates merge into the existing set: incoming keys override, other keys
/// are kept, and a key carrying an empty value is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskFilters(BTreeMap<String, String>);

impl TaskFilters {
    /// An empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a constraint, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Marks `key` for removal when this set is merged into another,
    /// builder style.
    #[must_use]
    pub fn without(self, key: impl Into<String>) -> Self {
        self.with(key, String::new())
    }

    /// Adds or replaces the `status` constraint, builder style.
    #[must_use]
    pub fn with_status(self, status: &TaskStatus) -> Self {
        self.with("status", status.as_str())
    }

    /// Adds or replaces a constraint.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes a constraint, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns the value of a constraint.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the `status` constraint, if any.
    #[must_use]
    pub fn status(&self) -> Option<TaskStatus> {
        self.get("status").map(TaskStatus::from)
    }

    /// Shallow merge: every key in `other` overrides the same key here.
    /// Keys with an empty value in `other` are removed instead.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            if value.is_empty() {
                self.0.remove(key);
            } else {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Iterates constraints in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `task` satisfies every constraint by exact match.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.iter()
            .all(|(key, value)| task.field_value(key).as_deref() == Some(value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaskFilters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
