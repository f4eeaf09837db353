//! Remote task service abstraction.
//!
//! Defines the [`TaskApi`] trait the task store talks to. Implementations:
//! - [`http::HttpTaskApi`]: JSON over HTTP against the real service
//! - [`memory::InMemoryTaskApi`]: in-process fake for tests and offline use

pub mod http;
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use taskdeck_proto::api::{ErrorDetail, PageRequest, Paginated};
use taskdeck_proto::task::{CreateTaskRequest, Task, TaskFilters, TaskId, UpdateTaskRequest};

/// Errors reported by a [`TaskApi`] implementation.
///
/// The store does not distinguish between these: every variant ends up as
/// the same generic user-facing message. They exist for logging and for
/// callers of `create`/`update` that want to react to specific failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout.
    #[error("request to task service timed out")]
    Timeout,

    /// The service could not be reached at all.
    #[error("task service unreachable: {0}")]
    Unreachable(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("task service returned HTTP {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error document sent by the service.
        detail: ErrorDetail,
    },

    /// A success response whose body could not be decoded.
    #[error("failed to decode task service response: {0}")]
    Decode(String),

    /// The request could not be built (bad base URL, bad identifier).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Builds a status error with a plain message detail.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: ErrorDetail::Message(message.into()),
        }
    }

    /// HTTP status code, if the service answered at all.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 401 and 403 responses.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }

    /// Returns `true` for 404 responses.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status_code(), Some(404))
    }
}

/// Async access to the remote task service.
///
/// Every call is a single request: implementations do not retry, queue or
/// coalesce. The service is the source of truth; whatever it returns is
/// what the store caches.
pub trait TaskApi: Send + Sync {
    /// Fetches one page of tasks matching `filters`.
    fn list(
        &self,
        filters: &TaskFilters,
        page: PageRequest,
    ) -> impl Future<Output = Result<Paginated<Task>, ApiError>> + Send;

    /// Creates a task and returns the stored record.
    fn create(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Applies a partial update and returns the stored record.
    fn update(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Deletes a task.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: TaskApi> TaskApi for Arc<T> {
    fn list(
        &self,
        filters: &TaskFilters,
        page: PageRequest,
    ) -> impl Future<Output = Result<Paginated<Task>, ApiError>> + Send {
        (**self).list(filters, page)
    }

    fn create(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send {
        (**self).create(request)
    }

    fn update(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send {
        (**self).update(id, request)
    }

    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).delete(id)
    }
}
