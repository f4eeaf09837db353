//! Shared data model for `Taskdeck`.
//!
//! Task records and request payloads, list pagination and the remote
//! service's error document, plus the stateless validation rules callers
//! apply before handing a payload to the task store.

pub mod api;
pub mod task;
pub mod validation;
