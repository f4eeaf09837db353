//! `Taskdeck`: client-side task list synchronization.
//!
//! The [`store::TaskStore`] caches one page of tasks from a remote service
//! behind the [`api::TaskApi`] seam and keeps it consistent as tasks are
//! created, edited, completed and deleted.

pub mod api;
pub mod auth;
pub mod config;
pub mod store;
