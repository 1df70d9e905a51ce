//! # Upkeep
//!
//! Personal task/checklist server with recurring-task rescheduling.
//!
//! This library provides:
//! - HTTP APIs for task lists, tasks, completion, and snoozing
//! - A recurrence engine that computes the next due date when a recurring
//!   task is completed (periodic intervals, calendar month arithmetic,
//!   prohibited months)
//! - A WebSocket change feed so clients see live updates
//!
//! ## Completion Flow
//! 1. Receive a task update via `PATCH /tasks/{id}`
//! 2. The store applies the changeset and reports whether the completion
//!    flag freshly flipped from unset to set
//! 3. On a fresh flip of a recurring task, the lifecycle planner picks an
//!    anchor date and asks the recurrence engine for the next due date
//! 4. A follow-up task is persisted and both events are broadcast, the
//!    completion update first
//!
//! ## Modules
//! - `recurrence`: pure next-due-date calculation
//! - `lifecycle`: follow-up planning on task completion
//! - `storage`: in-memory and JSON-file-backed task stores
//! - `api`: axum routes, request validation, and the WebSocket change feed

pub mod api;
pub mod config;
pub mod lifecycle;
pub mod recurrence;
pub mod storage;

pub use config::Config;
pub use storage::{FileStore, MemoryStore, Store};
