//! HTTP API for the Upkeep server.
//!
//! ## Endpoints
//!
//! - `GET /tasks?list_id={id}` - List tasks in a list
//! - `POST /tasks` - Create a task
//! - `GET /tasks/{id}` - Get a task
//! - `PATCH /tasks/{id}` - Update a task; completing a recurring task
//!   creates and returns a follow-up task
//! - `PATCH /tasks/{id}/snooze` - Push a task's due date out by a period
//! - `DELETE /tasks/{id}` - Delete a task
//! - `GET /lists` - List all task lists
//! - `POST /lists` - Create a task list
//! - `GET /lists/{id}` - Get a task list
//! - `PATCH /lists/{id}` - Rename a task list
//! - `DELETE /lists/{id}` - Delete a task list and its tasks
//! - `GET /ws` - WebSocket change feed

pub mod events;
mod lists;
pub mod routes;
mod tasks;
pub mod types;

pub use routes::{serve, AppState};
pub use types::*;
