//! Task and list storage.
//!
//! Two backends implement the same `Store` trait: `MemoryStore` keeps
//! everything in process memory, `FileStore` additionally persists each list
//! (with its tasks) as a JSON document on disk. Handlers hold the store as
//! `Arc<dyn Store>` and never care which one is behind it.

use async_trait::async_trait;

mod file;
mod memory;
pub mod models;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::{
    NewTask, RescheduleBase, StoredList, StoredTask, TaskChanges, TaskUpdateOutcome,
};

/// Storage interface for tasks and task lists.
///
/// Implementations must serialize task updates so that two concurrent
/// completions of the same task cannot both observe a fresh false-to-true
/// transition; holding a single write lock across the read-modify-write in
/// `update_task` is sufficient.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get all tasks belonging to a list.
    async fn list_tasks(&self, list_id: u64) -> Vec<StoredTask>;

    /// Get a task by id.
    async fn get_task(&self, task_id: u64) -> Option<StoredTask>;

    /// Create a new task.
    async fn create_task(&self, new: NewTask) -> StoredTask;

    /// Apply a changeset to a task.
    ///
    /// Returns the updated task plus whether this update freshly flipped the
    /// completion flag, or `None` if the task does not exist.
    async fn update_task(&self, task_id: u64, changes: TaskChanges) -> Option<TaskUpdateOutcome>;

    /// Delete a task. Returns false if it did not exist.
    async fn delete_task(&self, task_id: u64) -> bool;

    /// Get all task lists.
    async fn list_lists(&self) -> Vec<StoredList>;

    /// Create a new task list.
    async fn create_list(&self, name: String) -> StoredList;

    /// Get a list by id.
    async fn get_list(&self, list_id: u64) -> Option<StoredList>;

    /// Rename a list. Returns `None` if it does not exist.
    async fn rename_list(&self, list_id: u64, name: String) -> Option<StoredList>;

    /// Delete a list and all of its tasks. Returns false if it did not exist.
    async fn delete_list(&self, list_id: u64) -> bool;
}
