//! In-memory storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{NewTask, StoredList, StoredTask, TaskChanges, TaskUpdateOutcome};
use super::Store;

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<u64, StoredTask>,
    lists: HashMap<u64, StoredList>,
    next_task_id: u64,
    next_list_id: u64,
}

/// In-memory store. Contents are lost when the process exits.
///
/// One `RwLock` guards all records; `update_task` holds the write lock
/// across the read-modify-write, which is what makes completion-transition
/// detection atomic.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_task_id: 1,
                next_list_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_tasks(&self, list_id: u64) -> Vec<StoredTask> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<_> = inner
            .tasks
            .values()
            .filter(|t| t.list_id == list_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    async fn get_task(&self, task_id: u64) -> Option<StoredTask> {
        let inner = self.inner.read().await;
        inner.tasks.get(&task_id).cloned()
    }

    async fn create_task(&self, new: NewTask) -> StoredTask {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let id = inner.next_task_id;
        inner.next_task_id += 1;
        let task = StoredTask {
            id,
            list_id: new.list_id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            due_date: new.due_date,
            reschedule_period: new.reschedule_period,
            reschedule_base: new.reschedule_base,
            prohibited_months: new.prohibited_months,
            constraints: new.constraints,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(id, task.clone());
        task
    }

    async fn update_task(&self, task_id: u64, changes: TaskChanges) -> Option<TaskUpdateOutcome> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let task = inner.tasks.get(&task_id)?;
        let was_completed = task.completed;
        let next = task.apply(&changes, now);
        let completion_was_fresh = !was_completed && next.completed;
        inner.tasks.insert(task_id, next.clone());
        Some(TaskUpdateOutcome {
            task: next,
            completion_was_fresh,
        })
    }

    async fn delete_task(&self, task_id: u64) -> bool {
        let mut inner = self.inner.write().await;
        inner.tasks.remove(&task_id).is_some()
    }

    async fn list_lists(&self) -> Vec<StoredList> {
        let inner = self.inner.read().await;
        let mut lists: Vec<_> = inner.lists.values().cloned().collect();
        lists.sort_by_key(|l| l.id);
        lists
    }

    async fn create_list(&self, name: String) -> StoredList {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let id = inner.next_list_id;
        inner.next_list_id += 1;
        let list = StoredList {
            id,
            name,
            created_at: now,
            updated_at: now,
        };
        inner.lists.insert(id, list.clone());
        list
    }

    async fn get_list(&self, list_id: u64) -> Option<StoredList> {
        let inner = self.inner.read().await;
        inner.lists.get(&list_id).cloned()
    }

    async fn rename_list(&self, list_id: u64, name: String) -> Option<StoredList> {
        let mut inner = self.inner.write().await;
        let list = inner.lists.get_mut(&list_id)?;
        list.name = name;
        list.updated_at = Utc::now();
        Some(list.clone())
    }

    async fn delete_list(&self, list_id: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.lists.remove(&list_id).is_none() {
            return false;
        }
        // Tasks belonging to the list go with it.
        inner.tasks.retain(|_, t| t.list_id != list_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::RescheduleBase;

    fn new_task(list_id: u64, title: &str) -> NewTask {
        NewTask {
            list_id,
            title: title.to_string(),
            description: None,
            completed: false,
            due_date: None,
            reschedule_period: Some("1w".to_string()),
            reschedule_base: RescheduleBase::Completed,
            prohibited_months: vec![],
            constraints: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_get_task() {
        let store = MemoryStore::new();
        let created = store.create_task(new_task(1, "Water plants")).await;
        assert_eq!(created.id, 1);
        let fetched = store.get_task(created.id).await.unwrap();
        assert_eq!(fetched.title, "Water plants");
        assert!(!fetched.completed);
    }

    #[tokio::test]
    async fn test_completion_transition_is_edge_triggered() {
        let store = MemoryStore::new();
        let task = store.create_task(new_task(1, "Descale kettle")).await;

        let changes = TaskChanges {
            completed: Some(true),
            ..Default::default()
        };
        let first = store.update_task(task.id, changes.clone()).await.unwrap();
        assert!(first.completion_was_fresh);
        assert!(first.task.completed_at.is_some());

        // Same PATCH again: still completed, but no fresh transition.
        let second = store.update_task(task.id, changes).await.unwrap();
        assert!(!second.completion_was_fresh);
    }

    #[tokio::test]
    async fn test_uncomplete_then_complete_is_fresh_again() {
        let store = MemoryStore::new();
        let task = store.create_task(new_task(1, "Flip mattress")).await;

        let complete = TaskChanges {
            completed: Some(true),
            ..Default::default()
        };
        let uncomplete = TaskChanges {
            completed: Some(false),
            ..Default::default()
        };
        assert!(
            store
                .update_task(task.id, complete.clone())
                .await
                .unwrap()
                .completion_was_fresh
        );
        let reopened = store.update_task(task.id, uncomplete).await.unwrap();
        assert!(!reopened.completion_was_fresh);
        assert!(reopened.task.completed_at.is_none());
        assert!(
            store
                .update_task(task.id, complete)
                .await
                .unwrap()
                .completion_was_fresh
        );
    }

    #[tokio::test]
    async fn test_update_missing_task_returns_none() {
        let store = MemoryStore::new();
        assert!(store.update_task(42, TaskChanges::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_list_removes_its_tasks() {
        let store = MemoryStore::new();
        let list = store.create_list("Garden".to_string()).await;
        let other = store.create_list("Kitchen".to_string()).await;
        let t1 = store.create_task(new_task(list.id, "Weed beds")).await;
        let t2 = store.create_task(new_task(other.id, "Clean oven")).await;

        assert!(store.delete_list(list.id).await);
        assert!(store.get_task(t1.id).await.is_none());
        assert!(store.get_task(t2.id).await.is_some());
        assert!(!store.delete_list(list.id).await);
    }

    #[tokio::test]
    async fn test_list_tasks_filters_by_list() {
        let store = MemoryStore::new();
        store.create_task(new_task(1, "a")).await;
        store.create_task(new_task(2, "b")).await;
        store.create_task(new_task(1, "c")).await;

        let tasks = store.list_tasks(1).await;
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.list_id == 1));
    }

    #[tokio::test]
    async fn test_rename_list() {
        let store = MemoryStore::new();
        let list = store.create_list("Hous".to_string()).await;
        let renamed = store
            .rename_list(list.id, "House".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.name, "House");
        assert!(store.rename_list(99, "x".to_string()).await.is_none());
    }
}
