//! JSON-file storage backend.
//!
//! Each list is persisted as `list_<id>.json` in the storage directory,
//! holding the list record and all of its tasks. Files are rewritten in
//! full on every change, via a temp file and rename so readers never see a
//! half-written document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::models::{NewTask, StoredList, StoredTask, TaskChanges, TaskUpdateOutcome};
use super::Store;

const SCHEMA_VERSION: u32 = 1;

/// On-disk document for one list and its tasks.
#[derive(Debug, Serialize, Deserialize)]
struct ListDocument {
    version: u32,
    list: StoredList,
    tasks: Vec<StoredTask>,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<u64, StoredTask>,
    lists: HashMap<u64, StoredList>,
    next_task_id: u64,
    next_list_id: u64,
}

impl Inner {
    fn write_list_file(&self, root: &Path, list_id: u64) -> std::io::Result<()> {
        let path = file_for_list(root, list_id);
        let Some(list) = self.lists.get(&list_id) else {
            // List is gone: remove its file if present.
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            return Ok(());
        };

        let mut tasks: Vec<_> = self
            .tasks
            .values()
            .filter(|t| t.list_id == list_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);

        let doc = ListDocument {
            version: SCHEMA_VERSION,
            list: list.clone(),
            tasks,
        };
        let contents = serde_json::to_string_pretty(&doc)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Write a list file, logging instead of failing the request on error.
    fn save_list(&self, root: &Path, list_id: u64) {
        if let Err(e) = self.write_list_file(root, list_id) {
            tracing::error!("Failed to save list {} to disk: {}", list_id, e);
        }
    }
}

fn file_for_list(root: &Path, list_id: u64) -> PathBuf {
    root.join(format!("list_{}.json", list_id))
}

/// File-backed store. State is held in memory and mirrored to one JSON
/// document per list.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    inner: RwLock<Inner>,
}

impl FileStore {
    /// Open (or create) a store rooted at the given directory, loading all
    /// existing `list_*.json` files. Malformed files are skipped with a
    /// warning so one bad document cannot block startup.
    pub async fn open(root: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&root)?;

        let mut inner = Inner {
            next_task_id: 1,
            next_list_id: 1,
            ..Default::default()
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("list_") && n.ends_with(".json"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<ListDocument>(&c).map_err(|e| e.to_string()))
            {
                Ok(doc) => {
                    inner.lists.insert(doc.list.id, doc.list);
                    for task in doc.tasks {
                        inner.tasks.insert(task.id, task);
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed file {}: {}", path.display(), e);
                }
            }
        }

        if let Some(max) = inner.lists.keys().max() {
            inner.next_list_id = max + 1;
        }
        if let Some(max) = inner.tasks.keys().max() {
            inner.next_task_id = max + 1;
        }

        tracing::info!(
            "Loaded {} lists and {} tasks from {}",
            inner.lists.len(),
            inner.tasks.len(),
            root.display()
        );

        Ok(Self {
            root,
            inner: RwLock::new(inner),
        })
    }
}

#[async_trait]
impl Store for FileStore {
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

        // Materialize a placeholder list for tasks filed under an unknown id.
        if !inner.lists.contains_key(&task.list_id) {
            inner.lists.insert(
                task.list_id,
                StoredList {
                    id: task.list_id,
                    name: format!("List {}", task.list_id),
                    created_at: now,
                    updated_at: now,
                },
            );
            if task.list_id >= inner.next_list_id {
                inner.next_list_id = task.list_id + 1;
            }
        }

        inner.save_list(&self.root, task.list_id);
        task
    }

    async fn update_task(&self, task_id: u64, changes: TaskChanges) -> Option<TaskUpdateOutcome> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let task = inner.tasks.get(&task_id)?;
        let was_completed = task.completed;
        let old_list_id = task.list_id;
        let next = task.apply(&changes, now);
        let completion_was_fresh = !was_completed && next.completed;
        inner.tasks.insert(task_id, next.clone());

        inner.save_list(&self.root, next.list_id);
        if old_list_id != next.list_id {
            inner.save_list(&self.root, old_list_id);
        }
        Some(TaskUpdateOutcome {
            task: next,
            completion_was_fresh,
        })
    }

    async fn delete_task(&self, task_id: u64) -> bool {
        let mut inner = self.inner.write().await;
        let Some(task) = inner.tasks.remove(&task_id) else {
            return false;
        };
        inner.save_list(&self.root, task.list_id);
        true
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
        inner.save_list(&self.root, id);
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
        let renamed = list.clone();
        inner.save_list(&self.root, list_id);
        Some(renamed)
    }

    async fn delete_list(&self, list_id: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.lists.remove(&list_id).is_none() {
            return false;
        }
        inner.tasks.retain(|_, t| t.list_id != list_id);
        // save_list sees the list is gone and removes the file.
        inner.save_list(&self.root, list_id);
        true
    }
}
