//! Task endpoints.
//!
//! `PATCH /tasks/{id}` is where task completion meets the recurrence engine:
//! the store applies the changeset and reports whether the completion flag
//! freshly flipped, the lifecycle planner turns a fresh flip of a recurring
//! task into a follow-up spec, and the follow-up is persisted here. Events
//! go out update-first so observers never see a follow-up before its
//! trigger.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;
use serde::Deserialize;

use super::events::ChangeEvent;
use super::routes::AppState;
use super::types::{CreateTaskRequest, SnoozeTaskRequest, TaskUpdateResponse, UpdateTaskRequest};
use crate::lifecycle;
use crate::recurrence;
use crate::storage::models::{StoredTask, TaskChanges};
use crate::storage::Store;

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub list_id: u64,
}

/// List all tasks in a list.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTasksQuery>,
) -> Json<Vec<StoredTask>> {
    Json(state.store.list_tasks(params.list_id).await)
}

/// Get a task by id.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<StoredTask>, (StatusCode, String)> {
    state
        .store
        .get_task(id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))
}

/// Create a new task.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<StoredTask>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let task = state.store.create_task(payload.into_new_task()).await;
    state.events.publish(&ChangeEvent::TaskCreated {
        list_id: task.list_id,
        task: task.clone(),
    });

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task, creating a follow-up when a recurring task is completed.
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskUpdateResponse>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let outcome = state
        .store
        .update_task(id, payload.to_changes())
        .await
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    // A fresh completion of a recurring task spawns its next occurrence.
    let plan = lifecycle::plan_follow_up(
        &outcome.task,
        outcome.completion_was_fresh,
        payload.updated_at,
        Local::now().date_naive(),
    )
    .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let created_task = match plan {
        Some(spec) => {
            let follow_up = state.store.create_task(spec).await;
            tracing::info!(
                "Task {} completed, created follow-up {} due {:?}",
                outcome.task.id,
                follow_up.id,
                follow_up.due_date
            );
            Some(follow_up)
        }
        None => None,
    };

    // Completion update first, then the follow-up it triggered.
    state.events.publish(&ChangeEvent::TaskUpdated {
        list_id: outcome.task.list_id,
        task: outcome.task.clone(),
        created_task: created_task.clone(),
    });
    if let Some(follow_up) = &created_task {
        state.events.publish(&ChangeEvent::TaskCreated {
            list_id: follow_up.list_id,
            task: follow_up.clone(),
        });
    }

    Ok(Json(TaskUpdateResponse {
        task: outcome.task,
        created_task,
    }))
}

/// Snooze a task: push its due date out by a period from the client's
/// current date (or the server's, if the client sent no timestamp).
pub async fn snooze_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<SnoozeTaskRequest>,
) -> Result<Json<StoredTask>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let base_date = payload
        .updated_at
        .map(|ts| ts.date_naive())
        .unwrap_or_else(|| Local::now().date_naive());
    // Snoozing ignores prohibited months; it is an explicit user choice.
    let new_due = recurrence::compute_next_due(base_date, &payload.period, &[])
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let changes = TaskChanges {
        due_date: Some(new_due),
        ..Default::default()
    };
    let outcome = state
        .store
        .update_task(id, changes)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    state.events.publish(&ChangeEvent::TaskUpdated {
        list_id: outcome.task.list_id,
        task: outcome.task.clone(),
        created_task: None,
    });

    Ok(Json(outcome.task))
}

/// Delete a task.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    // Fetch first so the event can name the list it belonged to.
    let task = state
        .store
        .get_task(id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))?;

    if !state.store.delete_task(id).await {
        return Err((StatusCode::NOT_FOUND, "Task not found".to_string()));
    }

    state.events.publish(&ChangeEvent::TaskDeleted {
        list_id: task.list_id,
        task_id: id,
    });

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::ChangeFeed;
    use crate::config::Config;
    use crate::storage::models::RescheduleBase;
    use crate::storage::MemoryStore;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            config: Config::default(),
            store: Arc::new(MemoryStore::new()),
            events: ChangeFeed::new(),
        })
    }

    fn recurring_task() -> CreateTaskRequest {
        CreateTaskRequest {
            list_id: 1,
            title: "Change furnace filter".to_string(),
            description: None,
            completed: false,
            due_date: None,
            reschedule_period: Some("1w".to_string()),
            reschedule_base: RescheduleBase::Completed,
            prohibited_months: vec![],
            constraints: vec![],
        }
    }

    fn complete() -> UpdateTaskRequest {
        UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_completing_recurring_task_creates_follow_up() {
        let state = state();
        let (status, Json(task)) = create_task(State(state.clone()), Json(recurring_task()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(response) = update_task(State(state.clone()), Path(task.id), Json(complete()))
            .await
            .unwrap();
        assert!(response.task.completed);

        let follow_up = response.created_task.expect("follow-up task");
        assert!(!follow_up.completed);
        assert_ne!(follow_up.id, task.id);
        assert_eq!(follow_up.reschedule_period.as_deref(), Some("1w"));
        assert!(follow_up.due_date.is_some());
    }

    #[tokio::test]
    async fn test_repeated_completion_creates_no_duplicate() {
        let state = state();
        let (_, Json(task)) = create_task(State(state.clone()), Json(recurring_task()))
            .await
            .unwrap();

        let Json(first) = update_task(State(state.clone()), Path(task.id), Json(complete()))
            .await
            .unwrap();
        assert!(first.created_task.is_some());

        // Idempotent PATCH with completed: true again
        let Json(second) = update_task(State(state.clone()), Path(task.id), Json(complete()))
            .await
            .unwrap();
        assert!(second.task.completed);
        assert!(second.created_task.is_none());
    }

    #[tokio::test]
    async fn test_completing_non_recurring_task_creates_nothing() {
        let state = state();
        let mut req = recurring_task();
        req.reschedule_period = None;
        let (_, Json(task)) = create_task(State(state.clone()), Json(req)).await.unwrap();

        let Json(response) = update_task(State(state.clone()), Path(task.id), Json(complete()))
            .await
            .unwrap();
        assert!(response.task.completed);
        assert!(response.created_task.is_none());
    }

    #[tokio::test]
    async fn test_completion_events_come_update_first() {
        let state = state();
        let (_, Json(task)) = create_task(State(state.clone()), Json(recurring_task()))
            .await
            .unwrap();

        // Subscribe after creation so only the completion frames arrive.
        let mut rx = state.events.subscribe();

        update_task(State(state.clone()), Path(task.id), Json(complete()))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.contains("\"task_updated\""));
        assert!(second.contains("\"task_created\""));
    }

    #[tokio::test]
    async fn test_update_missing_task_is_404() {
        let state = state();
        let err = update_task(State(state), Path(999), Json(complete()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_period_is_rejected_before_storage() {
        let state = state();
        let mut req = recurring_task();
        req.reschedule_period = Some("whenever".to_string());
        let err = create_task(State(state.clone()), Json(req)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.store.list_tasks(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_snooze_moves_due_date() {
        let state = state();
        let (_, Json(task)) = create_task(State(state.clone()), Json(recurring_task()))
            .await
            .unwrap();

        let snooze = SnoozeTaskRequest {
            period: "3d".to_string(),
            updated_at: "2024-06-10T08:00:00+02:00".parse().ok(),
        };
        let Json(snoozed) = snooze_task(State(state), Path(task.id), Json(snooze))
            .await
            .unwrap();
        assert_eq!(
            snoozed.due_date,
            chrono::NaiveDate::from_ymd_opt(2024, 6, 13)
        );
        assert!(!snoozed.completed);
    }
}
