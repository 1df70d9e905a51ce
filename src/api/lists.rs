//! Task list endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::events::ChangeEvent;
use super::routes::AppState;
use super::types::ListPayload;
use crate::storage::models::StoredList;
use crate::storage::Store;

/// Get all task lists.
pub async fn list_lists(State(state): State<Arc<AppState>>) -> Json<Vec<StoredList>> {
    Json(state.store.list_lists().await)
}

/// Create a new task list.
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ListPayload>,
) -> Result<(StatusCode, Json<StoredList>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let list = state.store.create_list(payload.name).await;
    state
        .events
        .publish(&ChangeEvent::ListCreated { list: list.clone() });

    Ok((StatusCode::CREATED, Json(list)))
}

/// Get a list by id.
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<StoredList>, (StatusCode, String)> {
    state
        .store
        .get_list(id)
        .await
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "List not found".to_string()))
}

/// Rename a list.
pub async fn rename_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<ListPayload>,
) -> Result<Json<StoredList>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let list = state
        .store
        .rename_list(id, payload.name)
        .await
        .ok_or((StatusCode::NOT_FOUND, "List not found".to_string()))?;

    state
        .events
        .publish(&ChangeEvent::ListUpdated { list: list.clone() });

    Ok(Json(list))
}

/// Delete a list and all of its tasks.
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !state.store.delete_list(id).await {
        return Err((StatusCode::NOT_FOUND, "List not found".to_string()));
    }

    state
        .events
        .publish(&ChangeEvent::ListDeleted { list_id: id });

    Ok(StatusCode::NO_CONTENT)
}
