use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::StoreError;
use crate::model::{CreateTodo, Deleted, Health, Stats, Todo, UpdateTodo};
use crate::store::TodoStore;

pub(crate) async fn health() -> Json<Health> {
    Json(Health::ok())
}

pub(crate) async fn list_todos<S: TodoStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<Todo>>, StoreError> {
    Ok(Json(store.list().await?))
}

pub(crate) async fn create_todo<S: TodoStore>(
    State(store): State<Arc<S>>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), StoreError> {
    let todo = store.create(&input.title).await?;
    tracing::info!(id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

pub(crate) async fn get_todo<S: TodoStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, StoreError> {
    Ok(Json(store.get(id).await?))
}

pub(crate) async fn update_todo<S: TodoStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StoreError> {
    let todo = store.update(id, input).await?;
    tracing::debug!(id, completed = todo.completed, "todo updated");
    Ok(Json(todo))
}

pub(crate) async fn delete_todo<S: TodoStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>, StoreError> {
    store.delete(id).await?;
    tracing::info!(id, "todo deleted");
    Ok(Json(Deleted { ok: true }))
}

pub(crate) async fn stats_summary<S: TodoStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Stats>, StoreError> {
    Ok(Json(store.stats().await?))
}
