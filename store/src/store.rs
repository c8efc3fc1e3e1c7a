use std::future::Future;

use crate::error::StoreError;
use crate::model::{Stats, Todo, UpdateTodo};

/// Authoritative collection of todo items.
///
/// Methods return `impl Future + Send` so generic axum handlers can hold a
/// store across await points without an `async-trait` dependency. Each call is
/// validated on its own; nothing is transactional across calls.
pub trait TodoStore: Send + Sync + 'static {
    /// All items, newest first when the backend tracks timestamps, otherwise
    /// in insertion order.
    fn list(&self) -> impl Future<Output = Result<Vec<Todo>, StoreError>> + Send;

    /// Create an item with a fresh id. The title is trimmed and must not be
    /// empty.
    fn create(&self, title: &str) -> impl Future<Output = Result<Todo, StoreError>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = Result<Todo, StoreError>> + Send;

    /// Apply only the supplied fields and return the updated item.
    fn update(
        &self,
        id: i64,
        changes: UpdateTodo,
    ) -> impl Future<Output = Result<Todo, StoreError>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn stats(&self) -> impl Future<Output = Result<Stats, StoreError>> + Send;
}

/// Trim `raw` and reject it if nothing is left.
pub fn validate_title(raw: &str) -> Result<String, StoreError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}
