use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{Stats, Todo, UpdateTodo};
use crate::store::{validate_title, TodoStore};

struct MemoryInner {
    todos: Vec<Todo>, // insertion order
    next_id: i64,
}

/// In-memory `TodoStore`. Contents are lost on restart.
///
/// Ids come from a counter that only moves forward, so a deleted id is never
/// handed out again.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            inner: Arc::new(RwLock::new(MemoryInner {
                todos: Vec::new(),
                next_id: 1,
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.inner.read().await.todos.clone())
    }

    async fn create(&self, title: &str) -> Result<Todo, StoreError> {
        let title = validate_title(title)?;
        let mut g = self.inner.write().await;
        let todo = Todo {
            id: g.next_id,
            title,
            completed: false,
            created_at: None,
            updated_at: None,
        };
        g.next_id += 1;
        g.todos.push(todo.clone());
        Ok(todo)
    }

    async fn get(&self, id: i64) -> Result<Todo, StoreError> {
        let g = self.inner.read().await;
        g.todos
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: i64, changes: UpdateTodo) -> Result<Todo, StoreError> {
        let title = changes.title.as_deref().map(validate_title).transpose()?;
        let mut g = self.inner.write().await;
        let slot = g
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let updated = Todo {
            title: title.unwrap_or_else(|| slot.title.clone()),
            completed: changes.completed.unwrap_or(slot.completed),
            ..slot.clone()
        };
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut g = self.inner.write().await;
        let before = g.todos.len();
        g.todos.retain(|t| t.id != id);
        if g.todos.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, StoreError> {
        let g = self.inner.read().await;
        let completed = g.todos.iter().filter(|t| t.completed).count() as u64;
        Ok(Stats::new(g.todos.len() as u64, completed))
    }
}
