//! Persistent `TodoStore` backed by a single SQLite table.
//!
//! The connection lives behind a mutex and every query runs on tokio's
//! blocking pool, so handlers never block a runtime worker on disk I/O.
//! File databases use WAL and a busy timeout; in-memory databases (tests)
//! skip the journal pragma.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::model::{Stats, Todo, UpdateTodo};
use crate::store::{validate_title, TodoStore};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS todos (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT    NOT NULL,
    completed  INTEGER NOT NULL DEFAULT 0,
    created_at TEXT    NOT NULL,
    updated_at TEXT    NOT NULL
)";

const SELECT_COLUMNS: &str = "SELECT id, title, completed, created_at, updated_at FROM todos";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the table exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("create directory {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        let _journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        tracing::info!(path = %path.display(), "opened sqlite todo store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        conn.execute(SCHEMA, [])?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("connection mutex poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        completed: row.get(2)?,
        created_at: Some(row.get(3)?),
        updated_at: Some(row.get(4)?),
    })
}

fn fetch(conn: &Connection, id: i64) -> Result<Todo, StoreError> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        row_to_todo,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

impl TodoStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"))?;
            let rows = stmt.query_map([], row_to_todo)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn create(&self, title: &str) -> Result<Todo, StoreError> {
        let title = validate_title(title)?;
        self.with_conn(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO todos (title, completed, created_at, updated_at) VALUES (?1, 0, ?2, ?2)",
                params![title, now],
            )?;
            let todo = Todo {
                id: conn.last_insert_rowid(),
                title,
                completed: false,
                created_at: Some(now),
                updated_at: Some(now),
            };
            tracing::debug!(id = todo.id, "inserted todo");
            Ok(todo)
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Todo, StoreError> {
        self.with_conn(move |conn| fetch(conn, id)).await
    }

    async fn update(&self, id: i64, changes: UpdateTodo) -> Result<Todo, StoreError> {
        let title = changes.title.as_deref().map(validate_title).transpose()?;
        let completed = changes.completed;
        self.with_conn(move |conn| {
            let current = fetch(conn, id)?;
            let updated = Todo {
                title: title.unwrap_or(current.title),
                completed: completed.unwrap_or(current.completed),
                updated_at: Some(Utc::now()),
                ..current
            };
            conn.execute(
                "UPDATE todos SET title = ?1, completed = ?2, updated_at = ?3 WHERE id = ?4",
                params![updated.title, updated.completed, updated.updated_at, id],
            )?;
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
            if removed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn stats(&self) -> Result<Stats, StoreError> {
        self.with_conn(|conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM todos",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(Stats::new(total as u64, completed as u64))
        })
        .await
    }
}
