//! HTTP todo store.
//!
//! # Overview
//! Serves create/list/get/update/delete/stats over JSON plus a `/health`
//! liveness probe. The router is generic over [`TodoStore`], so the same
//! handlers run against the in-memory or the SQLite backend.
//!
//! # Design
//! - The store is an owned instance handed to [`app`] and shared through axum
//!   state; there is no module-level collection.
//! - Handlers return `Result<_, StoreError>`; the error type renders itself as
//!   a status code plus `{"detail": ...}` body.

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

pub mod error;
pub mod memory;
pub mod model;
mod routes;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use model::{Health, Stats, Todo, UpdateTodo};
pub use sqlite::SqliteStore;
pub use store::TodoStore;

pub fn app<S: TodoStore>(store: S) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/todos",
            get(routes::list_todos::<S>).post(routes::create_todo::<S>),
        )
        .route("/todos/stats/summary", get(routes::stats_summary::<S>))
        .route(
            "/todos/{id}",
            get(routes::get_todo::<S>)
                .put(routes::update_todo::<S>)
                .delete(routes::delete_todo::<S>),
        )
        .with_state(Arc::new(store))
}

pub async fn run<S: TodoStore>(listener: TcpListener, store: S) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "todo store listening");
    }
    axum::serve(listener, app(store)).await
}
