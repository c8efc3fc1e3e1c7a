//! Resilient client core for the todo store.
//!
//! # Overview
//! Keeps a local mirror of the store, applies user changes to it
//! optimistically and reconciles them once the store answers. A background
//! health monitor tracks availability with capped exponential backoff and
//! reloads the mirror whenever the store comes back.
//!
//! # Design
//! - `TodoClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network; a [`Transport`] executes them.
//! - [`Mirror`], [`HealthMonitor`] and [`filter::project`] are pure state and
//!   are tested without a runtime.
//! - [`Session`] is the single owner of the mirror. Background tasks report
//!   over a channel instead of calling back into UI code.
//! - DTOs are defined independently from the store crate; integration tests
//!   run against the real store to catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod mirror;
pub mod monitor;
pub mod session;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use filter::{Filter, View};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mirror::{EntryKey, Mirror, MirrorEntry, MirrorError, MutationKind, Reconcile};
pub use monitor::{ConnectionState, HealthMonitor, ProbeReport};
pub use session::{Session, Update};
pub use transport::{Transport, UreqTransport};
pub use types::{CreateTodo, Stats, Todo, UpdateTodo};
