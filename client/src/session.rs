//! UI-facing owner of the mirror.
//!
//! # Design
//! A `Session` lives on whatever task drives the UI. Mutating calls apply to
//! the mirror synchronously and return at once; the store request runs on a
//! spawned task that posts its outcome back over an mpsc channel. Only the
//! session touches the mirror, when the owner drains that channel with
//! [`Session::next_update`] or [`Session::try_next_update`].
//!
//! The health monitor is one more producer on the same channel. A report that
//! says the store came back triggers a full reload of the mirror.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::filter::{project, Filter, View};
use crate::http::{HttpRequest, HttpResponse};
use crate::mirror::{EntryKey, Mirror, MirrorError, MutationKind, Reconcile, Ticket};
use crate::monitor::{self, ConnectionState, MonitorCommand, ProbeReport};
use crate::transport::{execute_with_timeout, Transport};
use crate::types::{CreateTodo, Stats, Todo, UpdateTodo};

/// What draining one message did.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// The store acknowledged a mutation and the mirror now reflects it.
    Committed { key: EntryKey, kind: MutationKind },
    /// The store refused or never answered; the entry was reverted.
    RolledBack {
        key: EntryKey,
        kind: MutationKind,
        error: ApiError,
    },
    /// A response arrived for an entry that is gone or predates a resync.
    Ignored { key: EntryKey, reason: Reconcile },
    Connection(ProbeReport),
    Resynced { count: usize },
    ResyncFailed(ApiError),
}

#[derive(Debug)]
enum Message {
    Mutation {
        ticket: Ticket,
        outcome: Result<Option<Todo>, ApiError>,
    },
    Resync(Result<Vec<Todo>, ApiError>),
    Probe(ProbeReport),
}

impl From<ProbeReport> for Message {
    fn from(report: ProbeReport) -> Self {
        Message::Probe(report)
    }
}

struct MonitorHandle {
    commands: mpsc::UnboundedSender<MonitorCommand>,
    task: JoinHandle<()>,
}

pub struct Session<T: Transport> {
    config: ClientConfig,
    client: TodoClient,
    transport: Arc<T>,
    mirror: Mirror,
    connection: ConnectionState,
    retry_count: u32,
    status: String,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    monitor: Option<MonitorHandle>,
}

impl<T: Transport> Session<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Session {
            client: config.client(),
            config,
            transport: Arc::new(transport),
            mirror: Mirror::new(),
            connection: ConnectionState::Unknown,
            retry_count: 0,
            status: "Checking backend...".to_string(),
            tx,
            rx,
            monitor: None,
        }
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub fn view(&self, filter: Filter) -> View<'_> {
        project(self.mirror.entries(), filter)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Human-readable connection or failure status.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Spawn the health monitor. Must be called inside a tokio runtime. The
    /// monitor runs until the session is dropped.
    pub fn start_monitor(&mut self) {
        if self.monitor.is_some() {
            return;
        }
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(monitor::run(
            self.client.clone(),
            Arc::clone(&self.transport),
            self.config.clone(),
            command_rx,
            self.tx.clone(),
        ));
        self.monitor = Some(MonitorHandle { commands, task });
    }

    /// Reset the retry counter and probe immediately, leaving the scheduled
    /// loop in place.
    pub fn retry_now(&mut self) {
        self.retry_count = 0;
        self.status = "Connecting...".to_string();
        match &self.monitor {
            Some(handle) => {
                if handle.commands.send(MonitorCommand::RetryNow).is_err() {
                    tracing::warn!("health monitor is no longer running");
                }
            }
            None => self.start_monitor(),
        }
    }

    /// Reload the whole mirror from the store.
    pub fn resync(&self) {
        self.spawn_request(Ok(self.client.build_list_todos()), |client, response| {
            Message::Resync(response.and_then(|r| client.parse_list_todos(r)))
        });
    }

    pub fn create(&mut self, title: &str) -> Result<EntryKey, MirrorError> {
        let ticket = self.mirror.begin_create(title)?;
        let key = ticket.key;
        let request = self.client.build_create_todo(&CreateTodo {
            title: title.trim().to_string(),
        });
        self.dispatch(ticket, request);
        Ok(key)
    }

    pub fn rename(&mut self, key: EntryKey, title: &str) -> Result<(), MirrorError> {
        let id = self.mirror.store_id(key)?;
        let ticket = self.mirror.begin_rename(key, title)?;
        let changes = UpdateTodo {
            title: Some(title.trim().to_string()),
            completed: None,
        };
        let request = self.client.build_update_todo(id, &changes);
        self.dispatch(ticket, request);
        Ok(())
    }

    pub fn set_completed(&mut self, key: EntryKey, completed: bool) -> Result<(), MirrorError> {
        let id = self.mirror.store_id(key)?;
        let ticket = self.mirror.begin_set_completed(key, completed)?;
        let changes = UpdateTodo {
            title: None,
            completed: Some(completed),
        };
        let request = self.client.build_update_todo(id, &changes);
        self.dispatch(ticket, request);
        Ok(())
    }

    /// Flip `completed` and return the new value.
    pub fn toggle(&mut self, key: EntryKey) -> Result<bool, MirrorError> {
        let completed = !self
            .mirror
            .get(key)
            .ok_or(MirrorError::UnknownEntry(key))?
            .completed;
        self.set_completed(key, completed)?;
        Ok(completed)
    }

    pub fn delete(&mut self, key: EntryKey) -> Result<(), MirrorError> {
        let id = self.mirror.store_id(key)?;
        let ticket = self.mirror.begin_delete(key)?;
        self.dispatch(ticket, Ok(self.client.build_delete_todo(id)));
        Ok(())
    }

    /// Delete every completed entry that has a store id. Returns how many
    /// deletes were issued.
    pub fn clear_completed(&mut self) -> usize {
        let keys: Vec<EntryKey> = self
            .mirror
            .entries()
            .iter()
            .filter(|e| e.completed && e.id.is_some())
            .map(|e| e.key)
            .collect();
        keys.into_iter()
            .filter(|&key| self.delete(key).is_ok())
            .count()
    }

    /// One-off stats read, outside the mirror.
    pub async fn fetch_stats(&self) -> Result<Stats, ApiError> {
        let response = execute_with_timeout(&*self.transport, self.client.build_stats()).await?;
        self.client.parse_stats(response)
    }

    /// Wait for the next background result and apply it. The session keeps
    /// a sender of its own, so this only yields `None` if that invariant is
    /// broken.
    pub async fn next_update(&mut self) -> Option<Update> {
        let message = self.rx.recv().await?;
        Some(self.apply(message))
    }

    /// Apply the next background result if one is ready.
    pub fn try_next_update(&mut self) -> Option<Update> {
        let message = self.rx.try_recv().ok()?;
        Some(self.apply(message))
    }

    fn dispatch(&self, ticket: Ticket, request: Result<HttpRequest, ApiError>) {
        self.spawn_request(request, move |client, response| {
            let outcome = response.and_then(|r| parse_mutation(client, ticket.kind, r));
            Message::Mutation { ticket, outcome }
        });
    }

    fn spawn_request<F>(&self, request: Result<HttpRequest, ApiError>, finish: F)
    where
        F: FnOnce(&TodoClient, Result<HttpResponse, ApiError>) -> Message + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let response = match request {
                Ok(request) => execute_with_timeout(&*transport, request).await,
                Err(e) => Err(e),
            };
            // A dropped session has nothing left to reconcile.
            let _ = tx.send(finish(&client, response));
        });
    }

    fn apply(&mut self, message: Message) -> Update {
        match message {
            Message::Mutation { ticket, outcome } => self.reconcile(ticket, outcome),
            Message::Resync(Ok(todos)) => {
                let count = todos.len();
                self.mirror.replace_all(todos);
                tracing::debug!(count, epoch = self.mirror.epoch(), "mirror resynced");
                Update::Resynced { count }
            }
            Message::Resync(Err(error)) => {
                tracing::warn!(%error, "resync failed, keeping current mirror");
                Update::ResyncFailed(error)
            }
            Message::Probe(report) => {
                if report.state != self.connection {
                    tracing::info!(state = ?report.state, retry = report.retry_count, "connection changed");
                }
                self.connection = report.state;
                self.retry_count = report.retry_count;
                self.status = report.status_text();
                if report.reconnected {
                    self.resync();
                }
                Update::Connection(report)
            }
        }
    }

    fn reconcile(&mut self, ticket: Ticket, outcome: Result<Option<Todo>, ApiError>) -> Update {
        let key = ticket.key;
        let kind = ticket.kind;
        match outcome {
            Ok(todo) => match self.mirror.commit(&ticket, todo) {
                Reconcile::Applied => Update::Committed { key, kind },
                reason => Update::Ignored { key, reason },
            },
            Err(error) => {
                tracing::warn!(%key, ?kind, %error, "mutation failed");
                match self.mirror.rollback(&ticket) {
                    Reconcile::Applied => {
                        self.status = if error.is_transport() {
                            "Backend offline".to_string()
                        } else {
                            format!("Request failed: {error}")
                        };
                        Update::RolledBack { key, kind, error }
                    }
                    reason => Update::Ignored { key, reason },
                }
            }
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.task.abort();
        }
    }
}

fn parse_mutation(
    client: &TodoClient,
    kind: MutationKind,
    response: HttpResponse,
) -> Result<Option<Todo>, ApiError> {
    match kind {
        MutationKind::Create => client.parse_create_todo(response).map(Some),
        MutationKind::Rename | MutationKind::SetCompleted => {
            client.parse_update_todo(response).map(Some)
        }
        // Already gone on the store is as good as deleted.
        MutationKind::Delete => match client.parse_delete_todo(response) {
            Ok(()) | Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        },
    }
}
