//! Client-local mirror of the store with optimistic mutations.
//!
//! # Design
//! Every `begin_*` call applies its change immediately and returns a
//! [`Ticket`] holding the pre-mutation snapshot. The ticket comes back with
//! the store's answer through [`Mirror::commit`] or [`Mirror::rollback`].
//!
//! Entries are values: reconciliation builds a new [`MirrorEntry`] and swaps
//! it into place rather than patching fields.
//!
//! An entry removed by a delete that is still awaiting the store is parked
//! off to the side. Answers to edits issued before the delete keep settling
//! the parked value, so a failed delete puts back an entry that agrees with
//! everything the store said in the meantime.
//!
//! The mirror carries an epoch that increments on every wholesale
//! [`Mirror::replace_all`]. A ticket issued before the latest resync is stale
//! and its response is ignored, because the replacement list already reflects
//! whatever the store decided.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::types::Todo;

/// Local identity of a mirror entry. Exists before the store assigns an id
/// and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey(Uuid);

impl EntryKey {
    fn new() -> Self {
        EntryKey(Uuid::new_v4())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    pub key: EntryKey,
    /// Store id; `None` until a tentative creation is acknowledged.
    pub id: Option<i64>,
    pub title: String,
    pub completed: bool,
    in_flight: u32,
}

impl MirrorEntry {
    fn from_store(todo: Todo) -> Self {
        MirrorEntry {
            key: EntryKey::new(),
            id: Some(todo.id),
            title: todo.title,
            completed: todo.completed,
            in_flight: 0,
        }
    }

    /// True while at least one mutation on this entry awaits the store.
    pub fn pending(&self) -> bool {
        self.in_flight > 0
    }

    fn with_in_flight(&self, in_flight: u32) -> Self {
        MirrorEntry {
            in_flight,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Rename,
    SetCompleted,
    Delete,
}

/// Receipt for an optimistic change, redeemed once the store answers.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub key: EntryKey,
    pub kind: MutationKind,
    epoch: u64,
    /// Entry as it was before an edit; `None` for creations and deletes.
    snapshot: Option<MirrorEntry>,
    /// Index the entry occupied, used to reinsert a failed delete.
    position: usize,
}

/// What a commit or rollback did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Applied,
    /// The ticket predates the latest resync.
    Stale,
    /// The entry is not in the mirror: gone for good, or parked behind a
    /// pending delete.
    Orphaned,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("no entry {0} in the mirror")]
    UnknownEntry(EntryKey),
    #[error("entry {0} is still waiting for its store id")]
    Unsynced(EntryKey),
}

#[derive(Debug, Default)]
pub struct Mirror {
    entries: Vec<MirrorEntry>,
    /// Entries removed by a delete the store has not answered yet.
    parked: HashMap<EntryKey, MirrorEntry>,
    epoch: u64,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MirrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn get(&self, key: EntryKey) -> Option<&MirrorEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn find_by_id(&self, id: i64) -> Option<&MirrorEntry> {
        self.entries.iter().find(|e| e.id == Some(id))
    }

    fn position(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Store id of a visible, acknowledged entry.
    pub fn store_id(&self, key: EntryKey) -> Result<i64, MirrorError> {
        let position = self.synced_position(key)?;
        self.entries[position]
            .id
            .ok_or(MirrorError::Unsynced(key))
    }

    /// Current value of `key`, visible or parked.
    fn slot(&mut self, key: EntryKey) -> Option<&mut MirrorEntry> {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => Some(entry),
            None => self.parked.get_mut(&key),
        }
    }

    /// Discard every entry and load `todos` in store order. Outstanding
    /// tickets become stale.
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.entries = todos.into_iter().map(MirrorEntry::from_store).collect();
        self.parked.clear();
        self.epoch += 1;
    }

    /// Append a tentative entry with no store id.
    pub fn begin_create(&mut self, title: &str) -> Result<Ticket, MirrorError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MirrorError::EmptyTitle);
        }
        let entry = MirrorEntry {
            key: EntryKey::new(),
            id: None,
            title: title.to_string(),
            completed: false,
            in_flight: 1,
        };
        let ticket = Ticket {
            key: entry.key,
            kind: MutationKind::Create,
            epoch: self.epoch,
            snapshot: None,
            position: self.entries.len(),
        };
        self.entries.push(entry);
        Ok(ticket)
    }

    pub fn begin_rename(&mut self, key: EntryKey, title: &str) -> Result<Ticket, MirrorError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MirrorError::EmptyTitle);
        }
        self.begin_edit(key, MutationKind::Rename, |e| MirrorEntry {
            title: title.to_string(),
            ..e.clone()
        })
    }

    pub fn begin_set_completed(
        &mut self,
        key: EntryKey,
        completed: bool,
    ) -> Result<Ticket, MirrorError> {
        self.begin_edit(key, MutationKind::SetCompleted, |e| MirrorEntry {
            completed,
            ..e.clone()
        })
    }

    /// Remove the entry locally; a failed delete puts it back.
    pub fn begin_delete(&mut self, key: EntryKey) -> Result<Ticket, MirrorError> {
        let position = self.synced_position(key)?;
        let removed = self.entries.remove(position);
        let ticket = Ticket {
            key,
            kind: MutationKind::Delete,
            epoch: self.epoch,
            snapshot: None,
            position,
        };
        self.parked.insert(key, removed);
        Ok(ticket)
    }

    fn synced_position(&self, key: EntryKey) -> Result<usize, MirrorError> {
        let position = self.position(key).ok_or(MirrorError::UnknownEntry(key))?;
        if self.entries[position].id.is_none() {
            return Err(MirrorError::Unsynced(key));
        }
        Ok(position)
    }

    fn begin_edit(
        &mut self,
        key: EntryKey,
        kind: MutationKind,
        change: impl FnOnce(&MirrorEntry) -> MirrorEntry,
    ) -> Result<Ticket, MirrorError> {
        let position = self.synced_position(key)?;
        let before = self.entries[position].clone();
        let after = change(&before).with_in_flight(before.in_flight + 1);
        self.entries[position] = after;
        Ok(Ticket {
            key,
            kind,
            epoch: self.epoch,
            snapshot: Some(before),
            position,
        })
    }

    /// Merge the store's answer. `todo` is `None` for deletes.
    pub fn commit(&mut self, ticket: &Ticket, todo: Option<Todo>) -> Reconcile {
        if ticket.epoch != self.epoch {
            return Reconcile::Stale;
        }
        if ticket.kind == MutationKind::Delete {
            self.parked.remove(&ticket.key);
            return Reconcile::Applied;
        }
        let visible = self.position(ticket.key).is_some();
        let Some(slot) = self.slot(ticket.key) else {
            return Reconcile::Orphaned;
        };
        let in_flight = slot.in_flight.saturating_sub(1);
        let merged = match todo {
            Some(todo) => MirrorEntry {
                key: slot.key,
                id: Some(todo.id),
                title: todo.title,
                completed: todo.completed,
                in_flight,
            },
            None => slot.with_in_flight(in_flight),
        };
        *slot = merged;
        settled(visible)
    }

    /// Undo the optimistic change described by `ticket`.
    pub fn rollback(&mut self, ticket: &Ticket) -> Reconcile {
        if ticket.epoch != self.epoch {
            return Reconcile::Stale;
        }
        match (ticket.kind, &ticket.snapshot) {
            (MutationKind::Create, _) => match self.position(ticket.key) {
                Some(position) => {
                    self.entries.remove(position);
                    Reconcile::Applied
                }
                None => Reconcile::Orphaned,
            },
            (MutationKind::Delete, _) => {
                let Some(entry) = self.parked.remove(&ticket.key) else {
                    return Reconcile::Orphaned;
                };
                let position = ticket.position.min(self.entries.len());
                self.entries.insert(position, entry);
                Reconcile::Applied
            }
            (kind, Some(snapshot)) => {
                let visible = self.position(ticket.key).is_some();
                let Some(slot) = self.slot(ticket.key) else {
                    return Reconcile::Orphaned;
                };
                // Only the field this mutation changed goes back.
                let restored = match kind {
                    MutationKind::Rename => MirrorEntry {
                        title: snapshot.title.clone(),
                        ..slot.clone()
                    },
                    _ => MirrorEntry {
                        completed: snapshot.completed,
                        ..slot.clone()
                    },
                };
                *slot = restored.with_in_flight(slot.in_flight.saturating_sub(1));
                settled(visible)
            }
            (_, None) => Reconcile::Orphaned,
        }
    }
}

fn settled(visible: bool) -> Reconcile {
    if visible {
        Reconcile::Applied
    } else {
        Reconcile::Orphaned
    }
}
