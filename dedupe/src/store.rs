//! Boundaries between the engine and the application around it.
//!
//! The engine never fetches contacts itself: matching reads a
//! `SnapshotProvider`, and merging writes through a `RecordStore`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Contact, ContactPatch};

use crate::error::StoreError;

/// Collections holding records that point at a contact by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentCollection {
    Deals,
    Activities,
    Messages,
    ScheduledEvents,
}

impl DependentCollection {
    pub const ALL: [DependentCollection; 4] = [
        DependentCollection::Deals,
        DependentCollection::Activities,
        DependentCollection::Messages,
        DependentCollection::ScheduledEvents,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            DependentCollection::Deals => "deals",
            DependentCollection::Activities => "activities",
            DependentCollection::Messages => "messages",
            DependentCollection::ScheduledEvents => "scheduled_events",
        }
    }
}

/// Mutation primitives of the persistent store. Each call succeeds or fails
/// on its own; there is no transaction spanning calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether the underlying connection is usable at all.
    async fn is_configured(&self) -> bool;

    async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<(), StoreError>;

    /// Ids of the records in `collection` that reference `contact_id`.
    async fn query_dependents(
        &self,
        collection: DependentCollection,
        contact_id: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Point one dependent record at `contact_id`.
    async fn reassign_dependent(
        &self,
        collection: DependentCollection,
        record_id: &str,
        contact_id: &str,
    ) -> Result<(), StoreError>;

    async fn delete_contact(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub enum SnapshotChange {
    /// Apply a patch to a contact still in the snapshot. Ignored if the
    /// contact is gone.
    Patched {
        id: String,
        patch: ContactPatch,
        updated_at: i64,
    },
    Removed(String),
}

/// In-memory view of the contact set. Every applied change bumps `generation`, which
/// callers use to notice that matching input changed.
pub trait SnapshotProvider: Send + Sync {
    fn contacts(&self) -> Vec<Contact>;

    fn generation(&self) -> u64;

    fn apply(&self, change: SnapshotChange);
}

/// `SnapshotProvider` backed by a plain vector in load order.
#[derive(Default)]
pub struct ContactCache {
    contacts: RwLock<Vec<Contact>>,
    generation: AtomicU64,
}

impl ContactCache {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: RwLock::new(contacts),
            generation: AtomicU64::new(0),
        }
    }

    pub fn replace_all(&self, contacts: Vec<Contact>) {
        let mut guard = self.contacts.write().unwrap_or_else(|e| e.into_inner());
        *guard = contacts;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, id: &str) -> Option<Contact> {
        let guard = self.contacts.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().find(|c| c.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.contacts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotProvider for ContactCache {
    fn contacts(&self) -> Vec<Contact> {
        self.contacts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn apply(&self, change: SnapshotChange) {
        let mut guard = self.contacts.write().unwrap_or_else(|e| e.into_inner());
        let changed = match change {
            SnapshotChange::Patched {
                id,
                patch,
                updated_at,
            } => match guard.iter_mut().find(|c| c.id == id) {
                Some(existing) => {
                    patch.apply_to(existing);
                    existing.updated_at = updated_at;
                    true
                }
                None => false,
            },
            SnapshotChange::Removed(id) => {
                let before = guard.len();
                guard.retain(|c| c.id != id);
                guard.len() != before
            }
        };
        if changed {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }
}
