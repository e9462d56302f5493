//! Dismissal ledger: groups an operator has judged "not a duplicate".
//!
//! Dismissal is scoped to the exact member set. If a new contact later joins
//! a dismissed pair, the resulting group has a different key and is shown
//! again.

use std::collections::HashSet;
use std::sync::Mutex;

use shared_types::{group_key, DismissedEntry, DuplicateGroup, MatchType};
use tracing::info;

use crate::error::LedgerError;

/// Durable home of the serialized ledger. Read on demand, written on every
/// change.
pub trait LedgerStorage: Send + Sync {
    fn load(&self) -> Result<Vec<DismissedEntry>, LedgerError>;

    fn save(&self, entries: &[DismissedEntry]) -> Result<(), LedgerError>;
}

/// Keeps the serialized ledger in memory. Used in tests and when no durable
/// storage is configured.
#[derive(Default)]
pub struct MemoryLedgerStorage {
    serialized: Mutex<Option<String>>,
}

impl LedgerStorage for MemoryLedgerStorage {
    fn load(&self) -> Result<Vec<DismissedEntry>, LedgerError> {
        let guard = self
            .serialized
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        match guard.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[DismissedEntry]) -> Result<(), LedgerError> {
        let json = serde_json::to_string(entries)?;
        let mut guard = self
            .serialized
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        *guard = Some(json);
        Ok(())
    }
}

pub struct DismissalLedger {
    storage: Box<dyn LedgerStorage>,
    // Held across every load-modify-save
    write_lock: Mutex<()>,
}

impl DismissalLedger {
    pub fn new(storage: Box<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryLedgerStorage::default()))
    }

    pub fn dismiss(&self, group: &DuplicateGroup) -> Result<DismissedEntry, LedgerError> {
        self.dismiss_ids(&group.contact_ids(), group.match_type)
    }

    /// Dismisses the group made of exactly `contact_ids`, in any order.
    pub fn dismiss_ids<S: AsRef<str>>(
        &self,
        contact_ids: &[S],
        match_type: MatchType,
    ) -> Result<DismissedEntry, LedgerError> {
        let _write = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.storage.load()?;
        let key = group_key(contact_ids.iter().map(|id| id.as_ref()));

        if let Some(existing) = entries.iter().find(|e| e.key == key) {
            return Ok(existing.clone());
        }

        let entry = DismissedEntry {
            key,
            match_type,
            dismissed_at: chrono::Utc::now().timestamp(),
        };
        entries.push(entry.clone());
        self.storage.save(&entries)?;

        info!("Dismissed {:?} group {}", entry.match_type, entry.key);
        Ok(entry)
    }

    pub fn is_dismissed(&self, group: &DuplicateGroup) -> Result<bool, LedgerError> {
        let key = group.key();
        Ok(self.storage.load()?.iter().any(|e| e.key == key))
    }

    pub fn entries(&self) -> Result<Vec<DismissedEntry>, LedgerError> {
        self.storage.load()
    }

    pub fn clear_all(&self) -> Result<(), LedgerError> {
        let _write = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.storage.save(&[])?;
        info!("Cleared dismissal ledger");
        Ok(())
    }

    /// Drops entries that mention any of `contact_ids`. Used once those
    /// contacts are deleted and their groups can never reappear.
    pub fn forget_contacts(&self, contact_ids: &[String]) -> Result<usize, LedgerError> {
        let _write = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.storage.load()?;
        let before = entries.len();
        let kept: Vec<DismissedEntry> = entries
            .into_iter()
            .filter(|e| !e.contact_ids().any(|id| contact_ids.iter().any(|c| c == id)))
            .collect();

        let removed = before - kept.len();
        if removed > 0 {
            self.storage.save(&kept)?;
        }
        Ok(removed)
    }

    /// `groups` minus the dismissed ones, in their original order.
    pub fn active_groups(
        &self,
        groups: &[DuplicateGroup],
    ) -> Result<Vec<DuplicateGroup>, LedgerError> {
        let dismissed: HashSet<String> =
            self.storage.load()?.into_iter().map(|e| e.key).collect();
        Ok(filter_active(groups, &dismissed))
    }
}

pub fn filter_active(groups: &[DuplicateGroup], dismissed: &HashSet<String>) -> Vec<DuplicateGroup> {
    groups
        .iter()
        .filter(|g| !dismissed.contains(&g.key()))
        .cloned()
        .collect()
}
