//! The review loop around the matcher: scan, hide dismissed groups, merge.

use std::sync::{Arc, Mutex, RwLock};

use shared_types::{DuplicateGroup, DuplicateGroupsResponse, MatchType, ScanSummary};
use tracing::{info, warn};

use crate::error::{LedgerError, MergeError};
use crate::ledger::DismissalLedger;
use crate::matcher::find_duplicates;
use crate::orchestrator::{MergeOrchestrator, MergeReport};
use crate::store::{RecordStore, SnapshotProvider};

/// Groups detected by the last scan. Never persisted.
#[derive(Default)]
pub struct GroupListing {
    groups: RwLock<Vec<DuplicateGroup>>,
}

impl GroupListing {
    pub fn replace(&self, groups: Vec<DuplicateGroup>) {
        *self.groups.write().unwrap_or_else(|e| e.into_inner()) = groups;
    }

    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.groups
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Removes the group holding `contact_id`, if any. Returns whether one was removed.
    pub fn remove_containing(&self, contact_id: &str) -> bool {
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        let before = groups.len();
        groups.retain(|g| !g.contains(contact_id));
        groups.len() != before
    }
}

pub struct ReviewQueue {
    snapshot: Arc<dyn SnapshotProvider>,
    ledger: DismissalLedger,
    listing: Arc<GroupListing>,
    orchestrator: MergeOrchestrator,
    scanned_generation: Mutex<Option<u64>>,
}

impl ReviewQueue {
    pub fn new(
        store: Arc<dyn RecordStore>,
        snapshot: Arc<dyn SnapshotProvider>,
        ledger: DismissalLedger,
    ) -> Self {
        let listing = Arc::new(GroupListing::default());
        let orchestrator = MergeOrchestrator::new(store, snapshot.clone(), listing.clone());
        Self {
            snapshot,
            ledger,
            listing,
            orchestrator,
            scanned_generation: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &DismissalLedger {
        &self.ledger
    }

    pub fn orchestrator(&self) -> &MergeOrchestrator {
        &self.orchestrator
    }

    /// Runs the matcher over the current snapshot and replaces the listing.
    pub fn scan(&self) -> ScanSummary {
        let generation = self.snapshot.generation();
        let contacts = self.snapshot.contacts();
        let groups = find_duplicates(&contacts);
        let summary = ScanSummary::from_groups(&groups);

        self.listing.replace(groups);
        *self
            .scanned_generation
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(generation);

        info!(
            "Scanned {} contacts: {} email, {} phone, {} name groups",
            contacts.len(),
            summary.email_groups,
            summary.phone_groups,
            summary.name_groups
        );
        summary
    }

    /// Rescans only if the snapshot changed since the last scan.
    pub fn refresh(&self) -> bool {
        let current = self.snapshot.generation();
        let scanned = *self
            .scanned_generation
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if scanned == Some(current) {
            return false;
        }
        self.scan();
        true
    }

    /// Detected groups minus the dismissed ones.
    pub fn active_groups(&self) -> Result<DuplicateGroupsResponse, LedgerError> {
        self.refresh();
        let all = self.listing.groups();
        let groups = self.ledger.active_groups(&all)?;

        Ok(DuplicateGroupsResponse {
            summary: ScanSummary::from_groups(&groups),
            dismissed_count: all.len() - groups.len(),
            groups,
        })
    }

    pub fn dismiss(&self, contact_ids: &[String], match_type: MatchType) -> Result<(), LedgerError> {
        self.ledger.dismiss_ids(contact_ids, match_type)?;
        Ok(())
    }

    pub fn clear_dismissals(&self) -> Result<(), LedgerError> {
        self.ledger.clear_all()
    }

    pub fn preview(
        &self,
        primary_id: &str,
        duplicate_ids: &[String],
    ) -> Result<shared_types::ContactPatch, MergeError> {
        self.orchestrator.preview(primary_id, duplicate_ids)
    }

    pub async fn merge(
        &self,
        primary_id: &str,
        duplicate_ids: &[String],
    ) -> Result<MergeReport, MergeError> {
        let report = self
            .orchestrator
            .merge_contacts(primary_id, duplicate_ids)
            .await?;

        let absorbed = report.absorbed_ids();
        if !absorbed.is_empty() {
            match self.ledger.forget_contacts(&absorbed) {
                Ok(0) => {}
                Ok(n) => info!("Dropped {} dismissal(s) of merged contacts", n),
                Err(e) => warn!("Failed to prune dismissals after merge: {}", e),
            }
        }

        Ok(report)
    }
}
