//! Executes a merge against the record store.
//!
//! Order of operations:
//! 1. write the resolved patch to the primary; if that fails nothing else is touched
//! 2. per duplicate, re-point every dependent record at the primary, then delete
//!    the duplicate
//! 3. drop the resolved group from the transient listing
//!
//! A failing duplicate is logged and reported but does not stop the others.
//! Whatever is left over can be merged again later.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use shared_types::{AbsorbedDuplicate, Contact, ContactPatch, FailedDuplicate};
use tracing::{info, warn};

use crate::error::{MergeError, StoreError};
use crate::resolver::compute_merged_fields;
use crate::review::GroupListing;
use crate::store::{DependentCollection, RecordStore, SnapshotChange, SnapshotProvider};

/// Outcome of a merge whose primary write succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub primary_id: String,
    pub patch: ContactPatch,
    pub absorbed: Vec<AbsorbedDuplicate>,
    pub failed: Vec<FailedDuplicate>,
}

impl MergeReport {
    /// True when every duplicate was absorbed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn absorbed_ids(&self) -> Vec<String> {
        self.absorbed.iter().map(|a| a.contact_id.clone()).collect()
    }
}

pub struct MergeOrchestrator {
    store: Arc<dyn RecordStore>,
    snapshot: Arc<dyn SnapshotProvider>,
    listing: Arc<GroupListing>,
    in_flight: Mutex<HashSet<String>>,
}

/// Holds a primary id in the in-flight set until dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    primary_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.primary_id);
    }
}

impl MergeOrchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        snapshot: Arc<dyn SnapshotProvider>,
        listing: Arc<GroupListing>,
    ) -> Self {
        Self {
            store,
            snapshot,
            listing,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_merging(&self, primary_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(primary_id)
    }

    fn claim(&self, primary_id: &str) -> Result<InFlightGuard<'_>, MergeError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(primary_id.to_string()) {
            return Err(MergeError::MergeInProgress(primary_id.to_string()));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            primary_id: primary_id.to_string(),
        })
    }

    /// Looks up the primary and duplicates in the current snapshot. Any
    /// missing id fails the whole call before anything is written.
    pub fn resolve_members(
        &self,
        primary_id: &str,
        duplicate_ids: &[String],
    ) -> Result<(Contact, Vec<Contact>), MergeError> {
        let contacts = self.snapshot.contacts();
        let find = |id: &str| contacts.iter().find(|c| c.id == id).cloned();

        let primary =
            find(primary_id).ok_or_else(|| MergeError::PrimaryNotFound(primary_id.to_string()))?;

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in duplicate_ids {
            if id == primary_id || !seen.insert(id.as_str()) {
                continue;
            }
            let duplicate = find(id).ok_or_else(|| MergeError::DuplicateNotFound(id.clone()))?;
            duplicates.push(duplicate);
        }

        if duplicates.is_empty() {
            return Err(MergeError::NoDuplicates(primary_id.to_string()));
        }

        Ok((primary, duplicates))
    }

    /// The patch a merge would write, without writing it.
    pub fn preview(
        &self,
        primary_id: &str,
        duplicate_ids: &[String],
    ) -> Result<ContactPatch, MergeError> {
        let (primary, duplicates) = self.resolve_members(primary_id, duplicate_ids)?;
        Ok(compute_merged_fields(&primary, &duplicates))
    }

    pub async fn merge_contacts(
        &self,
        primary_id: &str,
        duplicate_ids: &[String],
    ) -> Result<MergeReport, MergeError> {
        if !self.store.is_configured().await {
            return Err(MergeError::NotConfigured);
        }

        let _guard = self.claim(primary_id)?;
        let (primary, duplicates) = self.resolve_members(primary_id, duplicate_ids)?;

        info!(
            "Merging {} duplicate(s) into contact {}",
            duplicates.len(),
            primary_id
        );

        let patch = compute_merged_fields(&primary, &duplicates);
        if !patch.is_empty() {
            self.store
                .update_contact(primary_id, &patch)
                .await
                .map_err(|source| match source {
                    StoreError::NotConfigured => MergeError::NotConfigured,
                    source => MergeError::PrimaryUpdate {
                        id: primary_id.to_string(),
                        source,
                    },
                })?;

            self.snapshot.apply(SnapshotChange::Patched {
                id: primary_id.to_string(),
                patch: patch.clone(),
                updated_at: chrono::Utc::now().timestamp(),
            });
        }

        let mut absorbed = Vec::new();
        let mut failed = Vec::new();

        for duplicate in &duplicates {
            match self.absorb(primary_id, &duplicate.id).await {
                Ok(reassigned_records) => {
                    self.snapshot
                        .apply(SnapshotChange::Removed(duplicate.id.clone()));
                    absorbed.push(AbsorbedDuplicate {
                        contact_id: duplicate.id.clone(),
                        reassigned_records,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to merge duplicate {} into {}: {}",
                        duplicate.id, primary_id, e
                    );
                    failed.push(FailedDuplicate {
                        contact_id: duplicate.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.listing.remove_containing(primary_id);

        info!(
            "Merge into {} finished: {} absorbed, {} failed",
            primary_id,
            absorbed.len(),
            failed.len()
        );

        Ok(MergeReport {
            primary_id: primary_id.to_string(),
            patch,
            absorbed,
            failed,
        })
    }

    /// Moves all dependents of `duplicate_id` to `primary_id`, then deletes
    /// the duplicate. Returns the number of records moved.
    async fn absorb(&self, primary_id: &str, duplicate_id: &str) -> Result<usize, StoreError> {
        let mut moved = 0;

        for collection in DependentCollection::ALL {
            let record_ids = self.store.query_dependents(collection, duplicate_id).await?;
            for record_id in &record_ids {
                self.store
                    .reassign_dependent(collection, record_id, primary_id)
                    .await?;
                moved += 1;
            }
        }

        // Only reached once nothing references the duplicate anymore.
        self.store.delete_contact(duplicate_id).await?;
        Ok(moved)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::ContactCache;
    use async_trait::async_trait;
    use shared_types::{DuplicateGroup, MatchType};
    use std::collections::HashMap;

    /// Record store double with programmable failures.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub unconfigured: bool,
        pub fail_update: bool,
        pub fail_delete: HashSet<String>,
        pub fail_reassign_from: HashSet<String>,
        pub dependents: Mutex<HashMap<(DependentCollection, String), String>>,
        pub updates: Mutex<Vec<(String, ContactPatch)>>,
        pub deleted: Mutex<Vec<String>>,
        pub log: Mutex<Vec<String>>,
        /// Runs inside `update_contact`, after the write is accepted.
        pub on_update: Option<Box<dyn Fn() + Send + Sync>>,
    }

    impl MemoryStore {
        pub fn add_dependent(&self, collection: DependentCollection, record: &str, contact: &str) {
            self.dependents
                .lock()
                .unwrap()
                .insert((collection, record.to_string()), contact.to_string());
        }

        pub fn owner_of(&self, collection: DependentCollection, record: &str) -> Option<String> {
            self.dependents
                .lock()
                .unwrap()
                .get(&(collection, record.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn is_configured(&self) -> bool {
            !self.unconfigured
        }

        async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<(), StoreError> {
            if self.fail_update {
                return Err(StoreError::Operation("update rejected".to_string()));
            }
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), patch.clone()));
            self.log.lock().unwrap().push(format!("update {}", id));
            if let Some(hook) = &self.on_update {
                hook();
            }
            Ok(())
        }

        async fn query_dependents(
            &self,
            collection: DependentCollection,
            contact_id: &str,
        ) -> Result<Vec<String>, StoreError> {
            let mut ids: Vec<String> = self
                .dependents
                .lock()
                .unwrap()
                .iter()
                .filter(|((c, _), owner)| *c == collection && owner.as_str() == contact_id)
                .map(|((_, record), _)| record.clone())
                .collect();
            ids.sort();
            Ok(ids)
        }

        async fn reassign_dependent(
            &self,
            collection: DependentCollection,
            record_id: &str,
            contact_id: &str,
        ) -> Result<(), StoreError> {
            let key = (collection, record_id.to_string());
            let mut dependents = self.dependents.lock().unwrap();
            let owner = dependents
                .get(&key)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(record_id.to_string()))?;
            if self.fail_reassign_from.contains(&owner) {
                return Err(StoreError::Operation("reassign rejected".to_string()));
            }
            dependents.insert(key, contact_id.to_string());
            self.log
                .lock()
                .unwrap()
                .push(format!("reassign {} {}->{}", record_id, owner, contact_id));
            Ok(())
        }

        async fn delete_contact(&self, id: &str) -> Result<(), StoreError> {
            if self.fail_delete.contains(id) {
                return Err(StoreError::Operation("delete rejected".to_string()));
            }
            self.deleted.lock().unwrap().push(id.to_string());
            self.log.lock().unwrap().push(format!("delete {}", id));
            Ok(())
        }
    }

    fn contact(id: &str, tags: &[&str]) -> Contact {
        Contact {
            id: id.to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn setup(
        store: MemoryStore,
        contacts: Vec<Contact>,
    ) -> (Arc<MemoryStore>, Arc<ContactCache>, Arc<GroupListing>, MergeOrchestrator) {
        let store = Arc::new(store);
        let cache = Arc::new(ContactCache::new(contacts));
        let listing = Arc::new(GroupListing::default());
        let orchestrator = MergeOrchestrator::new(store.clone(), cache.clone(), listing.clone());
        (store, cache, listing, orchestrator)
    }

    #[tokio::test]
    async fn test_merge_updates_primary_reassigns_and_deletes() {
        let store = MemoryStore::default();
        store.add_dependent(DependentCollection::Deals, "deal-1", "2");
        store.add_dependent(DependentCollection::Messages, "msg-1", "2");
        store.add_dependent(DependentCollection::Activities, "act-1", "1");

        let (store, cache, _, orchestrator) = setup(
            store,
            vec![contact("1", &["vip"]), contact("2", &["enterprise"])],
        );

        let report = orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.patch.tags,
            Some(vec!["vip".to_string(), "enterprise".to_string()])
        );
        assert_eq!(report.absorbed[0].reassigned_records, 2);
        assert_eq!(store.owner_of(DependentCollection::Deals, "deal-1").as_deref(), Some("1"));
        assert_eq!(store.owner_of(DependentCollection::Messages, "msg-1").as_deref(), Some("1"));
        assert_eq!(*store.deleted.lock().unwrap(), vec!["2".to_string()]);

        assert!(cache.get("2").is_none());
        assert_eq!(cache.get("1").unwrap().tags.len(), 2);
        assert!(!orchestrator.is_merging("1"));
    }

    #[tokio::test]
    async fn test_reassignment_happens_before_deletion() {
        let store = MemoryStore::default();
        store.add_dependent(DependentCollection::ScheduledEvents, "evt-1", "2");
        let (store, _, _, orchestrator) =
            setup(store, vec![contact("1", &[]), contact("2", &[])]);

        orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        let log = store.log.lock().unwrap().clone();
        let reassign = log.iter().position(|l| l.starts_with("reassign evt-1")).unwrap();
        let delete = log.iter().position(|l| l == "delete 2").unwrap();
        assert!(reassign < delete);
    }

    #[tokio::test]
    async fn test_failed_delete_of_one_duplicate_does_not_stop_others() {
        let mut store = MemoryStore::default();
        store.fail_delete.insert("4".to_string());
        let (store, cache, _, orchestrator) = setup(
            store,
            vec![
                contact("1", &["a"]),
                contact("2", &["b"]),
                contact("3", &["c"]),
                contact("4", &["d"]),
            ],
        );

        let report = orchestrator
            .merge_contacts("1", &ids(&["2", "3", "4"]))
            .await
            .unwrap();

        assert_eq!(store.updates.lock().unwrap().len(), 1);
        assert_eq!(report.absorbed_ids(), ids(&["2", "3"]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].contact_id, "4");
        assert!(!report.is_complete());

        // Left in the snapshot so the operator can retry it.
        assert!(cache.get("4").is_some());
        assert!(cache.get("2").is_none());
    }

    #[tokio::test]
    async fn test_failed_reassignment_keeps_duplicate() {
        let mut store = MemoryStore::default();
        store.fail_reassign_from.insert("2".to_string());
        store.add_dependent(DependentCollection::Deals, "deal-1", "2");
        let (store, cache, _, orchestrator) =
            setup(store, vec![contact("1", &[]), contact("2", &[])]);

        let report = orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(store.deleted.lock().unwrap().is_empty());
        assert!(cache.get("2").is_some());
    }

    #[tokio::test]
    async fn test_primary_update_failure_aborts_before_duplicates() {
        let store = MemoryStore {
            fail_update: true,
            ..Default::default()
        };
        store.add_dependent(DependentCollection::Deals, "deal-1", "2");
        let (store, cache, _, orchestrator) =
            setup(store, vec![contact("1", &["a"]), contact("2", &["b"])]);

        let err = orchestrator
            .merge_contacts("1", &ids(&["2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::PrimaryUpdate { .. }));
        assert!(store.deleted.lock().unwrap().is_empty());
        assert_eq!(store.owner_of(DependentCollection::Deals, "deal-1").as_deref(), Some("2"));
        assert_eq!(cache.generation(), 0);
        assert!(!orchestrator.is_merging("1"));
    }

    #[tokio::test]
    async fn test_empty_patch_skips_primary_write() {
        let (store, _, _, orchestrator) =
            setup(MemoryStore::default(), vec![contact("1", &["a"]), contact("2", &["a"])]);

        let report = orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        assert!(report.patch.is_empty());
        assert!(store.updates.lock().unwrap().is_empty());
        assert_eq!(report.absorbed_ids(), ids(&["2"]));
    }

    #[tokio::test]
    async fn test_input_errors_do_not_mutate() {
        let (store, _, _, orchestrator) =
            setup(MemoryStore::default(), vec![contact("1", &[]), contact("2", &["x"])]);

        let err = orchestrator.merge_contacts("9", &ids(&["2"])).await.unwrap_err();
        assert!(matches!(err, MergeError::PrimaryNotFound(_)));
        assert!(err.is_input_error());

        let err = orchestrator
            .merge_contacts("1", &ids(&["2", "9"]))
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::DuplicateNotFound(ref id) if id == "9"));

        let err = orchestrator.merge_contacts("1", &ids(&["1"])).await.unwrap_err();
        assert!(matches!(err, MergeError::NoDuplicates(_)));

        assert!(store.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_configured_refuses_to_start() {
        let store = MemoryStore {
            unconfigured: true,
            ..Default::default()
        };
        let (store, _, _, orchestrator) =
            setup(store, vec![contact("1", &[]), contact("2", &["x"])]);

        let err = orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap_err();
        assert!(matches!(err, MergeError::NotConfigured));
        assert!(store.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_merge_on_same_primary_is_rejected() {
        let (_, _, _, orchestrator) =
            setup(MemoryStore::default(), vec![contact("1", &[]), contact("2", &[])]);

        let _held = orchestrator.claim("1").unwrap();
        let err = orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap_err();
        assert!(matches!(err, MergeError::MergeInProgress(_)));
    }

    #[tokio::test]
    async fn test_merge_removes_group_from_listing() {
        let contacts = vec![contact("1", &[]), contact("2", &[]), contact("3", &[]), contact("4", &[])];
        let (_, _, listing, orchestrator) = setup(MemoryStore::default(), contacts.clone());
        listing.replace(vec![
            DuplicateGroup::new(contacts[0..2].to_vec(), MatchType::Email),
            DuplicateGroup::new(contacts[2..4].to_vec(), MatchType::Phone),
        ]);

        orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        let remaining = listing.groups();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].contact_ids(), vec!["3", "4"]);
    }

    #[tokio::test]
    async fn test_primary_removed_during_merge_stays_removed() {
        let cache = Arc::new(ContactCache::new(vec![
            contact("1", &["a"]),
            contact("2", &["b"]),
        ]));
        // Another merge absorbs "1" while this one is writing to it.
        let racing = cache.clone();
        let store = Arc::new(MemoryStore {
            on_update: Some(Box::new(move || {
                racing.apply(SnapshotChange::Removed("1".to_string()));
            })),
            ..Default::default()
        });
        let orchestrator = MergeOrchestrator::new(
            store,
            cache.clone(),
            Arc::new(GroupListing::default()),
        );

        orchestrator.merge_contacts("1", &ids(&["2"])).await.unwrap();

        assert!(cache.get("1").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let (store, cache, _, orchestrator) =
            setup(MemoryStore::default(), vec![contact("1", &["vip"]), contact("2", &["new"])]);

        let patch = orchestrator.preview("1", &ids(&["2"])).unwrap();
        assert_eq!(patch.tags.map(|t| t.len()), Some(2));
        assert!(store.log.lock().unwrap().is_empty());
        assert_eq!(cache.generation(), 0);
    }
}
