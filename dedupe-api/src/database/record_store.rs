use async_trait::async_trait;
use dedupe::{DependentCollection, RecordStore, StoreError};
use shared_types::ContactPatch;

use crate::database::{contacts, dependents, AsyncDbConnection};

/// `RecordStore` over the SQLite pool. Every call is its own statement.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: AsyncDbConnection,
}

impl SqliteRecordStore {
    pub fn new(db: AsyncDbConnection) -> Self {
        Self { db }
    }
}

fn operation(e: anyhow::Error) -> StoreError {
    StoreError::Operation(e.to_string())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn is_configured(&self) -> bool {
        self.db.lock().await.is_ok()
    }

    async fn update_contact(&self, id: &str, patch: &ContactPatch) -> Result<(), StoreError> {
        match contacts::update_contact(self.db.clone(), id, patch).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(operation(e)),
        }
    }

    async fn query_dependents(
        &self,
        collection: DependentCollection,
        contact_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        dependents::list_dependent_ids(self.db.clone(), collection, contact_id)
            .await
            .map_err(operation)
    }

    async fn reassign_dependent(
        &self,
        collection: DependentCollection,
        record_id: &str,
        contact_id: &str,
    ) -> Result<(), StoreError> {
        match dependents::reassign_dependent(self.db.clone(), collection, record_id, contact_id)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound(record_id.to_string())),
            Err(e) => Err(operation(e)),
        }
    }

    async fn delete_contact(&self, id: &str) -> Result<(), StoreError> {
        match contacts::delete_contact(self.db.clone(), id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(operation(e)),
        }
    }
}
