pub mod contacts;
pub mod duplicates;
pub mod merges;

use actix_web::web;
use dedupe::{ContactCache, DismissalLedger, RecordStore, ReviewQueue};
use shared_types::Contact;
use std::sync::Arc;

use crate::database::ledger_storage::SqliteLedgerStorage;
use crate::database::record_store::SqliteRecordStore;
use crate::database::AsyncDbConnection;

#[derive(Clone)]
pub struct DedupeAppState {
    pub db: AsyncDbConnection,
    pub cache: Arc<ContactCache>,
    pub queue: Arc<ReviewQueue>,
}

impl DedupeAppState {
    pub fn new(db: AsyncDbConnection, contacts: Vec<Contact>, ledger_scope: &str) -> Self {
        let store = Arc::new(SqliteRecordStore::new(db.clone()));
        Self::with_store(db, contacts, ledger_scope, store)
    }

    /// Same as `new`, with merges written through `store`.
    pub fn with_store(
        db: AsyncDbConnection,
        contacts: Vec<Contact>,
        ledger_scope: &str,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let cache = Arc::new(ContactCache::new(contacts));
        let ledger = DismissalLedger::new(Box::new(SqliteLedgerStorage::new(
            db.clone(),
            ledger_scope,
        )));
        let queue = ReviewQueue::new(store, cache.clone(), ledger);

        Self {
            db,
            cache,
            queue: Arc::new(queue),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/contacts", web::get().to(contacts::list_contacts))
        .route("/api/contacts/reload", web::post().to(contacts::reload_contacts))
        .route("/api/duplicates", web::get().to(duplicates::list_duplicates))
        .route("/api/duplicates/scan", web::post().to(duplicates::scan_duplicates))
        .route("/api/duplicates/dismiss", web::post().to(duplicates::dismiss_group))
        .route("/api/duplicates/dismissals", web::delete().to(duplicates::clear_dismissals))
        .route("/api/merges/preview", web::post().to(merges::preview_merge))
        .route("/api/merges", web::post().to(merges::merge_contacts));
}
