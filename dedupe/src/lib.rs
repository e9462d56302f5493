//! Dedupe Crate
//!
//! Finds contact records that describe the same person and merges them without
//! losing anything that points at them.
//!
//! # Architecture
//!
//! - **Types**: `Contact`, `DuplicateGroup` and the API bodies live in the `shared-types` crate
//! - **Matching**: `matcher` runs the email, phone and fuzzy-name passes over a snapshot
//! - **Merging**: `resolver` computes the field patch, `orchestrator` writes it through a
//!   `RecordStore` and absorbs every duplicate
//! - **Review**: `ledger` remembers dismissed groups, `review` ties scanning, dismissal and
//!   merging together
//!
//! The crate does no I/O itself. Callers supply a `SnapshotProvider`, a `RecordStore` and a
//! `LedgerStorage`.
//!
//! # Example
//!
//! ```rust,ignore
//! use dedupe::{ContactCache, DismissalLedger, ReviewQueue};
//!
//! let cache = Arc::new(ContactCache::new(contacts));
//! let queue = ReviewQueue::new(store, cache, DismissalLedger::in_memory());
//! let active = queue.active_groups()?;
//! let report = queue.merge(&primary_id, &duplicate_ids).await?;
//! ```

pub mod error;
pub mod ledger;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod resolver;
pub mod review;
pub mod similarity;
pub mod store;

// Re-export commonly used types
pub use error::{LedgerError, MergeError, StoreError};
pub use ledger::{DismissalLedger, LedgerStorage, MemoryLedgerStorage};
pub use matcher::find_duplicates;
pub use orchestrator::{MergeOrchestrator, MergeReport};
pub use resolver::compute_merged_fields;
pub use review::{GroupListing, ReviewQueue};
pub use similarity::levenshtein_distance;
pub use store::{ContactCache, DependentCollection, RecordStore, SnapshotChange, SnapshotProvider};
