/// Failure of a single record store call
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Record store is not configured")]
    NotConfigured,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store operation failed: {0}")]
    Operation(String),
}

/// Dismissal ledger storage errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a merge call failed as a whole. Per-duplicate failures are not
/// errors; they are reported in the `MergeReport`.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Primary contact not found: {0}")]
    PrimaryNotFound(String),

    #[error("Duplicate contact not found: {0}")]
    DuplicateNotFound(String),

    #[error("No duplicates given for primary {0}")]
    NoDuplicates(String),

    #[error("A merge into {0} is already in progress")]
    MergeInProgress(String),

    #[error("Record store is not configured")]
    NotConfigured,

    #[error("Failed to update primary contact {id}: {source}")]
    PrimaryUpdate {
        id: String,
        #[source]
        source: StoreError,
    },
}

impl MergeError {
    /// Input errors are reported before anything is written.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MergeError::PrimaryNotFound(_)
                | MergeError::DuplicateNotFound(_)
                | MergeError::NoDuplicates(_)
        )
    }
}
