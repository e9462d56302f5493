use dedupe::{LedgerError, LedgerStorage};
use shared_types::DismissedEntry;

use crate::database::{kv_store, AsyncDbConnection};

pub const LEDGER_KEY_PREFIX: &str = "dismissed_duplicates";

/// Keeps one ledger per scope as a JSON list in `kv_store`.
pub struct SqliteLedgerStorage {
    db: AsyncDbConnection,
    key: String,
}

impl SqliteLedgerStorage {
    pub fn new(db: AsyncDbConnection, scope: &str) -> Self {
        Self {
            db,
            key: format!("{}:{}", LEDGER_KEY_PREFIX, scope),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn storage(e: anyhow::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

impl LedgerStorage for SqliteLedgerStorage {
    fn load(&self) -> Result<Vec<DismissedEntry>, LedgerError> {
        let conn = self.db.get().map_err(storage)?;
        match kv_store::get_value(&conn, &self.key).map_err(storage)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[DismissedEntry]) -> Result<(), LedgerError> {
        let json = serde_json::to_string(entries)?;
        let conn = self.db.get().map_err(storage)?;
        kv_store::set_value(&conn, &self.key, &json).map_err(storage)
    }
}
