use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::database::Database;

/// Returns the default path of the contacts database
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/contact-dedupe/contacts.db`
/// - **Linux**: `~/.local/share/contact-dedupe/contacts.db`
/// - **Windows**: `%LOCALAPPDATA%\contact-dedupe\contacts.db`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("contact-dedupe").join("contacts.db"))
}

/// Open the database at `override_path`, or at the default location.
/// An existing file is opened as-is.
pub fn initialize_database(override_path: Option<&Path>) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = match override_path {
        Some(path) => path.to_path_buf(),
        None => get_db_path()?,
    };

    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}
