use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(value)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::migrations::run_migrations;

    #[test]
    fn test_set_overwrites() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_value(&conn, "k").unwrap(), None);

        set_value(&conn, "k", "one").unwrap();
        set_value(&conn, "k", "two").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("two"));
    }
}
