use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            email TEXT,
            phone TEXT,
            avatar_url TEXT,
            company_id TEXT,
            job_title TEXT,
            lead_source TEXT,
            owner_agent_id TEXT,
            notes TEXT,
            last_contacted_at BIGINT,
            tags TEXT NOT NULL DEFAULT '[]',
            custom_fields TEXT NOT NULL DEFAULT '{}',
            lead_score INTEGER NOT NULL DEFAULT 0,
            lead_status TEXT NOT NULL DEFAULT 'cold' CHECK (lead_status IN ('cold', 'warm', 'hot')),
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_created ON contacts(created_at)",
        [],
    )?;

    // Records that reference a contact. A merge re-points them before the
    // duplicate is deleted; the foreign keys refuse a delete that would
    // orphan them.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS deals (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL,
            title TEXT,
            amount REAL,
            stage TEXT,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (contact_id) REFERENCES contacts (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL,
            kind TEXT,
            summary TEXT,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (contact_id) REFERENCES contacts (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL,
            channel TEXT,
            body TEXT,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (contact_id) REFERENCES contacts (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS scheduled_events (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL,
            title TEXT,
            starts_at BIGINT,
            created_at BIGINT NOT NULL,
            FOREIGN KEY (contact_id) REFERENCES contacts (id)
        )",
        [],
    )?;

    for table in ["deals", "activities", "messages", "scheduled_events"] {
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_contact ON {table}(contact_id)"
            ),
            [],
        )?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            tables,
            vec![
                "activities",
                "contacts",
                "deals",
                "kv_store",
                "messages",
                "scheduled_events"
            ]
        );
    }
}
