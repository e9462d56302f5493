//! Records in the tables that reference a contact by `contact_id`.
//!
//! Table names only ever come from `DependentCollection::table_name`.

use crate::database::AsyncDbConnection;
use anyhow::Result;
use dedupe::DependentCollection;
use rusqlite::params;

pub async fn list_dependent_ids(
    conn: AsyncDbConnection,
    collection: DependentCollection,
    contact_id: &str,
) -> Result<Vec<String>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE contact_id = ? ORDER BY created_at, id",
        collection.table_name()
    ))?;

    let ids = stmt
        .query_map([contact_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}

/// Point one record at `contact_id`. Returns false if the record does not exist.
pub async fn reassign_dependent(
    conn: AsyncDbConnection,
    collection: DependentCollection,
    record_id: &str,
    contact_id: &str,
) -> Result<bool> {
    let conn = conn.lock().await?;

    let changed = conn.execute(
        &format!(
            "UPDATE {} SET contact_id = ?1 WHERE id = ?2",
            collection.table_name()
        ),
        params![contact_id, record_id],
    )?;

    Ok(changed > 0)
}

/// Insert a bare record that belongs to `contact_id`. Returns its id.
pub async fn insert_dependent(
    conn: AsyncDbConnection,
    collection: DependentCollection,
    contact_id: &str,
) -> Result<String> {
    let conn = conn.lock().await?;
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        &format!(
            "INSERT INTO {} (id, contact_id, created_at) VALUES (?1, ?2, ?3)",
            collection.table_name()
        ),
        params![&id, contact_id, now],
    )?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::contacts::insert_contact;
    use crate::database::test_support::temp_database;
    use shared_types::Contact;

    async fn seed_contact(conn: AsyncDbConnection, id: &str) {
        insert_contact(
            conn,
            Contact {
                id: id.to_string(),
                first_name: id.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reassign_moves_record_between_contacts() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        seed_contact(conn.clone(), "keep").await;
        seed_contact(conn.clone(), "dupe").await;

        for collection in DependentCollection::ALL {
            let record = insert_dependent(conn.clone(), collection, "dupe").await.unwrap();
            assert_eq!(
                list_dependent_ids(conn.clone(), collection, "dupe").await.unwrap(),
                vec![record.clone()]
            );

            assert!(reassign_dependent(conn.clone(), collection, &record, "keep")
                .await
                .unwrap());

            assert!(list_dependent_ids(conn.clone(), collection, "dupe")
                .await
                .unwrap()
                .is_empty());
            assert_eq!(
                list_dependent_ids(conn.clone(), collection, "keep").await.unwrap(),
                vec![record]
            );
        }
    }

    #[tokio::test]
    async fn test_reassign_missing_record() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let changed = reassign_dependent(conn, DependentCollection::Deals, "nope", "keep")
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_contact_with_dependents_cannot_be_deleted() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        seed_contact(conn.clone(), "dupe").await;
        insert_dependent(conn.clone(), DependentCollection::Messages, "dupe")
            .await
            .unwrap();

        let result = crate::database::contacts::delete_contact(conn, "dupe").await;
        assert!(result.is_err());
    }
}
