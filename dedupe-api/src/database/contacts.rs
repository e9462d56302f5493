use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use shared_types::{Contact, ContactPatch, LeadStatus};

const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone, avatar_url, company_id,
    job_title, lead_source, owner_agent_id, notes, last_contacted_at, tags, custom_fields,
    lead_score, lead_status, created_at, updated_at";

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    let lead_status: String = row.get(15)?;
    Ok(Contact {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        avatar_url: row.get(5)?,
        company_id: row.get(6)?,
        job_title: row.get(7)?,
        lead_source: row.get(8)?,
        owner_agent_id: row.get(9)?,
        notes: row.get(10)?,
        last_contacted_at: row.get(11)?,
        tags: json_column(row, 12)?,
        custom_fields: json_column(row, 13)?,
        lead_score: row.get(14)?,
        lead_status: LeadStatus::parse(&lead_status),
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

/// All contacts in load order (oldest first)
pub async fn list_contacts(conn: AsyncDbConnection) -> Result<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at ASC, id ASC"
    ))?;

    let contacts = stmt
        .query_map([], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

pub async fn get_contact(conn: AsyncDbConnection, id: &str) -> Result<Option<Contact>> {
    let conn = conn.lock().await?;

    let contact = conn
        .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"),
            [id],
            row_to_contact,
        )
        .optional()?;

    Ok(contact)
}

/// Insert a contact. An empty id gets a fresh UUID; missing timestamps are set to now.
pub async fn insert_contact(conn: AsyncDbConnection, mut contact: Contact) -> Result<Contact> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    if contact.id.is_empty() {
        contact.id = uuid::Uuid::new_v4().to_string();
    }
    if contact.created_at == 0 {
        contact.created_at = now;
    }
    if contact.updated_at == 0 {
        contact.updated_at = contact.created_at;
    }

    conn.execute(
        &format!(
            "INSERT INTO contacts ({CONTACT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            &contact.id,
            &contact.first_name,
            &contact.last_name,
            contact.email.as_ref(),
            contact.phone.as_ref(),
            contact.avatar_url.as_ref(),
            contact.company_id.as_ref(),
            contact.job_title.as_ref(),
            contact.lead_source.as_ref(),
            contact.owner_agent_id.as_ref(),
            contact.notes.as_ref(),
            contact.last_contacted_at,
            serde_json::to_string(&contact.tags)?,
            serde_json::to_string(&contact.custom_fields)?,
            contact.lead_score,
            contact.lead_status.as_str(),
            contact.created_at,
            contact.updated_at
        ],
    )?;

    Ok(contact)
}

fn patch_assignments(patch: &ContactPatch) -> Result<Vec<(&'static str, Value)>> {
    let mut sets: Vec<(&'static str, Value)> = Vec::new();

    let text_fields = [
        ("email", &patch.email),
        ("phone", &patch.phone),
        ("avatar_url", &patch.avatar_url),
        ("company_id", &patch.company_id),
        ("job_title", &patch.job_title),
        ("lead_source", &patch.lead_source),
        ("owner_agent_id", &patch.owner_agent_id),
        ("notes", &patch.notes),
    ];
    for (column, value) in text_fields {
        if let Some(value) = value {
            sets.push((column, Value::Text(value.clone())));
        }
    }

    if let Some(at) = patch.last_contacted_at {
        sets.push(("last_contacted_at", Value::Integer(at)));
    }
    if let Some(tags) = &patch.tags {
        sets.push(("tags", Value::Text(serde_json::to_string(tags)?)));
    }
    if let Some(fields) = &patch.custom_fields {
        sets.push(("custom_fields", Value::Text(serde_json::to_string(fields)?)));
    }
    if let Some(lead) = patch.lead {
        sets.push(("lead_score", Value::Integer(lead.score as i64)));
        sets.push(("lead_status", Value::Text(lead.status.as_str().to_string())));
    }

    Ok(sets)
}

/// Apply a patch in one statement. Returns false if no contact has `id`.
pub async fn update_contact(
    conn: AsyncDbConnection,
    id: &str,
    patch: &ContactPatch,
) -> Result<bool> {
    let mut sets = patch_assignments(patch)?;
    sets.push((
        "updated_at",
        Value::Integer(chrono::Utc::now().timestamp()),
    ));

    let assignments = sets
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE contacts SET {} WHERE id = ?{}",
        assignments,
        sets.len() + 1
    );

    let mut values: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
    values.push(Value::Text(id.to_string()));

    let conn = conn.lock().await?;
    let changed = conn.execute(&sql, params_from_iter(values))?;

    Ok(changed > 0)
}

/// Returns false if no contact has `id`.
pub async fn delete_contact(conn: AsyncDbConnection, id: &str) -> Result<bool> {
    let conn = conn.lock().await?;
    let changed = conn.execute("DELETE FROM contacts WHERE id = ?", [id])?;
    Ok(changed > 0)
}
