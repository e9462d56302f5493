use actix_web::{web, HttpResponse, Result as ActixResult};
use dedupe::SnapshotProvider;
use shared_types::ContactsResponse;
use tracing::info;

use crate::database::contacts as contacts_db;
use crate::handlers::DedupeAppState;

pub async fn list_contacts(data: web::Data<DedupeAppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ContactsResponse {
        contacts: data.cache.contacts(),
    }))
}

/// Replace the in-memory snapshot with the current contents of the database.
pub async fn reload_contacts(data: web::Data<DedupeAppState>) -> ActixResult<HttpResponse> {
    let contacts = contacts_db::list_contacts(data.db.clone())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let loaded = contacts.len();
    data.cache.replace_all(contacts);
    info!("Reloaded {} contacts into the snapshot", loaded);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "loaded": loaded })))
}
