use actix_web::{web, HttpResponse, Result as ActixResult};
use std::collections::HashSet;
use shared_types::{group_key, DismissGroupRequest};

use crate::handlers::DedupeAppState;

pub async fn list_duplicates(data: web::Data<DedupeAppState>) -> ActixResult<HttpResponse> {
    let groups = data
        .queue
        .active_groups()
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(groups))
}

/// Rerun the matcher even if the snapshot has not changed.
pub async fn scan_duplicates(data: web::Data<DedupeAppState>) -> ActixResult<HttpResponse> {
    data.queue.scan();
    list_duplicates(data).await
}

pub async fn dismiss_group(
    data: web::Data<DedupeAppState>,
    request: web::Json<DismissGroupRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let mut seen = HashSet::new();
    let contact_ids: Vec<String> = request
        .contact_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if contact_ids.len() < 2 {
        return Err(actix_web::error::ErrorBadRequest(
            "A duplicate group has at least two contacts",
        ));
    }

    data.queue
        .dismiss(&contact_ids, request.match_type)
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "dismissed": group_key(&contact_ids)
    })))
}

pub async fn clear_dismissals(data: web::Data<DedupeAppState>) -> ActixResult<HttpResponse> {
    data.queue
        .clear_dismissals()
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "cleared": true })))
}
