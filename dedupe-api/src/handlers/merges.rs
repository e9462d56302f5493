use actix_web::{web, HttpResponse, Result as ActixResult};
use dedupe::MergeError;
use shared_types::{MergeContactsRequest, MergeContactsResponse, MergePreviewResponse};

use crate::handlers::DedupeAppState;

fn merge_error(e: MergeError) -> actix_web::Error {
    match e {
        MergeError::PrimaryNotFound(_) | MergeError::DuplicateNotFound(_) => {
            actix_web::error::ErrorNotFound(e.to_string())
        }
        MergeError::NoDuplicates(_) => actix_web::error::ErrorBadRequest(e.to_string()),
        MergeError::MergeInProgress(_) => actix_web::error::ErrorConflict(e.to_string()),
        MergeError::NotConfigured => actix_web::error::ErrorServiceUnavailable(e.to_string()),
        MergeError::PrimaryUpdate { .. } => {
            actix_web::error::ErrorInternalServerError(e.to_string())
        }
    }
}

pub async fn preview_merge(
    data: web::Data<DedupeAppState>,
    request: web::Json<MergeContactsRequest>,
) -> ActixResult<HttpResponse> {
    let patch = data
        .queue
        .preview(&request.primary_id, &request.duplicate_ids)
        .map_err(merge_error)?;

    Ok(HttpResponse::Ok().json(MergePreviewResponse {
        primary_id: request.primary_id.clone(),
        patch,
    }))
}

/// Partial failures still answer 200; the skipped duplicates are listed in `failed`.
pub async fn merge_contacts(
    data: web::Data<DedupeAppState>,
    request: web::Json<MergeContactsRequest>,
) -> ActixResult<HttpResponse> {
    let report = data
        .queue
        .merge(&request.primary_id, &request.duplicate_ids)
        .await
        .map_err(merge_error)?;

    Ok(HttpResponse::Ok().json(MergeContactsResponse {
        success: true,
        primary_id: report.primary_id,
        patch: report.patch,
        absorbed: report.absorbed,
        failed: report.failed,
    }))
}
