use super::error::ApiError;
use super::types::{ListRecordsResponse, Record, RecordRequest};
use crate::storage::store::RecordStore;

use axum::extract::rejection::JsonRejection;
use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

pub type SharedStore = Arc<dyn RecordStore>;

pub const ENDPOINT_HEALTHZ: &str = "/healthz";
pub const ENDPOINT_RECORDS: &str = "/records";
pub const ENDPOINT_RECORD: &str = "/records/:name";

/// Builds the CRUD router over whichever store the selector produced.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTHZ, get(handle_healthz))
        .route(
            ENDPOINT_RECORDS,
            get(handle_list_records).post(handle_create_record),
        )
        .route(
            ENDPOINT_RECORD,
            get(handle_get_record)
                .put(handle_update_record)
                .delete(handle_delete_record),
        )
        .layer(Extension(store))
}

pub async fn handle_healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub async fn handle_list_records(
    Extension(store): Extension<SharedStore>,
) -> Result<Json<ListRecordsResponse>, ApiError> {
    let mut records = store.list().await.map_err(|e| {
        tracing::error!("Failed to list records: {}", e);
        ApiError::from(e)
    })?;
    records.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(ListRecordsResponse { records }))
}

pub async fn handle_create_record(
    Extension(store): Extension<SharedStore>,
    payload: Result<Json<RecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(request) = payload?;
    let record = request.into_record().normalize()?;

    store.put(record.clone()).await.map_err(|e| {
        tracing::error!("Failed to create record {}: {}", record.name, e);
        ApiError::from(e)
    })?;

    tracing::info!("Created record {} ({})", record.name, record.record_type);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn handle_get_record(
    Extension(store): Extension<SharedStore>,
    Path(name): Path<String>,
) -> Result<Json<Record>, ApiError> {
    match store.get(&name).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => {
            tracing::debug!("Record not found: {}", name);
            Err(ApiError::NotFound(name))
        }
        Err(e) => {
            tracing::error!("Failed to get record {}: {}", name, e);
            Err(ApiError::from(e))
        }
    }
}

pub async fn handle_update_record(
    Extension(store): Extension<SharedStore>,
    Path(name): Path<String>,
    payload: Result<Json<RecordRequest>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(mut request) = payload?;
    // The path segment is authoritative for the record's identity.
    request.name = name;
    let record = request.into_record().normalize()?;

    store.put(record.clone()).await.map_err(|e| {
        tracing::error!("Failed to update record {}: {}", record.name, e);
        ApiError::from(e)
    })?;

    tracing::info!("Updated record {}", record.name);
    Ok(Json(record))
}

pub async fn handle_delete_record(
    Extension(store): Extension<SharedStore>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    store.delete(&name).await.map_err(|e| {
        tracing::error!("Failed to delete record {}: {}", name, e);
        ApiError::from(e)
    })?;

    tracing::info!("Deleted record {}", name);
    Ok(StatusCode::NO_CONTENT)
}
