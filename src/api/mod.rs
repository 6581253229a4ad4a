//! Thin HTTP surface over [`IncidentService`].
//!
//! Handlers only translate between HTTP and the service; every rule lives
//! below this layer.

pub mod error;

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::entity::{Incident, IncidentDraft};
use crate::ingest::IngestReport;
use crate::service::IncidentService;
use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: IncidentService,
    pub hide_archived_by_default: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub include_archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/incidents", get(list_incidents).post(create_incident))
        .route("/api/incidents/bulk-upload", post(bulk_upload))
        .route("/api/incidents/{id}", get(get_incident))
        .route("/api/incidents/{id}/status", patch(update_status))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Incident>>, ApiError> {
    let include_archived = query
        .include_archived
        .unwrap_or(!state.hide_archived_by_default);
    Ok(Json(state.service.list(include_archived).await?))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Incident>, ApiError> {
    Ok(Json(state.service.get_by_id(&id).await?))
}

async fn create_incident(
    State(state): State<AppState>,
    fields: Result<Json<IncidentDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(fields) = fields?;
    let incident = state.service.create(fields).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Incident>, ApiError> {
    let Json(request) = request?;
    let status = request
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Status is required"))?;
    Ok(Json(state.service.transition_status(&id, &status).await?))
}

/// Content types a CSV upload may arrive with. Absent is accepted too.
const CSV_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "text/plain",
    "application/octet-stream",
];

fn is_csv_upload(headers: &HeaderMap) -> bool {
    match headers.get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => {
            let mime = value
                .to_str()
                .unwrap_or_default()
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            CSV_CONTENT_TYPES.contains(&mime.as_str())
        }
    }
}

async fn bulk_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestReport>, ApiError> {
    if !is_csv_upload(&headers) {
        return Err(ApiError::unsupported_media_type("Only CSV files are allowed"));
    }
    if body.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }

    Ok(Json(state.service.bulk_ingest_upload(body.to_vec()).await?))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}
