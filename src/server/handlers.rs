//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::info;

use crate::data::Dataset;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Name of the multipart field carrying the dataset
const UPLOAD_FIELD: &str = "file";

/// Filename suggested for the returned report
const REPORT_FILENAME: &str = "predictions.csv";

/// Liveness message
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "App": "Running" }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
    }))
}

/// Run the model comparison on an uploaded CSV and return the report as CSV
pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response> {
    while let Some(field) = multipart.next_field().await.map_err(|e| ServerError::BadRequest(e.to_string()))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("data.csv").to_string();
        let data = field.bytes().await.map_err(|e| ServerError::BadRequest(e.to_string()))?;

        info!(file = %file_name, bytes = data.len(), "Received dataset");

        let start = Instant::now();
        let state_for_task = Arc::clone(&state);
        let csv = tokio::task::spawn_blocking(move || -> crate::error::Result<String> {
            let dataset = Dataset::from_csv_bytes(&data)?;
            state_for_task.engine.compare(&dataset)?.to_csv()
        })
        .await
        .map_err(|e| ServerError::Internal(format!("comparison task failed: {}", e)))??;

        info!(
            file = %file_name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Comparison report ready"
        );

        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", REPORT_FILENAME),
                ),
            ],
            csv,
        )
            .into_response());
    }

    Err(ServerError::BadRequest(format!(
        "No file uploaded, expected a multipart field named '{}'",
        UPLOAD_FIELD
    )))
}
