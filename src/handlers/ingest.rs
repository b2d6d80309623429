use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::TenantContext;
use crate::services::ingestion::IngestDocument;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IngestRequest {
    pub context: TenantContext,
    #[serde(default)]
    pub documents: Vec<IngestDocument>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub processed: usize,
    pub failed: usize,
    pub message: String,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    payload.context.validate()?;

    let outcome = state
        .ingestion
        .run(&payload.context, payload.documents)
        .await
        .map_err(|e| AppError::Agent(e.to_string()))?;

    Ok(Json(IngestResponse {
        processed: outcome.processed,
        failed: outcome.failed,
        message: "Ingestion completed".to_string(),
    }))
}
