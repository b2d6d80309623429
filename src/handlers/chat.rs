use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{ChatMessage, ConversationState, TenantContext};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub context: TenantContext,
    pub message: ChatMessage,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub intent: String,
    pub lead_captured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    payload.context.validate()?;

    let initial = ConversationState::new(
        payload.context,
        &payload.message.content,
        payload.history,
    );

    let final_state = state
        .orchestrator
        .run(initial)
        .await
        .map_err(|e| AppError::Agent(e.to_string()))?;

    Ok(Json(ChatResponse {
        reply: final_state.reply(),
        intent: final_state.intent.as_label().to_string(),
        lead_captured: state.orchestrator.lead_is_complete(&final_state),
        appointment_id: final_state.appointment_id,
    }))
}
