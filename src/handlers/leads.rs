use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LeadsQuery {
    pub org_id: String,
    pub branch_id: String,
}

#[derive(Serialize)]
pub struct LeadResponse {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub product_interest: Vec<String>,
    pub interest_reason: Option<String>,
    pub budget_expectation: Option<String>,
    pub lead_status: String,
    pub captured_at: String,
}

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub async fn get_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LeadsQuery>,
) -> Result<Json<Vec<LeadResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let leads = {
        let db = state.db.lock().unwrap();
        queries::list_leads(&db, &query.org_id, &query.branch_id)
            .map_err(|e| AppError::Internal(e.to_string()))?
    };

    let response = leads
        .into_iter()
        .map(|lead| LeadResponse {
            id: lead.id,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            product_interest: lead.product_interest,
            interest_reason: lead.interest_reason,
            budget_expectation: lead.budget_expectation,
            lead_status: lead.lead_status,
            captured_at: lead.captured_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}
