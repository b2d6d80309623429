use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Multi-tenant partition identifiers supplied with every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantContext {
    pub org_id: String,
    pub branch_id: String,
    pub user_session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
}

impl TenantContext {
    pub fn new(org_id: &str, branch_id: &str, user_session_id: &str) -> Self {
        Self {
            org_id: org_id.to_string(),
            branch_id: branch_id.to_string(),
            user_session_id: user_session_id.to_string(),
            calendar_id: None,
        }
    }

    /// Required fields must be non-empty; checked at the HTTP boundary so a
    /// bad context never reaches the state machine.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("org_id", &self.org_id),
            ("branch_id", &self.branch_id),
            ("user_session_id", &self.user_session_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("context.{name} must be set")));
            }
        }
        Ok(())
    }

    /// Tenant-scoped partition key for the vector store.
    pub fn namespace(&self) -> String {
        format!("{}::{}", self.org_id, self.branch_id)
    }
}
