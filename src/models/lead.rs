use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Slots accumulated across lead-capture turns. `product_interest` is a list
/// with merge semantics; every other field is first-value-wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub product_interest: Vec<String>,
    pub interest_reason: Option<String>,
    pub budget_expectation: Option<String>,
}

impl LeadData {
    /// Apply a turn's updates. Update values for `product_interest` carry the
    /// full merged list, so a non-empty list replaces wholesale.
    pub fn merge(&mut self, updates: LeadData) {
        if updates.name.is_some() {
            self.name = updates.name;
        }
        if updates.email.is_some() {
            self.email = updates.email;
        }
        if updates.phone.is_some() {
            self.phone = updates.phone;
        }
        if !updates.product_interest.is_empty() {
            self.product_interest = updates.product_interest;
        }
        if updates.interest_reason.is_some() {
            self.interest_reason = updates.interest_reason;
        }
        if updates.budget_expectation.is_some() {
            self.budget_expectation = updates.budget_expectation;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LeadData::default()
    }
}

/// Output of one extractor turn: only the fields changed this turn, the next
/// prompt to ask, and whether all required slots are now filled.
#[derive(Debug, Clone, Default)]
pub struct LeadCaptureResult {
    pub updates: LeadData,
    pub prompt: Option<String>,
    pub completed: bool,
}

/// Persisted form of a captured lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    pub org_id: String,
    pub branch_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub product_interest: Vec<String>,
    pub interest_reason: Option<String>,
    pub budget_expectation: Option<String>,
    pub lead_status: String,
    pub captured_at: NaiveDateTime,
}
