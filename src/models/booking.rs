use serde::{Deserialize, Serialize};

/// Outcome of a calendar operation. `audit_note` is transcript-internal and
/// never shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResult {
    pub appointment_id: Option<String>,
    pub message: String,
    pub audit_note: Option<String>,
}
