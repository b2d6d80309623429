use serde::{Deserialize, Serialize};

/// Classified purpose of a user message. Labels are exact-match on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Intent {
    #[serde(rename = "RAG_INFO")]
    RagInfo,
    #[serde(rename = "PURCHASE_INTEREST")]
    PurchaseInterest,
    #[serde(rename = "BOOKING")]
    Booking,
    #[serde(rename = "CANCEL_BOOKING")]
    CancelBooking,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported intent label: {0}")]
pub struct UnsupportedIntent(pub String);

impl Intent {
    /// Fixed iteration order; classifiers rely on this for deterministic
    /// tie-breaking.
    pub const ALL: [Intent; 4] = [
        Intent::RagInfo,
        Intent::PurchaseInterest,
        Intent::Booking,
        Intent::CancelBooking,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            Intent::RagInfo => "RAG_INFO",
            Intent::PurchaseInterest => "PURCHASE_INTEREST",
            Intent::Booking => "BOOKING",
            Intent::CancelBooking => "CANCEL_BOOKING",
        }
    }

    /// Exact-match label parsing. Fuzziness belongs to the classifiers, not
    /// here.
    pub fn from_label(label: &str) -> Result<Intent, UnsupportedIntent> {
        match label {
            "RAG_INFO" => Ok(Intent::RagInfo),
            "PURCHASE_INTEREST" => Ok(Intent::PurchaseInterest),
            "BOOKING" => Ok(Intent::Booking),
            "CANCEL_BOOKING" => Ok(Intent::CancelBooking),
            other => Err(UnsupportedIntent(other.to_string())),
        }
    }
}

impl Default for Intent {
    fn default() -> Self {
        Intent::RagInfo
    }
}
