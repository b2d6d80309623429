use async_trait::async_trait;

use crate::models::Intent;
use crate::services::intent::IntentClassifier;

// Checked in priority order. Cancellation comes first because "reschedule"
// and "book" co-occur in reschedule requests, and "appointment" alone would
// otherwise pull a cancellation into the booking path.
const CANCEL_KEYWORDS: &[&str] = &["cancel", "reschedule", "call off"];
const BOOKING_KEYWORDS: &[&str] = &["book", "schedule", "appointment", "meeting", "demo"];
const PURCHASE_KEYWORDS: &[&str] = &["interested", "buy", "price", "pricing", "cost", "quote"];

/// Keyword heuristic classifier. The default strategy; also the fallback
/// behind the LLM strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn classify_query(&self, query: &str) -> Intent {
        let query = query.to_lowercase();
        if CANCEL_KEYWORDS.iter().any(|kw| query.contains(kw)) {
            return Intent::CancelBooking;
        }
        if BOOKING_KEYWORDS.iter().any(|kw| query.contains(kw)) {
            return Intent::Booking;
        }
        if PURCHASE_KEYWORDS.iter().any(|kw| query.contains(kw)) {
            return Intent::PurchaseInterest;
        }
        Intent::RagInfo
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(&self, query: &str) -> Intent {
        self.classify_query(query)
    }
}
