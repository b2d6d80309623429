use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{LeadCaptureResult, LeadData, LeadRecord, TenantContext};
use crate::services::email::EmailNotifier;

/// Storage collaborator for captured leads.
pub trait LeadStore: Send + Sync {
    fn insert(&self, record: &LeadRecord) -> anyhow::Result<()>;
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s\-]{6,}\d").unwrap());
static NAME_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i:my name is)\s+([A-Z][A-Za-z'-]*(?:\s+[A-Z][A-Za-z'-]*)*)").unwrap(),
        Regex::new(r"I'm\s+([A-Z][A-Za-z'-]*(?:\s+[A-Z][A-Za-z'-]*)*)").unwrap(),
        Regex::new(r"I am\s+([A-Z][A-Za-z'-]*(?:\s+[A-Z][A-Za-z'-]*)*)").unwrap(),
        Regex::new(r"\b(?:Mr|Mrs|Ms|Dr)\.?\s+([A-Z][A-Za-z'-]*(?:\s+[A-Z][A-Za-z'-]*)*)")
            .unwrap(),
    ]
});
static PRODUCT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)interested in ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)looking for ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bneed ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bwant ([^.?!]+)").unwrap(),
    ]
});
static REASON_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bbecause ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bsince ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bso that ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bas ([^.?!]+)").unwrap(),
        Regex::new(r"(?i)\bto ([^.?!]+)").unwrap(),
    ]
});
static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:budget|around|about|roughly)\s*(?:is|:)?\s*(\$?\d[\d,]*(?:\.\d{1,2})?)")
        .unwrap()
});
static PRODUCT_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",| and ").unwrap());

// Markers that end the product clause so the reason clause is not swallowed.
const REASON_MARKERS: [&str; 3] = [" because ", " since ", " so that "];
// Secondary reason inference when no leading conjunction matched.
const REASON_HINTS: [&str; 3] = [" to ", " so we can ", " so i can "];

const ACKNOWLEDGEMENTS: [&str; 15] = [
    "yes", "no", "ok", "okay", "sure", "thanks", "thank you", "yep", "nope", "hi", "hello",
    "hey", "fine", "great", "cool",
];
const FILLER_PREFIXES: [&str; 10] = [
    "i am ", "i'm ", "we need ", "we want ", "we are ", "we're ", "it's ", "just ", "maybe ",
    "probably ",
];

/// Slot order doubles as prompt order: required fields first, then the
/// solicited-but-optional ones. The prompt for a turn is always the first
/// missing field in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeadField {
    ProductInterest,
    Name,
    Email,
    InterestReason,
    BudgetExpectation,
    Phone,
}

const REQUIRED_FIELDS: [LeadField; 3] =
    [LeadField::ProductInterest, LeadField::Name, LeadField::Email];
const OPTIONAL_FIELDS: [LeadField; 3] = [
    LeadField::InterestReason,
    LeadField::BudgetExpectation,
    LeadField::Phone,
];

impl LeadField {
    fn prompt(&self) -> &'static str {
        match self {
            LeadField::ProductInterest => {
                "I can help with that. Which products are you most interested in?"
            }
            LeadField::InterestReason => "Thanks! What makes this a good fit for you right now?",
            LeadField::Name => "Great - could you share your name so we know who to contact?",
            LeadField::Email => "What's the best email to reach you at?",
            LeadField::BudgetExpectation => "Do you have a budget or price range in mind?",
            LeadField::Phone => {
                "If you'd like, share a phone number so our team can text or call you."
            }
        }
    }

    fn is_set(&self, lead: &LeadData) -> bool {
        match self {
            LeadField::ProductInterest => !lead.product_interest.is_empty(),
            LeadField::Name => is_filled(&lead.name),
            LeadField::Email => is_filled(&lead.email),
            LeadField::InterestReason => is_filled(&lead.interest_reason),
            LeadField::BudgetExpectation => is_filled(&lead.budget_expectation),
            LeadField::Phone => is_filled(&lead.phone),
        }
    }
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Captures lead slots from free text and persists completed leads.
pub struct LeadService {
    store: Arc<dyn LeadStore>,
    mailer: Arc<dyn EmailNotifier>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>, mailer: Arc<dyn EmailNotifier>) -> Self {
        Self { store, mailer }
    }

    /// One extractor turn: pattern-match the utterance against the
    /// accumulated lead, return only the fields that changed plus the next
    /// prompt. Absence of a match is never an error.
    pub fn capture_step(&self, user_query: &str, existing: &LeadData) -> LeadCaptureResult {
        let text = user_query.trim();
        let mut lead = existing.clone();
        let mut updates = LeadData::default();

        if lead.email.is_none() {
            if let Some(m) = EMAIL_RE.find(text) {
                lead.email = Some(m.as_str().to_string());
                updates.email = lead.email.clone();
            }
        }

        if lead.phone.is_none() {
            if let Some(m) = PHONE_RE.find(text) {
                lead.phone = Some(m.as_str().trim().to_string());
                updates.phone = lead.phone.clone();
            }
        }

        if !is_filled(&lead.name) {
            if let Some(name) = extract_first(text, &NAME_RES) {
                lead.name = Some(name);
                updates.name = lead.name.clone();
            }
        }

        if let Some(raw) = extract_first(text, &PRODUCT_RES) {
            let trimmed = trim_after_reason(&raw);
            let merged = merge_products(&lead.product_interest, &trimmed);
            if !merged.is_empty() && merged != lead.product_interest {
                lead.product_interest = merged.clone();
                updates.product_interest = merged;
            }
        }

        if !is_filled(&lead.interest_reason) {
            if let Some(reason) = extract_first(text, &REASON_RES).or_else(|| infer_reason(text)) {
                lead.interest_reason = Some(reason);
                updates.interest_reason = lead.interest_reason.clone();
            }
        }

        if !is_filled(&lead.budget_expectation) {
            if let Some(caps) = BUDGET_RE.captures(text) {
                lead.budget_expectation = Some(caps[1].to_string());
                updates.budget_expectation = lead.budget_expectation.clone();
            }
        }

        // Last resort: a short free-standing reply with nothing else extracted
        // is taken verbatim as the product interest. Known to misfire on
        // product-adjacent chatter; kept deliberately loose.
        if lead.product_interest.is_empty() && updates == LeadData::default() {
            if let Some(product) = infer_product_from_reply(text) {
                lead.product_interest = vec![product];
                updates.product_interest = lead.product_interest.clone();
            }
        }

        let next_missing = REQUIRED_FIELDS
            .iter()
            .chain(OPTIONAL_FIELDS.iter())
            .find(|f| !f.is_set(&lead));

        LeadCaptureResult {
            updates,
            prompt: next_missing.map(|f| f.prompt().to_string()),
            completed: self.is_complete(&lead),
        }
    }

    pub fn is_complete(&self, lead: &LeadData) -> bool {
        REQUIRED_FIELDS.iter().all(|f| f.is_set(lead))
    }

    /// Human-readable summary once the lead is complete.
    pub fn confirmation_message(&self, lead: &LeadData) -> String {
        let mut pieces: Vec<String> = Vec::new();
        if !lead.product_interest.is_empty() {
            pieces.push(format!(
                "You're interested in {}.",
                lead.product_interest.join(", ")
            ));
        }
        if let Some(reason) = lead.interest_reason.as_deref() {
            pieces.push(format!("Reason noted: {reason}."));
        }
        if let Some(budget) = lead.budget_expectation.as_deref() {
            pieces.push(format!("Budget around {budget}."));
        }
        let contact: Vec<&str> = [&lead.name, &lead.email, &lead.phone]
            .iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if !contact.is_empty() {
            pieces.push(format!("Contact details: {}.", contact.join(", ")));
        }
        pieces.push("I'll pass this along to our sales team - anything else you'd like to add?".to_string());
        pieces.join(" ")
    }

    /// Persist the lead and notify the prospect. A single insert and a single
    /// send; failures propagate without partial-commit handling.
    pub async fn persist_lead(
        &self,
        context: &TenantContext,
        lead: &LeadData,
    ) -> anyhow::Result<LeadRecord> {
        let record = LeadRecord {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: context.org_id.clone(),
            branch_id: context.branch_id.clone(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            product_interest: lead.product_interest.clone(),
            interest_reason: lead.interest_reason.clone(),
            budget_expectation: lead.budget_expectation.clone(),
            lead_status: "NEW".to_string(),
            captured_at: Utc::now().naive_utc(),
        };

        self.store.insert(&record)?;
        tracing::info!(lead_id = %record.id, org_id = %record.org_id, "lead saved");

        if let Some(email) = record.email.as_deref() {
            self.mailer
                .send(
                    email,
                    "Thanks for your interest",
                    "We will reach out shortly with more information.",
                )
                .await?;
        }

        Ok(record)
    }
}

fn extract_first(text: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}

fn trim_after_reason(product: &str) -> String {
    let lowered = product.to_lowercase();
    let mut end = product.len();
    for marker in REASON_MARKERS {
        if let Some(pos) = lowered.find(marker) {
            end = end.min(pos);
        }
    }
    product[..end].trim().to_string()
}

fn merge_products(existing: &[String], raw: &str) -> Vec<String> {
    let mut merged: Vec<String> = existing.to_vec();
    for item in PRODUCT_SPLIT_RE.split(raw) {
        let item = item.trim();
        if !item.is_empty() && !merged.iter().any(|m| m == item) {
            merged.push(item.to_string());
        }
    }
    merged
}

fn infer_reason(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    for hint in REASON_HINTS {
        if let Some(pos) = lowered.find(hint) {
            let rest = &text[pos + hint.len()..];
            let end = rest.find(['.', '?', '!']).unwrap_or(rest.len());
            let reason = rest[..end].trim();
            if !reason.is_empty() {
                return Some(reason.to_string());
            }
        }
    }
    None
}

fn infer_product_from_reply(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches(['.', '!']);
    if trimmed.is_empty() || text.contains('?') || text.contains('@') {
        return None;
    }
    if trimmed.split_whitespace().count() > 12 {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if ACKNOWLEDGEMENTS.contains(&lowered.as_str()) {
        return None;
    }
    // A bare number is an answer to something else, never a product.
    if trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '$' | ',' | '.' | ' '))
    {
        return None;
    }

    let mut remainder = trimmed;
    for prefix in FILLER_PREFIXES {
        if lowered.starts_with(prefix) {
            remainder = &trimmed[prefix.len()..];
            break;
        }
    }
    let remainder = remainder.trim();
    if remainder.is_empty() {
        None
    } else {
        Some(remainder.to_string())
    }
}
