use serde::{Deserialize, Serialize};

use crate::models::{Intent, LeadData, TenantContext};

/// Transcript lines emitted by `lead_saver` and `booking` that record side
/// effects. Never surfaced as the spoken reply.
const AUDIT_PREFIXES: [&str; 2] = ["Lead saved", "calendar_event_"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }

    fn is_audit(&self) -> bool {
        self.role == "system" && AUDIT_PREFIXES.iter().any(|p| self.content.starts_with(p))
    }
}

/// The value threaded through the state machine. Nodes clone it, apply their
/// update, and return the new value; history only grows within a run.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub intent: Intent,
    pub user_query: String,
    pub context: TenantContext,
    pub lead_data: LeadData,
    pub appointment_id: Option<String>,
    pub history: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new(context: TenantContext, user_query: &str, history: Vec<ChatMessage>) -> Self {
        Self {
            intent: Intent::RagInfo,
            user_query: user_query.to_string(),
            context,
            lead_data: LeadData::default(),
            appointment_id: None,
            history,
        }
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::new("assistant", content));
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::new("system", content));
    }

    /// The externally visible reply: the last transcript entry that is not an
    /// internal audit line, empty if none exists.
    pub fn reply(&self) -> String {
        self.history
            .iter()
            .rev()
            .find(|m| !m.is_audit())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}
