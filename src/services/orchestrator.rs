use std::sync::Arc;

use crate::models::{ConversationState, Intent};
use crate::services::calendar::CalendarService;
use crate::services::intent::IntentClassifier;
use crate::services::lead::LeadService;
use crate::services::rag::RagService;

const LEAD_ENCOURAGEMENT: &str =
    "Thanks for the details - feel free to share more so I can complete your request.";

/// Graph nodes of the conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    IntentClassifier,
    RagChain,
    LeadCapture,
    LeadSaver,
    Booking,
}

/// Routing decision after a node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Node(Node),
    End,
}

/// Finite-state dispatcher over a small fixed topology. Entry is the intent
/// classifier; every run traverses to an end edge and the final state's
/// transcript tail is the reply.
pub struct Orchestrator {
    rag: Arc<RagService>,
    lead: Arc<LeadService>,
    calendar: Arc<CalendarService>,
    classifier: Arc<dyn IntentClassifier>,
}

impl Orchestrator {
    pub fn new(
        rag: Arc<RagService>,
        lead: Arc<LeadService>,
        calendar: Arc<CalendarService>,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        Self {
            rag,
            lead,
            calendar,
            classifier,
        }
    }

    pub async fn run(&self, state: ConversationState) -> anyhow::Result<ConversationState> {
        let mut state = state;
        let mut node = Node::IntentClassifier;
        loop {
            state = match node {
                Node::IntentClassifier => self.intent_node(&state).await,
                Node::RagChain => self.rag_node(&state).await?,
                Node::LeadCapture => self.lead_node(&state),
                Node::LeadSaver => self.lead_saver_node(&state).await?,
                Node::Booking => self.booking_node(&state).await?,
            };
            match self.route(node, &state) {
                Next::Node(next) => node = next,
                Next::End => break,
            }
        }
        Ok(state)
    }

    pub fn lead_is_complete(&self, state: &ConversationState) -> bool {
        self.lead.is_complete(&state.lead_data)
    }

    fn route(&self, from: Node, state: &ConversationState) -> Next {
        match from {
            Node::IntentClassifier => Next::Node(match state.intent {
                Intent::RagInfo => Node::RagChain,
                Intent::PurchaseInterest | Intent::Booking => Node::LeadCapture,
                Intent::CancelBooking => Node::Booking,
            }),
            Node::LeadCapture => Next::Node(Node::LeadSaver),
            Node::LeadSaver => {
                // Pure function of (intent, lead completeness); nothing else.
                if state.intent == Intent::Booking && self.lead.is_complete(&state.lead_data) {
                    Next::Node(Node::Booking)
                } else {
                    Next::End
                }
            }
            Node::RagChain | Node::Booking => Next::End,
        }
    }

    async fn intent_node(&self, state: &ConversationState) -> ConversationState {
        let mut updated = state.clone();
        updated.intent = self.classifier.classify(&updated.user_query).await;
        tracing::info!(
            intent = updated.intent.as_label(),
            session = %updated.context.user_session_id,
            "classified message"
        );
        updated
    }

    async fn rag_node(&self, state: &ConversationState) -> anyhow::Result<ConversationState> {
        let mut updated = state.clone();
        let answer = self
            .rag
            .answer_query(&updated.context, &updated.user_query, &updated.history)
            .await?;
        updated.push_assistant(answer);
        Ok(updated)
    }

    fn lead_node(&self, state: &ConversationState) -> ConversationState {
        let mut updated = state.clone();
        let result = self.lead.capture_step(&updated.user_query, &updated.lead_data);
        updated.lead_data.merge(result.updates);

        if let Some(prompt) = result.prompt {
            updated.push_assistant(prompt);
        } else if self.lead.is_complete(&updated.lead_data) {
            let confirmation = self.lead.confirmation_message(&updated.lead_data);
            updated.push_assistant(confirmation);
        } else {
            updated.push_assistant(LEAD_ENCOURAGEMENT);
        }
        updated
    }

    async fn lead_saver_node(&self, state: &ConversationState) -> anyhow::Result<ConversationState> {
        let mut updated = state.clone();
        if self.lead.is_complete(&updated.lead_data) {
            let record = self
                .lead
                .persist_lead(&updated.context, &updated.lead_data)
                .await?;
            updated.push_system(format!("Lead saved: {}", record.id));
        }
        Ok(updated)
    }

    async fn booking_node(&self, state: &ConversationState) -> anyhow::Result<ConversationState> {
        let mut updated = state.clone();
        let result = self
            .calendar
            .handle_booking(
                &updated.context,
                &updated.user_query,
                &updated.lead_data,
                updated.appointment_id.as_deref(),
                updated.intent,
            )
            .await?;
        updated.appointment_id = result.appointment_id;
        updated.push_assistant(result.message);
        if let Some(note) = result.audit_note {
            updated.push_system(note);
        }
        Ok(updated)
    }
}
