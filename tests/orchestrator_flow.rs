use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use salesdesk::models::{ConversationState, Intent, LeadData, LeadRecord, TenantContext};
use salesdesk::services::ai::TextGenerator;
use salesdesk::services::calendar::{CalendarApi, CalendarEvent, CalendarService, EventBody};
use salesdesk::services::email::EmailNotifier;
use salesdesk::services::embeddings::Embedder;
use salesdesk::services::intent::IntentClassifier;
use salesdesk::services::lead::{LeadService, LeadStore};
use salesdesk::services::orchestrator::Orchestrator;
use salesdesk::services::rag::RagService;
use salesdesk::services::vector::memory::InMemoryIndex;
use salesdesk::services::vector::{ChunkMetadata, VectorIndex, VectorRecord};

// ── Fakes ──

struct FixedClassifier(Intent);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, _query: &str) -> Intent {
        self.0
    }
}

/// Counts embed calls; the RAG chain cannot run without embedding the query,
/// so a zero count proves the RAG collaborator was never invoked.
struct CountingEmbedder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0, 0.0, 0.0])
    }
}

struct FixedLlm(&'static str);

#[async_trait]
impl TextGenerator for FixedLlm {
    async fn generate(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct MemoryStore {
    inserted: Mutex<Vec<LeadRecord>>,
}

impl LeadStore for MemoryStore {
    fn insert(&self, record: &LeadRecord) -> anyhow::Result<()> {
        self.inserted.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryMailer {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailNotifier for MemoryMailer {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingCalendar {
    operations: Mutex<Vec<String>>,
}

#[async_trait]
impl CalendarApi for RecordingCalendar {
    async fn create_event(
        &self,
        calendar_id: &str,
        _body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        self.operations
            .lock()
            .unwrap()
            .push(format!("create:{calendar_id}"));
        Ok(CalendarEvent {
            id: "appt-001".to_string(),
            status: Some("confirmed".to_string()),
        })
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        self.operations
            .lock()
            .unwrap()
            .push(format!("patch:{calendar_id}:{event_id}"));
        Ok(CalendarEvent {
            id: event_id.to_string(),
            status: body.status.clone(),
        })
    }
}

struct Harness {
    orchestrator: Orchestrator,
    embed_calls: Arc<AtomicUsize>,
    store: Arc<MemoryStore>,
    mailer: Arc<MemoryMailer>,
    calendar: Arc<RecordingCalendar>,
    index: Arc<InMemoryIndex>,
}

fn harness(intent: Intent) -> Harness {
    let embed_calls = Arc::new(AtomicUsize::new(0));
    let embedder = Arc::new(CountingEmbedder {
        calls: embed_calls.clone(),
    });
    let index = Arc::new(InMemoryIndex::new());
    let store = Arc::new(MemoryStore::default());
    let mailer = Arc::new(MemoryMailer::default());
    let calendar = Arc::new(RecordingCalendar::default());

    let orchestrator = Orchestrator::new(
        Arc::new(RagService::new(
            index.clone(),
            embedder,
            Arc::new(FixedLlm("Here is the knowledge base answer.")),
        )),
        Arc::new(LeadService::new(store.clone(), mailer.clone())),
        Arc::new(CalendarService::new(
            calendar.clone(),
            mailer.clone(),
            "UTC".to_string(),
        )),
        Arc::new(FixedClassifier(intent)),
    );

    Harness {
        orchestrator,
        embed_calls,
        store,
        mailer,
        calendar,
        index,
    }
}

fn initial_state(query: &str) -> ConversationState {
    ConversationState::new(TenantContext::new("org", "branch", "sess-1"), query, vec![])
}

fn complete_lead() -> LeadData {
    LeadData {
        name: Some("Skyler".to_string()),
        email: Some("skyler@example.com".to_string()),
        phone: Some("+1 555 222 9999".to_string()),
        product_interest: vec!["solar".to_string()],
        interest_reason: Some("to cut bills".to_string()),
        budget_expectation: Some("$9,000".to_string()),
    }
}

// ── Scenarios ──

#[tokio::test]
async fn test_rag_intent_routes_to_rag_chain() {
    let h = harness(Intent::RagInfo);
    h.index
        .upsert(
            "org::branch",
            vec![VectorRecord {
                id: "chunk-1".to_string(),
                values: vec![1.0, 0.0, 0.0],
                metadata: ChunkMetadata {
                    org_id: "org".to_string(),
                    branch_id: "branch".to_string(),
                    session_id: None,
                    source_path: None,
                    text: "Financing options are available.".to_string(),
                },
            }],
        )
        .await
        .unwrap();

    let final_state = h
        .orchestrator
        .run(initial_state("Tell me about financing options."))
        .await
        .unwrap();

    assert_eq!(final_state.intent, Intent::RagInfo);
    assert_eq!(
        final_state.history.last().unwrap().content,
        "Here is the knowledge base answer."
    );
    assert!(h.embed_calls.load(Ordering::SeqCst) > 0);
    assert!(h.calendar.operations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_purchase_intent_prompts_without_touching_rag() {
    let h = harness(Intent::PurchaseInterest);

    let final_state = h
        .orchestrator
        .run(initial_state("I'm interested in solar panels for my home."))
        .await
        .unwrap();

    assert_eq!(final_state.intent, Intent::PurchaseInterest);
    // The RAG collaborator is never invoked on the lead path.
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 0);
    // Exactly one assistant message: the prompt for the next missing field.
    let assistant: Vec<_> = final_state
        .history
        .iter()
        .filter(|m| m.role == "assistant")
        .collect();
    assert_eq!(assistant.len(), 1);
    assert!(assistant[0].content.contains("your name"));
    assert_eq!(final_state.lead_data.product_interest, vec!["solar panels for my home"]);
    // Incomplete lead: nothing persisted.
    assert!(h.store.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_without_complete_lead_waits() {
    let h = harness(Intent::Booking);

    let final_state = h
        .orchestrator
        .run(initial_state("Can we book next week?"))
        .await
        .unwrap();

    assert_eq!(final_state.intent, Intent::Booking);
    assert!(final_state.appointment_id.is_none());
    assert!(h.calendar.operations.lock().unwrap().is_empty());
    assert_eq!(h.embed_calls.load(Ordering::SeqCst), 0);
    assert_eq!(final_state.history.last().unwrap().role, "assistant");
}

#[tokio::test]
async fn test_booking_with_complete_lead_reaches_calendar() {
    let h = harness(Intent::Booking);
    let mut state = initial_state("Book me tomorrow afternoon.");
    state.lead_data = complete_lead();

    let final_state = h.orchestrator.run(state).await.unwrap();

    assert_eq!(final_state.appointment_id.as_deref(), Some("appt-001"));
    assert_eq!(
        h.calendar.operations.lock().unwrap().as_slice(),
        ["create:org__branch@example.com"]
    );

    // Last transcript entry is the audit note, not the spoken reply.
    let last = final_state.history.last().unwrap();
    assert_eq!(last.role, "system");
    assert!(last.content.contains("calendar_event_created"));
    assert_eq!(
        final_state.reply(),
        "Your consultation is booked! I sent a confirmation email with the calendar invite."
    );

    // The complete lead was persisted before booking, with its audit line.
    assert_eq!(h.store.inserted.lock().unwrap().len(), 1);
    assert!(final_state
        .history
        .iter()
        .any(|m| m.role == "system" && m.content.starts_with("Lead saved: ")));

    // Lead notification plus booking confirmation.
    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, "Thanks for your interest");
    assert_eq!(sent[1].1, "Appointment booked");
}

#[tokio::test]
async fn test_cancel_without_appointment_short_circuits() {
    let h = harness(Intent::CancelBooking);

    let final_state = h
        .orchestrator
        .run(initial_state("Please cancel my appointment."))
        .await
        .unwrap();

    assert!(final_state.appointment_id.is_none());
    assert!(h.calendar.operations.lock().unwrap().is_empty());
    assert!(final_state.reply().contains("couldn't find an appointment"));
    // No audit entry was appended for the no-op.
    assert!(!final_state.history.iter().any(|m| m.role == "system"));
}

#[tokio::test]
async fn test_cancel_with_appointment_patches_event() {
    let h = harness(Intent::CancelBooking);
    let mut state = initial_state("Cancel it please.");
    state.lead_data = complete_lead();
    state.appointment_id = Some("appt-42".to_string());

    let final_state = h.orchestrator.run(state).await.unwrap();

    assert_eq!(final_state.appointment_id.as_deref(), Some("appt-42"));
    assert_eq!(
        h.calendar.operations.lock().unwrap().as_slice(),
        ["patch:org__branch@example.com:appt-42"]
    );
    let last = final_state.history.last().unwrap();
    assert!(last.content.contains("calendar_event_cancelled:appt-42"));
    assert!(final_state.reply().contains("has been cancelled"));
}

#[tokio::test]
async fn test_state_input_is_not_mutated_between_runs() {
    let h = harness(Intent::PurchaseInterest);
    let state = initial_state("I'm interested in batteries.");
    let history_before = state.history.clone();

    let final_state = h.orchestrator.run(state.clone()).await.unwrap();

    assert_eq!(state.history, history_before);
    assert!(state.lead_data.product_interest.is_empty());
    assert!(!final_state.lead_data.product_interest.is_empty());
}
