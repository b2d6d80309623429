use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salesdesk::config::AppConfig;
use salesdesk::db::{self, SqliteLeadStore};
use salesdesk::handlers;
use salesdesk::services::ai::groq::GroqProvider;
use salesdesk::services::ai::ollama::OllamaProvider;
use salesdesk::services::ai::TextGenerator;
use salesdesk::services::calendar::{CalendarApi, CalendarService, GoogleCalendarClient, LogCalendar};
use salesdesk::services::email::{EmailNotifier, LogMailer, ResendMailer};
use salesdesk::services::embeddings::{Embedder, GeminiEmbedder, HashEmbedder};
use salesdesk::services::ingestion::IngestionPipeline;
use salesdesk::services::intent::llm::LlmClassifier;
use salesdesk::services::intent::rules::RuleBasedClassifier;
use salesdesk::services::intent::semantic::SemanticClassifier;
use salesdesk::services::intent::IntentClassifier;
use salesdesk::services::lead::LeadService;
use salesdesk::services::orchestrator::Orchestrator;
use salesdesk::services::rag::RagService;
use salesdesk::services::vector::memory::InMemoryIndex;
use salesdesk::services::vector::pinecone::PineconeIndex;
use salesdesk::services::vector::VectorIndex;
use salesdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let llm: Arc<dyn TextGenerator> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(
                !config.groq_api_key.is_empty(),
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq"
            );
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Arc::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Arc::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
    };

    let embedder: Arc<dyn Embedder> = match config.embedding_provider.as_str() {
        "gemini" => {
            anyhow::ensure!(
                !config.gemini_api_key.is_empty(),
                "GEMINI_API_KEY must be set when EMBEDDING_PROVIDER=gemini"
            );
            Arc::new(GeminiEmbedder::new(
                config.gemini_api_key.clone(),
                config.gemini_embedding_model.clone(),
            ))
        }
        _ => Arc::new(HashEmbedder),
    };

    let index: Arc<dyn VectorIndex> = match config.vector_backend.as_str() {
        "pinecone" => {
            anyhow::ensure!(
                !config.pinecone_api_key.is_empty() && !config.pinecone_host.is_empty(),
                "PINECONE_HOST and PINECONE_API_KEY must be set when VECTOR_BACKEND=pinecone"
            );
            Arc::new(PineconeIndex::new(
                config.pinecone_host.clone(),
                config.pinecone_api_key.clone(),
            ))
        }
        _ => {
            tracing::info!("using in-memory vector index");
            Arc::new(InMemoryIndex::new())
        }
    };

    let mailer: Arc<dyn EmailNotifier> = match config.email_provider.as_str() {
        "resend" => {
            anyhow::ensure!(
                !config.email_api_key.is_empty(),
                "EMAIL_API_KEY must be set when EMAIL_PROVIDER=resend"
            );
            Arc::new(ResendMailer::new(
                config.email_api_key.clone(),
                config.email_sender.clone(),
            ))
        }
        _ => Arc::new(LogMailer),
    };

    let calendar_api: Arc<dyn CalendarApi> = match config.calendar_provider.as_str() {
        "google" => {
            anyhow::ensure!(
                !config.calendar_api_token.is_empty(),
                "CALENDAR_API_TOKEN must be set when CALENDAR_PROVIDER=google"
            );
            Arc::new(GoogleCalendarClient::new(
                config.calendar_api_url.clone(),
                config.calendar_api_token.clone(),
            ))
        }
        _ => Arc::new(LogCalendar),
    };

    let classifier: Arc<dyn IntentClassifier> = match config.intent_classifier.as_str() {
        "semantic" => {
            tracing::info!("using semantic intent classifier");
            Arc::new(SemanticClassifier::new())
        }
        "llm" => {
            tracing::info!("using LLM intent classifier with rule fallback");
            Arc::new(LlmClassifier::new(llm.clone()))
        }
        _ => {
            tracing::info!("using rule-based intent classifier");
            Arc::new(RuleBasedClassifier)
        }
    };

    let rag = Arc::new(RagService::new(index.clone(), embedder.clone(), llm));
    let lead = Arc::new(LeadService::new(
        Arc::new(SqliteLeadStore::new(db.clone())),
        mailer.clone(),
    ));
    let calendar = Arc::new(CalendarService::new(
        calendar_api,
        mailer,
        config.calendar_timezone.clone(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(rag, lead, calendar, classifier));
    let ingestion = Arc::new(IngestionPipeline::new(index, embedder));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        orchestrator,
        ingestion,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .route("/api/v1/ingest", post(handlers::ingest::ingest))
        .route("/api/v1/leads", get(handlers::leads::get_leads))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
