use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub app_name: String,
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,

    // LLM provider (RAG answers + optional LLM intent classifier)
    pub llm_provider: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,

    // Intent classification strategy: rules | semantic | llm
    pub intent_classifier: String,

    // Vector store: memory | pinecone
    pub vector_backend: String,
    pub pinecone_host: String,
    pub pinecone_api_key: String,

    // Embeddings: hash | gemini
    pub embedding_provider: String,
    pub gemini_api_key: String,
    pub gemini_embedding_model: String,

    // Email notifications: log | resend
    pub email_provider: String,
    pub email_api_key: String,
    pub email_sender: String,

    // Calendar: log | google
    pub calendar_provider: String,
    pub calendar_api_url: String,
    pub calendar_api_token: String,
    pub calendar_timezone: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "salesdesk".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salesdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            intent_classifier: env::var("INTENT_CLASSIFIER")
                .unwrap_or_else(|_| "rules".to_string()),
            vector_backend: env::var("VECTOR_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            pinecone_host: env::var("PINECONE_HOST").unwrap_or_default(),
            pinecone_api_key: env::var("PINECONE_API_KEY").unwrap_or_default(),
            embedding_provider: env::var("EMBEDDING_PROVIDER")
                .unwrap_or_else(|_| "hash".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_embedding_model: env::var("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".to_string()),
            email_provider: env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "log".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_sender: env::var("EMAIL_SENDER")
                .unwrap_or_else(|_| "sales@salesdesk.local".to_string()),
            calendar_provider: env::var("CALENDAR_PROVIDER").unwrap_or_else(|_| "log".to_string()),
            calendar_api_url: env::var("CALENDAR_API_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            calendar_api_token: env::var("CALENDAR_API_TOKEN").unwrap_or_default(),
            calendar_timezone: env::var("CALENDAR_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
        }
    }
}
