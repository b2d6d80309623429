pub mod groq;
pub mod ollama;

use async_trait::async_trait;

/// Text-generation collaborator used by the RAG chain and the LLM intent
/// classifier.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> anyhow::Result<String>;
}
