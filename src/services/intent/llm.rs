use std::sync::Arc;

use async_trait::async_trait;

use crate::models::Intent;
use crate::services::ai::TextGenerator;
use crate::services::intent::rules::RuleBasedClassifier;
use crate::services::intent::IntentClassifier;

const SYSTEM_PROMPT: &str = "You classify user intent for a sales assistant. \
Respond with exactly one of: RAG_INFO, PURCHASE_INTEREST, BOOKING, CANCEL_BOOKING. \
No punctuation, no explanation.";

/// LLM-backed strategy. Any failure (transport, empty output, or a label
/// outside the canonical set) falls back to the rule-based classifier and is
/// never surfaced to the user.
pub struct LlmClassifier {
    llm: Arc<dyn TextGenerator>,
    fallback: RuleBasedClassifier,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self {
            llm,
            fallback: RuleBasedClassifier,
        }
    }

    async fn classify_via_llm(&self, query: &str) -> anyhow::Result<Intent> {
        let prompt = format!("Query: {query}");
        let response = self.llm.generate(SYSTEM_PROMPT, &prompt).await?;
        let label = response.trim().to_uppercase();
        Ok(Intent::from_label(&label)?)
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, query: &str) -> Intent {
        match self.classify_via_llm(query).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "LLM intent classification failed, using rules");
                self.fallback.classify_query(query)
            }
        }
    }
}
