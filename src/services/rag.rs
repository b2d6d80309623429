use std::sync::Arc;

use crate::models::{ChatMessage, TenantContext};
use crate::services::ai::TextGenerator;
use crate::services::embeddings::Embedder;
use crate::services::vector::VectorIndex;

const TOP_K: usize = 5;
const HISTORY_WINDOW: usize = 8;
const NO_CONTEXT_REPLY: &str = "I could not find information for that request.";

const SYSTEM_PROMPT: &str = "You are a helpful sales assistant crafting concise, accurate answers. \
Use ONLY the provided context snippets to answer the user's question. \
If the context does not contain the answer, say you do not have that information.";

/// Multi-tenant retrieval over the vector store, grounded generation on top.
pub struct RagService {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn TextGenerator>,
}

impl RagService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
        }
    }

    pub async fn answer_query(
        &self,
        context: &TenantContext,
        query: &str,
        history: &[ChatMessage],
    ) -> anyhow::Result<String> {
        let vector = self.embedder.embed(query).await?;
        let matches = self
            .index
            .query(&context.namespace(), &vector, TOP_K)
            .await?;

        let snippets: Vec<String> = matches
            .into_iter()
            .filter_map(|m| m.metadata)
            .map(|meta| meta.text)
            .filter(|text| !text.is_empty())
            .collect();

        if snippets.is_empty() {
            return Ok(NO_CONTEXT_REPLY.to_string());
        }

        let prompt = build_prompt(query, &snippets, history);
        let answer = self.llm.generate(SYSTEM_PROMPT, &prompt).await?;
        Ok(answer.trim().to_string())
    }
}

fn build_prompt(query: &str, snippets: &[String], history: &[ChatMessage]) -> String {
    let context_block = snippets.join("\n\n");

    let recent: Vec<String> = history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .rev()
        .filter(|m| !m.content.is_empty())
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect();
    let history_block = if recent.is_empty() {
        "None.".to_string()
    } else {
        recent.join("\n")
    };

    format!(
        "Context Snippets:\n{context_block}\n\n\
         Conversation History:\n{history_block}\n\n\
         User Question:\n{query}\n\n\
         Answer:"
    )
}
