pub mod llm;
pub mod rules;
pub mod semantic;

use async_trait::async_trait;

use crate::models::Intent;

/// Pluggable classification strategy. Implementations never fail for
/// ordinary queries; anything unparseable resolves to a fallback intent
/// inside the strategy.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Intent;
}
