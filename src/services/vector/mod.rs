pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tenant metadata stored alongside every chunk vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub org_id: String,
    pub branch_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<ChunkMetadata>,
}

/// Namespaced vector store. The namespace is the tenant partition key; no
/// cross-namespace reads exist.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> anyhow::Result<()>;
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> anyhow::Result<Vec<QueryMatch>>;
}
