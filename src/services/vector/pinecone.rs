use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{QueryMatch, VectorIndex, VectorRecord};

/// Thin client for the Pinecone data-plane REST API.
pub struct PineconeIndex {
    host: String,
    api_key: String,
    client: reqwest::Client,
}

impl PineconeIndex {
    pub fn new(host: String, api_key: String) -> Self {
        Self {
            host,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> anyhow::Result<()> {
        let body = json!({
            "vectors": records,
            "namespace": namespace,
        });

        self.client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Pinecone upsert")?
            .error_for_status()
            .context("Pinecone upsert returned error")?;

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> anyhow::Result<Vec<QueryMatch>> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "namespace": namespace,
            "includeMetadata": true,
        });

        let resp = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Pinecone query")?
            .error_for_status()
            .context("Pinecone query returned error")?;

        let data: QueryResponse = resp
            .json()
            .await
            .context("failed to parse Pinecone query response")?;

        Ok(data.matches)
    }
}
