use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use sha1::{Digest, Sha1};

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Deterministic hash-based embeddings for local development. Identical text
/// always maps to the identical vector, which is all the in-memory index
/// needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let digest = Sha1::digest(text.as_bytes());
        Ok(digest.iter().map(|&b| b as f32 / 255.0).collect())
    }
}

/// Gemini embedding model client.
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:embedContent",
            self.model
        );
        let body = json!({
            "content": { "parts": [{ "text": text }] },
        });

        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini embedding API")?
            .error_for_status()
            .context("Gemini embedding API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Gemini embedding response")?;

        let values = data["embedding"]["values"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Gemini returned no embedding values"))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| anyhow::anyhow!("non-numeric embedding value"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder;
        let a = embedder.embed("solar panels").await.unwrap();
        let b = embedder.embed("solar panels").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[tokio::test]
    async fn test_hash_embedder_separates_texts() {
        let embedder = HashEmbedder;
        let a = embedder.embed("solar panels").await.unwrap();
        let b = embedder.embed("heat pumps").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_hash_embedder_values_are_normalized() {
        let embedder = HashEmbedder;
        let values = embedder.embed("anything").await.unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
