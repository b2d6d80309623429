use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::TenantContext;
use crate::services::embeddings::Embedder;
use crate::services::vector::{ChunkMetadata, VectorIndex, VectorRecord};

const DEFAULT_CHUNK_SIZE: usize = 512;
const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocument {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionOutcome {
    pub processed: usize,
    pub failed: usize,
}

/// Turns documents into namespaced chunk vectors. A failing document is
/// counted and skipped; the batch keeps going.
pub struct IngestionPipeline {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    base_path: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IngestionPipeline {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            base_path: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub async fn run(
        &self,
        context: &TenantContext,
        documents: Vec<IngestDocument>,
    ) -> anyhow::Result<IngestionOutcome> {
        let mut outcome = IngestionOutcome::default();
        let mut records: Vec<VectorRecord> = Vec::new();

        for document in documents {
            match self.prepare_records(context, &document).await {
                Ok(mut prepared) => {
                    outcome.processed += prepared.len();
                    records.append(&mut prepared);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to ingest document");
                    outcome.failed += 1;
                }
            }
        }

        if !records.is_empty() {
            let namespace = context.namespace();
            let count = records.len();
            self.index.upsert(&namespace, records).await?;
            tracing::info!(namespace = %namespace, chunks = count, "ingestion upserted");
        }

        Ok(outcome)
    }

    async fn prepare_records(
        &self,
        context: &TenantContext,
        document: &IngestDocument,
    ) -> anyhow::Result<Vec<VectorRecord>> {
        let (text, source_path) = match (&document.text, &document.source_path) {
            (Some(text), source) => (text.clone(), source.clone()),
            (None, Some(path)) => (self.load_file(path)?, Some(path.clone())),
            (None, None) => {
                anyhow::bail!("document must provide either 'text' or 'source_path'")
            }
        };

        let mut records = Vec::new();
        for chunk in chunk_words(&text, self.chunk_size, self.chunk_overlap) {
            let values = self.embedder.embed(&chunk).await?;
            records.push(VectorRecord {
                id: uuid::Uuid::new_v4().to_string(),
                values,
                metadata: ChunkMetadata {
                    org_id: context.org_id.clone(),
                    branch_id: context.branch_id.clone(),
                    session_id: Some(context.user_session_id.clone()),
                    source_path: source_path.clone(),
                    text: chunk,
                },
            });
        }
        Ok(records)
    }

    fn load_file(&self, source_path: &str) -> anyhow::Result<String> {
        let candidate = Path::new(source_path);
        let resolved = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_path.join(candidate)
        };
        if !resolved.exists() {
            anyhow::bail!("source file not found: {source_path}");
        }
        Ok(std::fs::read_to_string(resolved)?)
    }
}

/// Word-window chunking with overlap between consecutive chunks.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embeddings::HashEmbedder;
    use crate::services::vector::memory::InMemoryIndex;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_words("a handful of words only", 512, 50);
        assert_eq!(chunks, vec!["a handful of words only"]);
    }

    #[test]
    fn test_chunks_overlap_and_cover_everything() {
        let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let chunks = chunk_words(&text, 10, 3);

        assert!(chunks[0].starts_with("w0"));
        assert!(chunks.last().unwrap().ends_with("w24"));
        // Overlap: chunk 1 starts 7 words in, repeating w7..w9.
        assert!(chunks[1].starts_with("w7"));
        for i in 0..25 {
            let needle = format!("w{i}");
            assert!(chunks.iter().any(|c| c.split(' ').any(|w| w == needle)));
        }
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_words("   ", 10, 3).is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_counts_and_upserts() {
        let index = Arc::new(InMemoryIndex::new());
        let pipeline =
            IngestionPipeline::new(index.clone(), Arc::new(HashEmbedder)).with_chunking(8, 2);
        let context = TenantContext::new("org", "branch", "sess");

        let outcome = pipeline
            .run(
                &context,
                vec![
                    IngestDocument {
                        text: Some("solar install guide ".repeat(10)),
                        source_path: None,
                    },
                    IngestDocument {
                        text: None,
                        source_path: Some("/definitely/not/here.txt".to_string()),
                    },
                ],
            )
            .await
            .unwrap();

        assert!(outcome.processed > 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(index.vector_count("org::branch"), outcome.processed);
    }

    #[tokio::test]
    async fn test_document_without_content_fails() {
        let index = Arc::new(InMemoryIndex::new());
        let pipeline = IngestionPipeline::new(index, Arc::new(HashEmbedder));
        let context = TenantContext::new("org", "branch", "sess");

        let outcome = pipeline
            .run(
                &context,
                vec![IngestDocument {
                    text: None,
                    source_path: None,
                }],
            )
            .await
            .unwrap();

        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.failed, 1);
    }
}
