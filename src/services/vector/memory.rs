use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{QueryMatch, VectorIndex, VectorRecord};

/// In-process index for development and tests. Cosine ranking over a
/// per-namespace record list.
#[derive(Default)]
pub struct InMemoryIndex {
    namespaces: Mutex<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vector_count(&self, namespace: &str) -> usize {
        self.namespaces
            .lock()
            .unwrap()
            .get(namespace)
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> anyhow::Result<()> {
        let mut namespaces = self.namespaces.lock().unwrap();
        let slot = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            if let Some(existing) = slot.iter_mut().find(|r| r.id == record.id) {
                *existing = record;
            } else {
                slot.push(record);
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> anyhow::Result<Vec<QueryMatch>> {
        let namespaces = self.namespaces.lock().unwrap();
        let mut matches: Vec<QueryMatch> = namespaces
            .get(namespace)
            .map(|records| {
                records
                    .iter()
                    .map(|r| QueryMatch {
                        id: r.id.clone(),
                        score: cosine(vector, &r.values),
                        metadata: Some(r.metadata.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
