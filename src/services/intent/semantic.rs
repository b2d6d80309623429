use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::Intent;
use crate::services::intent::IntentClassifier;

const DEFAULT_THRESHOLD: f32 = 0.12;

// Small labeled example set; profiles are the per-intent mean tf-idf vector.
const TRAINING_PHRASES: &[(Intent, &str)] = &[
    (Intent::RagInfo, "what services do you offer"),
    (Intent::RagInfo, "tell me about your company"),
    (Intent::RagInfo, "where are you located and what are your hours"),
    (Intent::RagInfo, "do you have documentation about the installation process"),
    (Intent::PurchaseInterest, "how much does it cost"),
    (Intent::PurchaseInterest, "i am interested in buying your product"),
    (Intent::PurchaseInterest, "what is the price of your plans"),
    (Intent::PurchaseInterest, "can i get a quote for this"),
    (Intent::Booking, "book an appointment for tomorrow"),
    (Intent::Booking, "schedule a demo with your team"),
    (Intent::Booking, "can we set up a meeting next week"),
    (Intent::Booking, "i want to book a consultation"),
    (Intent::CancelBooking, "cancel my appointment"),
    (Intent::CancelBooking, "i need to reschedule our meeting"),
    (Intent::CancelBooking, "please call off my booking"),
    (Intent::CancelBooking, "drop my reservation for friday"),
];

/// Bag-of-words tf-idf classifier: cosine similarity between the query and
/// each intent's mean profile vector, with a floor below which everything
/// falls back to `RAG_INFO`.
pub struct SemanticClassifier {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
    profiles: Vec<(Intent, Vec<f32>)>,
    threshold: f32,
}

impl Default for SemanticClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticClassifier {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        let tokenized: Vec<(Intent, Vec<String>)> = TRAINING_PHRASES
            .iter()
            .map(|(intent, phrase)| (*intent, tokenize(phrase)))
            .collect();

        let mut vocab: HashMap<String, usize> = HashMap::new();
        for (_, tokens) in &tokenized {
            for token in tokens {
                let next = vocab.len();
                vocab.entry(token.clone()).or_insert(next);
            }
        }

        // Smoothed idf: ln((1 + N) / (1 + df)) + 1.
        let total = tokenized.len() as f32;
        let mut df = vec![0usize; vocab.len()];
        for (_, tokens) in &tokenized {
            let mut seen: Vec<usize> = tokens.iter().map(|t| vocab[t]).collect();
            seen.sort_unstable();
            seen.dedup();
            for idx in seen {
                df[idx] += 1;
            }
        }
        let idf: Vec<f32> = df
            .iter()
            .map(|&d| ((1.0 + total) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let mut profiles = Vec::with_capacity(Intent::ALL.len());
        for intent in Intent::ALL {
            let members: Vec<&Vec<String>> = tokenized
                .iter()
                .filter(|(i, _)| *i == intent)
                .map(|(_, tokens)| tokens)
                .collect();
            let mut mean = vec![0.0f32; vocab.len()];
            for tokens in &members {
                let vector = vectorize(tokens, &vocab, &idf);
                for (slot, value) in mean.iter_mut().zip(vector) {
                    *slot += value;
                }
            }
            if !members.is_empty() {
                for slot in mean.iter_mut() {
                    *slot /= members.len() as f32;
                }
            }
            profiles.push((intent, mean));
        }

        Self {
            vocab,
            idf,
            profiles,
            threshold,
        }
    }

    pub fn classify_query(&self, query: &str) -> Intent {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Intent::RagInfo;
        }

        let vector = vectorize(&tokens, &self.vocab, &self.idf);
        let mut best = Intent::RagInfo;
        let mut best_score = f32::NEG_INFINITY;
        // Strictly-greater comparison keeps the first-seen intent on ties.
        for (intent, profile) in &self.profiles {
            let score = cosine(&vector, profile);
            if score > best_score {
                best_score = score;
                best = *intent;
            }
        }

        if best_score > self.threshold {
            best
        } else {
            Intent::RagInfo
        }
    }
}

#[async_trait]
impl IntentClassifier for SemanticClassifier {
    async fn classify(&self, query: &str) -> Intent {
        self.classify_query(query)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

// tf is the term-frequency ratio over the phrase's token count, not a raw
// count.
fn vectorize(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f32]) -> Vec<f32> {
    let mut counts = vec![0usize; idf.len()];
    for token in tokens {
        if let Some(&idx) = vocab.get(token) {
            counts[idx] += 1;
        }
    }
    let total = tokens.len() as f32;
    counts
        .iter()
        .zip(idf)
        .map(|(&count, &weight)| (count as f32 / total) * weight)
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_is_rag_info() {
        let c = SemanticClassifier::new();
        assert_eq!(c.classify_query(""), Intent::RagInfo);
        assert_eq!(c.classify_query("  ...  "), Intent::RagInfo);
    }

    #[test]
    fn test_known_phrases_classify() {
        let c = SemanticClassifier::new();
        assert_eq!(c.classify_query("how much does it cost"), Intent::PurchaseInterest);
        assert_eq!(c.classify_query("cancel my appointment"), Intent::CancelBooking);
        assert_eq!(
            c.classify_query("can you book an appointment for tomorrow"),
            Intent::Booking
        );
    }

    #[test]
    fn test_out_of_vocabulary_query_falls_back() {
        let c = SemanticClassifier::new();
        assert_eq!(c.classify_query("xylophone zeppelin quark"), Intent::RagInfo);
    }

    #[test]
    fn test_threshold_gates_weak_matches() {
        // A threshold above 1.0 can never be exceeded by a cosine score.
        let c = SemanticClassifier::with_threshold(1.5);
        assert_eq!(c.classify_query("cancel my appointment"), Intent::RagInfo);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = SemanticClassifier::new();
        let first = c.classify_query("i am interested in a quote");
        for _ in 0..10 {
            assert_eq!(c.classify_query("i am interested in a quote"), first);
        }
    }
}
