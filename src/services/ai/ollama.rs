use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::TextGenerator;

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "system": system_prompt,
            "prompt": prompt,
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama API")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Ollama response")?;

        data["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing response in Ollama reply"))
    }
}
