use anyhow::Context;
use async_trait::async_trait;

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct ResendMailer {
    api_key: String,
    sender: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_key: String, sender: String) -> Self {
        Self {
            api_key,
            sender,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailNotifier for ResendMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "from": self.sender,
            "to": [recipient],
            "subject": subject,
            "text": body,
        });

        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to send email")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}

/// Dev-mode notifier: records the send in the log and succeeds.
pub struct LogMailer;

#[async_trait]
impl EmailNotifier for LogMailer {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        tracing::info!(recipient, subject, "email notification (log only)");
        Ok(())
    }
}
