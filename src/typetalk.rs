use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

/// Thin client for posting messages into a single Typetalk topic.
pub struct TypetalkClient {
    client: Client,
    instance_url: String,
    topic_id: String,
    token: SecretString,
}

impl TypetalkClient {
    pub fn new(instance_url: String, topic_id: String, token: SecretString) -> Self {
        TypetalkClient {
            client: Client::new(),
            instance_url,
            topic_id,
            token,
        }
    }

    /// One POST, no retry. Any non-2xx response comes back as an error
    /// carrying the status and body.
    pub async fn post_message(&self, message: &str) -> anyhow::Result<()> {
        #[derive(serde::Serialize)]
        struct PostMessage<'a> {
            message: &'a str,
        }

        let url = format!("{}/api/v1/topics/{}", self.instance_url, self.topic_id);
        let response = self
            .client
            .post(&url)
            .header("X-TYPETALK-TOKEN", self.token.expose_secret())
            .json(&PostMessage { message })
            .send()
            .await
            .context("fail sending Typetalk message")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Typetalk API request failed with {status}: {body}");
        }
        Ok(())
    }
}
