//! LLM client for text generation via a local Ollama instance.
//!
//! One [`LlmClient`] is constructed at startup and shared across all
//! request handlers, so the connection pool and model identifier are not
//! rebuilt per request. Generation is a single call with no retry,
//! no timeout, and no streaming.

use anyhow::{bail, Result};

use crate::config::LlmConfig;

/// Client for Ollama's `POST /api/generate` endpoint.
pub struct LlmClient {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            url: config.url.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Send a prompt to the model and return its full completion text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url,
                    e
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_generate_response(&json)
    }
}

fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_response_parses_text() {
        let json = serde_json::json!({ "response": "4", "done": true });
        assert_eq!(parse_generate_response(&json).unwrap(), "4");
    }

    #[test]
    fn missing_response_field_is_an_error() {
        let json = serde_json::json!({ "done": true });
        assert!(parse_generate_response(&json).is_err());
    }
}
