//! OpenAI-compatible chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::traits::{GeneratorError, TextGenerator};
use crate::config::OpenAiConfig;

const SYSTEM_PROMPT: &str = "You draft sections of digital transformation project charters. \
Use only the facts given in the prompt. Respond with a single JSON object that matches the \
requested shape and nothing else.";

#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    cfg: OpenAiConfig,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(cfg: OpenAiConfig, api_key: impl Into<String>) -> Result<Self, GeneratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeneratorError::NotConfigured("API key not set".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(format!("initiative-forge/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeneratorError::Http(format!("build http client: {}", e)))?;
        Ok(Self { cfg, api_key, http })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, section: &str) -> Result<String, GeneratorError> {
        let body = serde_json::json!({
            "model": self.cfg.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.cfg.temperature,
            "response_format": {"type": "json_object"}
        });
        let url = format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout {
                        timeout_ms: self.cfg.timeout_ms,
                    }
                } else {
                    GeneratorError::Http(e.to_string())
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GeneratorError::Http(format!("{}: {}", status, text)));
        }
        let v: Value = resp
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(format!("response body: {}", e)))?;
        let content = v["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        tracing::debug!(section, bytes = content.len(), "openai completion received");
        if content.is_empty() {
            return Err(GeneratorError::Parse("empty completion".to_string()));
        }
        Ok(content)
    }
}
