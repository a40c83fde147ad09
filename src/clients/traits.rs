use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("http error: {0}")]
    Http(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("all providers failed: {0}")]
    Exhausted(String),
}

/// Opaque text-completion collaborator. `section` tags the charter section (or
/// other artifact) the prompt is for, so providers can log and route by it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, section: &str) -> Result<String, GeneratorError>;
}

/// Outcome of one generation attempt. Every call site has to handle the
/// malformed and unavailable arms explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Parsed(Value),
    Malformed(String),
    Unavailable(String),
}

impl Generation {
    pub fn from_completion(result: Result<String, GeneratorError>) -> Self {
        match result {
            Ok(text) => match parse_json_payload(&text) {
                Ok(value) => Generation::Parsed(value),
                Err(e) => Generation::Malformed(e.to_string()),
            },
            Err(GeneratorError::Parse(msg)) => Generation::Malformed(msg),
            Err(e) => Generation::Unavailable(e.to_string()),
        }
    }
}

/// Call the generator with an upper bound on how long the section may take
pub async fn generate_section(
    generator: &dyn TextGenerator,
    prompt: &str,
    section: &str,
    timeout: Duration,
) -> Generation {
    match tokio::time::timeout(timeout, generator.complete(prompt, section)).await {
        Ok(result) => Generation::from_completion(result),
        Err(_) => Generation::Unavailable(
            GeneratorError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
            .to_string(),
        ),
    }
}

/// Pull one JSON value out of model output; strips code fences and surrounding prose
pub fn parse_json_payload(text: &str) -> Result<Value, GeneratorError> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if trimmed.is_empty() {
        return Err(GeneratorError::Parse("empty response".to_string()));
    }
    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(first) => {
            let start = trimmed.find(['{', '[']);
            let end = trimmed.rfind(['}', ']']);
            match (start, end) {
                (Some(s), Some(e)) if e > s => serde_json::from_str::<Value>(&trimmed[s..=e])
                    .map_err(|e| GeneratorError::Parse(format!("invalid JSON: {}", e)))?,
                _ => return Err(GeneratorError::Parse(format!("invalid JSON: {}", first))),
            }
        }
    };
    if value.is_null() {
        return Err(GeneratorError::Parse("null payload".to_string()));
    }
    Ok(value)
}
