//! Ordered provider fallback: the first provider that answers wins.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::traits::{GeneratorError, TextGenerator};

pub struct ProviderChain {
    providers: Vec<Arc<dyn TextGenerator>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn TextGenerator>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl TextGenerator for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn complete(&self, prompt: &str, section: &str) -> Result<String, GeneratorError> {
        let mut failures: Vec<String> = Vec::new();
        for p in &self.providers {
            match p.complete(prompt, section).await {
                Ok(text) => {
                    if !failures.is_empty() {
                        tracing::info!(section, provider = p.name(), "fallback provider answered");
                    }
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!(section, provider = p.name(), "provider failed: {}", e);
                    failures.push(format!("{}: {}", p.name(), e));
                }
            }
        }
        Err(GeneratorError::Exhausted(if failures.is_empty() {
            "no providers configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    #[async_trait]
    impl TextGenerator for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn complete(&self, _prompt: &str, _section: &str) -> Result<String, GeneratorError> {
            self.1
                .map(str::to_string)
                .ok_or_else(|| GeneratorError::Http("down".into()))
        }
    }

    #[tokio::test]
    async fn falls_through_to_next_provider() {
        let chain = ProviderChain::new(vec![
            Arc::new(Fixed("a", None)),
            Arc::new(Fixed("b", Some("{\"ok\": true}"))),
        ]);
        assert_eq!(chain.complete("p", "identity").await.unwrap(), "{\"ok\": true}");
    }

    #[tokio::test]
    async fn reports_every_failure() {
        let chain = ProviderChain::new(vec![Arc::new(Fixed("a", None)), Arc::new(Fixed("b", None))]);
        let err = chain.complete("p", "identity").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a: http error: down"));
        assert!(msg.contains("b: http error: down"));
    }
}
