pub mod chain;
pub mod gemini_cli;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::Config;

pub use chain::ProviderChain;
pub use gemini_cli::GeminiCliClient;
pub use openai::OpenAiCompatClient;
pub use traits::{Generation, GeneratorError, TextGenerator, generate_section, parse_json_payload};

/// Build the configured provider chain. `None` when generation is disabled or no
/// provider is usable; callers then go straight to deterministic defaults.
pub fn create_generator(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    if !config.generation.enabled {
        tracing::info!("text generation disabled; charters will use templates and defaults");
        return None;
    }
    let mut providers: Vec<Arc<dyn TextGenerator>> = Vec::new();
    for name in &config.generation.providers {
        match name.as_str() {
            "openai" => match config.runtime.llm_api_key.as_deref() {
                Some(key) => match OpenAiCompatClient::new(config.generation.openai.clone(), key) {
                    Ok(client) => providers.push(Arc::new(client)),
                    Err(e) => tracing::warn!("openai provider unavailable: {}", e),
                },
                None => tracing::warn!("openai provider skipped: no API key in environment"),
            },
            "gemini_cli" => providers.push(Arc::new(GeminiCliClient::new(
                config.generation.gemini_cli.clone(),
            ))),
            other => tracing::warn!("unknown provider '{}' skipped", other),
        }
    }
    match providers.len() {
        0 => None,
        1 => providers.pop(),
        _ => Some(Arc::new(ProviderChain::new(providers))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_generation_yields_none() {
        let mut cfg = Config::default();
        cfg.generation.enabled = false;
        assert!(create_generator(&cfg).is_none());
    }

    #[test]
    fn openai_without_key_is_skipped() {
        let mut cfg = Config::default();
        cfg.generation.providers = vec!["openai".into()];
        assert!(create_generator(&cfg).is_none());
    }

    #[test]
    fn gemini_cli_alone_is_used_directly() {
        let mut cfg = Config::default();
        cfg.generation.providers = vec!["gemini_cli".into()];
        let generator = create_generator(&cfg).unwrap();
        assert_eq!(generator.name(), "gemini_cli");
    }
}
