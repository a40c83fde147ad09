use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default share of an initiative budget booked as capital expenditure
pub const DEFAULT_CAPEX_SHARE: f64 = 0.6;

const KNOWN_PROVIDERS: [&str; 2] = ["openai", "gemini_cli"];

/// Main configuration structure loaded from forge.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Scoring and synthesis constants
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Legacy flow keeps only gaps strictly above this size
    pub legacy_min_gap: f64,
    pub primary_weight: f64,
    pub secondary_weight: f64,
    pub default_weight: f64,
    pub budget_per_gap_point: f64,
    pub capex_share: f64,
    /// HIGH-risk drafts above this budget get a validation warning
    pub large_budget_warning: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            legacy_min_gap: 2.0,
            primary_weight: 1.2,
            secondary_weight: 1.1,
            default_weight: 1.0,
            budget_per_gap_point: 50_000.0,
            capex_share: DEFAULT_CAPEX_SHARE,
            large_budget_warning: 500_000,
        }
    }
}

/// Text generation provider chain
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    /// Ordered providers; the first one that answers wins
    pub providers: Vec<String>,
    /// Upper bound for one section's generation call
    pub section_timeout_ms: u64,
    /// Ask the generator for better summaries in the per-gap flow
    pub enrich_gap_drafts: bool,
    pub openai: OpenAiConfig,
    pub gemini_cli: GeminiCliConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: vec!["openai".to_string(), "gemini_cli".to_string()],
            section_timeout_ms: 20_000,
            enrich_gap_drafts: false,
            openai: OpenAiConfig::default(),
            gemini_cli: GeminiCliConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 20_000,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiCliConfig {
    pub path: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_output_bytes: usize,
}

impl Default for GeminiCliConfig {
    fn default() -> Self {
        Self {
            path: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_ms: 30_000,
            max_output_bytes: 256 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Surreal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub database_ns: String,
    pub database_db: String,
    /// Extra connection attempts with exponential backoff
    pub connect_retries: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: "127.0.0.1:8000".to_string(),
            database_ns: "initiative_forge".to_string(),
            database_db: "portfolio".to_string(),
            connect_retries: 0,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub database_user: String,
    pub database_pass: String,
    pub llm_api_key: Option<String>,
    pub log_level: String,
    pub generation_disabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_user: "root".to_string(),
            database_pass: "root".to_string(),
            llm_api_key: None,
            log_level: "initiative_forge=info".to_string(),
            generation_disabled: false,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            database_user: std::env::var("FORGE_DB_USER").unwrap_or_else(|_| "root".to_string()),
            database_pass: std::env::var("FORGE_DB_PASS").unwrap_or_else(|_| "root".to_string()),
            // Prefer the forge-specific key, fall back to the conventional one
            llm_api_key: std::env::var("FORGE_LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "initiative_forge=info".to_string()),
            generation_disabled: std::env::var("FORGE_GENERATION_DISABLED")
                .ok()
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        }
    }
}

/// Load `FORGE_ENV_FILE`, else `./.env`. Variables already set win; a missing
/// file is not an error.
pub fn load_dotenv() -> bool {
    let path = std::env::var("FORGE_ENV_FILE").unwrap_or_else(|_| ".env".to_string());
    load_env_file(path)
}

pub fn load_env_file(path: impl AsRef<Path>) -> bool {
    dotenvy::from_path(path.as_ref()).is_ok()
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses FORGE_CONFIG or defaults to "forge.toml".
    pub fn load() -> anyhow::Result<Self> {
        load_dotenv();

        let config_path =
            std::env::var("FORGE_CONFIG").unwrap_or_else(|_| "forge.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_path(&config_path)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Env-first storage overrides
        if let Ok(db_url) = std::env::var("FORGE_DB_URL") {
            config.storage.database_url = db_url;
            tracing::debug!("FORGE_DB_URL env override applied");
        }
        if let Ok(db_ns) = std::env::var("FORGE_DB_NS") {
            config.storage.database_ns = db_ns;
        }
        if let Ok(db_name) = std::env::var("FORGE_DB_DB") {
            config.storage.database_db = db_name;
        }

        config.runtime = RuntimeConfig::load_from_env();
        if config.runtime.generation_disabled {
            config.generation.enabled = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without touching the environment
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Clamp out-of-range values and reject incoherent ones
    pub fn validate(&mut self) -> anyhow::Result<()> {
        let p = &mut self.pipeline;
        if !(0.0..=1.0).contains(&p.capex_share) {
            tracing::warn!("capex_share {} outside 0..=1, clamping", p.capex_share);
            p.capex_share = p.capex_share.clamp(0.0, 1.0);
        }
        if p.legacy_min_gap < 0.0 {
            tracing::warn!("legacy_min_gap {} is negative, using 0", p.legacy_min_gap);
            p.legacy_min_gap = 0.0;
        }
        for (name, w) in [
            ("primary_weight", p.primary_weight),
            ("secondary_weight", p.secondary_weight),
            ("default_weight", p.default_weight),
        ] {
            if w <= 0.0 || !w.is_finite() {
                anyhow::bail!("pipeline.{} must be a positive number, got {}", name, w);
            }
        }
        if p.budget_per_gap_point <= 0.0 {
            anyhow::bail!("pipeline.budget_per_gap_point must be > 0");
        }

        let g = &mut self.generation;
        if g.section_timeout_ms == 0 {
            tracing::warn!("generation.section_timeout_ms is 0, using 20000");
            g.section_timeout_ms = 20_000;
        }
        g.providers.retain(|p| {
            let known = KNOWN_PROVIDERS.contains(&p.as_str());
            if !known {
                tracing::warn!("Unknown generation provider '{}' ignored", p);
            }
            known
        });

        if self.storage.backend == StorageBackend::Surreal {
            let normalized = crate::utils::normalize_ws_url(&self.storage.database_url);
            if !normalized.contains(':') || normalized.starts_with(':') || normalized.ends_with(':')
            {
                tracing::warn!(
                    "Database URL '{}' appears to be missing hostname or port",
                    self.storage.database_url
                );
            }
        }
        if self.storage.connect_retries > 10 {
            tracing::warn!(
                "connect_retries {} exceeds max 10, clamping to 10",
                self.storage.connect_retries
            );
            self.storage.connect_retries = 10;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_business_rules() {
        let cfg = Config::default();
        assert_eq!(cfg.pipeline.primary_weight, 1.2);
        assert_eq!(cfg.pipeline.secondary_weight, 1.1);
        assert_eq!(cfg.pipeline.budget_per_gap_point, 50_000.0);
        assert_eq!(cfg.pipeline.legacy_min_gap, 2.0);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn env_file_values_are_visible_after_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FORGE_DOTENV_CHECK=from-file").unwrap();
        assert!(load_env_file(file.path()));
        assert_eq!(std::env::var("FORGE_DOTENV_CHECK").unwrap(), "from-file");
        assert!(!load_env_file("/definitely/missing/.env"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[generation]\nproviders = [\"gemini_cli\", \"mystery\"]\nsection_timeout_ms = 0\n\n[pipeline]\ncapex_share = 1.5"
        )
        .unwrap();
        let cfg = Config::from_path(file.path()).unwrap();
        assert_eq!(cfg.generation.providers, vec!["gemini_cli".to_string()]);
        assert_eq!(cfg.generation.section_timeout_ms, 20_000);
        assert_eq!(cfg.pipeline.capex_share, 1.0);
        assert_eq!(cfg.pipeline.large_budget_warning, 500_000);
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nprimary_weight = 0.0").unwrap();
        assert!(Config::from_path(file.path()).is_err());
    }

    #[test]
    fn unknown_backend_fails_to_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"sqlite\"").unwrap();
        assert!(Config::from_path(file.path()).is_err());
    }
}
