//! Gemini CLI provider: prompt on stdin, answer on stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::clients::traits::{GeneratorError, TextGenerator};
use crate::config::GeminiCliConfig;

#[derive(Debug, Clone)]
pub struct GeminiCliClient {
    cfg: GeminiCliConfig,
}

impl GeminiCliClient {
    pub fn new(cfg: GeminiCliConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl TextGenerator for GeminiCliClient {
    fn name(&self) -> &str {
        "gemini_cli"
    }

    async fn complete(&self, prompt: &str, section: &str) -> Result<String, GeneratorError> {
        let mut cmd = Command::new(&self.cfg.path);
        cmd.kill_on_drop(true)
            .env("CI", "true")
            .env("TERM", "dumb")
            .env("NO_COLOR", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.cfg.model != "auto" && !self.cfg.model.is_empty() {
            cmd.arg("-m").arg(&self.cfg.model);
        }
        cmd.args(["-p", "-"]);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GeneratorError::NotConfigured(format!("{} not found", self.cfg.path))
            } else {
                GeneratorError::Cli(format!("spawn {}: {}", self.cfg.path, e))
            }
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| GeneratorError::Cli(format!("write prompt to stdin: {}", e)))?;
        }

        let timeout = Duration::from_millis(self.cfg.timeout_ms);
        let out = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| GeneratorError::Timeout {
                timeout_ms: self.cfg.timeout_ms,
            })?
            .map_err(|e| GeneratorError::Cli(format!("gemini cli failed to run: {}", e)))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(GeneratorError::Cli(format!(
                "gemini exited {}: {}",
                out.status,
                stderr.chars().take(512).collect::<String>()
            )));
        }
        let mut stdout = out.stdout;
        if stdout.len() > self.cfg.max_output_bytes {
            tracing::warn!(section, "gemini output truncated to {} bytes", self.cfg.max_output_bytes);
            stdout.truncate(self.cfg.max_output_bytes);
        }
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
