//! Best-effort audit trail for generated artifacts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    /// What produced the entry ("charter", "transfer", ...)
    pub kind: String,
    pub source_type: Option<String>,
    pub inputs: Value,
    pub output: Value,
    pub confidence: Option<String>,
    pub duration_ms: u64,
    /// blake3 of the serialized inputs; identical requests share a digest
    pub input_digest: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(kind: impl Into<String>, inputs: Value, output: Value) -> Self {
        let input_digest = digest(&inputs);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            source_type: None,
            inputs,
            output,
            confidence: None,
            duration_ms: 0,
            input_digest,
            created_at: Utc::now(),
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = Some(confidence.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

pub fn digest(value: &Value) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// Audit failures never fail the operation being audited
pub async fn record_best_effort(log: Option<&dyn AuditLog>, entry: AuditEntry) {
    let Some(log) = log else {
        return;
    };
    let kind = entry.kind.clone();
    if let Err(e) = log.record(entry).await {
        warn!("audit entry for {} not recorded: {}", kind, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use serde_json::json;

    struct BrokenLog;

    #[async_trait]
    impl AuditLog for BrokenLog {
        async fn record(&self, _entry: AuditEntry) -> Result<()> {
            Err(ForgeError::Database {
                message: "down".into(),
            })
        }
    }

    #[test]
    fn digest_is_stable_for_equal_inputs() {
        let a = AuditEntry::new("charter", json!({"gaps": [1, 2]}), json!(null));
        let b = AuditEntry::new("charter", json!({"gaps": [1, 2]}), json!({"x": 1}));
        assert_eq!(a.input_digest, b.input_digest);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let entry = AuditEntry::new("charter", json!({}), json!({})).with_duration_ms(5);
        record_best_effort(Some(&BrokenLog), entry).await;
        record_best_effort(None, AuditEntry::new("charter", json!({}), json!({}))).await;
    }
}
