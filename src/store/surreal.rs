//! SurrealDB-backed stores over the WebSocket engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use tracing::{debug, info, warn};

use super::{AssessmentStore, DraftStore, InitiativeStore, TemplateStore};
use crate::assessment::{FrameworkRecord, FrameworkSource};
use crate::audit::{AuditEntry, AuditLog};
use crate::charter::CharterTemplate;
use crate::config::{RuntimeConfig, StorageConfig};
use crate::error::{ForgeError, Result};
use crate::model::{Assessment, Initiative, InitiativeDraft};
use crate::utils::db::has_supported_scheme;
use crate::utils::normalize_ws_url;

const ASSESSMENT: &str = "assessment";
const FRAMEWORK_ASSESSMENT: &str = "framework_assessment";
const TEMPLATE: &str = "charter_template";
const INITIATIVE: &str = "initiative";
const LINK: &str = "assessment_initiative";
const DRAFTS: &str = "initiative_draft";
const AUDIT: &str = "audit_log";

#[derive(Clone)]
pub struct SurrealStore {
    db: Arc<Surreal<Client>>,
}

impl SurrealStore {
    /// Connect, sign in and select namespace/database. Retries with exponential
    /// backoff when `connect_retries` is set.
    pub async fn connect(storage: &StorageConfig, runtime: &RuntimeConfig) -> Result<Self> {
        if has_supported_scheme(&storage.database_url) {
            debug!("stripping scheme from {}", storage.database_url);
        }
        let url = normalize_ws_url(&storage.database_url);
        let max_retries = storage.connect_retries;
        info!("connecting to SurrealDB at {}", url);

        let mut attempt = 0u32;
        let db = loop {
            match Surreal::new::<Ws>(url.as_str()).await {
                Ok(conn) => {
                    if attempt > 0 {
                        info!("connected to SurrealDB after {} attempts", attempt + 1);
                    }
                    break conn;
                }
                Err(e) if attempt >= max_retries => {
                    return Err(ForgeError::Database {
                        message: format!(
                            "failed to connect to SurrealDB at {} after {} attempts: {}",
                            storage.database_url,
                            attempt + 1,
                            e
                        ),
                    });
                }
                Err(e) => {
                    // 1s, 2s, 4s, ... capped at 60s
                    let delay_ms = (1000 * (1u64 << attempt.min(5))).min(60_000);
                    warn!(
                        "SurrealDB connection attempt {} failed: {}. Retrying in {}ms...",
                        attempt + 1,
                        e,
                        delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
            }
        };

        db.signin(surrealdb::opt::auth::Root {
            username: runtime.database_user.as_str(),
            password: runtime.database_pass.as_str(),
        })
        .await
        .map_err(|e| ForgeError::Database {
            message: format!(
                "failed to authenticate with SurrealDB as user '{}': {}",
                runtime.database_user, e
            ),
        })?;
        db.use_ns(&storage.database_ns)
            .use_db(&storage.database_db)
            .await?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn framework_source(&self, framework: &str) -> Arc<dyn FrameworkSource> {
        Arc::new(SurrealFrameworkSource {
            db: Arc::clone(&self.db),
            framework: framework.to_lowercase(),
        })
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>> {
        select_one(&self.db, table, id).await
    }
}

async fn select_one<T: DeserializeOwned>(
    db: &Surreal<Client>,
    table: &str,
    id: &str,
) -> Result<Option<T>> {
    let mut rows: Vec<Value> = db
        .query("SELECT *, meta::id(id) AS id FROM type::thing($tb, $id)")
        .bind(("tb", table.to_string()))
        .bind(("id", id.to_string()))
        .await?
        .take(0)?;
    match rows.pop() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Record content without its `id`; the id lives in the record key
fn content_without_id(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.remove("id");
            Value::Object(map)
        }
        other => other,
    }
}

#[async_trait]
impl AssessmentStore for SurrealStore {
    async fn get_assessment(&self, id: &str) -> Result<Option<Assessment>> {
        self.select_one(ASSESSMENT, id).await
    }

    async fn mark_initiatives_generated(&self, id: &str) -> Result<()> {
        let updated: Vec<Value> = self
            .db
            .query(
                "UPDATE type::thing($tb, $id) SET initiatives_generated = true, \
                 workflow_status = 'INITIATIVES_GENERATED' RETURN meta::id(id) AS id",
            )
            .bind(("tb", ASSESSMENT))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;
        if updated.is_empty() {
            return Err(ForgeError::not_found("assessment", id));
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for SurrealStore {
    async fn get_template(&self, id: &str) -> Result<Option<CharterTemplate>> {
        self.select_one(TEMPLATE, id).await
    }
}

#[async_trait]
impl InitiativeStore for SurrealStore {
    async fn insert(&self, initiative: &Initiative) -> Result<String> {
        let doc = content_without_id(serde_json::to_value(initiative)?);
        let created: Vec<Value> = self
            .db
            .query("CREATE type::thing($tb, $id) CONTENT $doc RETURN meta::id(id) AS id")
            .bind(("tb", INITIATIVE))
            .bind(("id", initiative.id.clone()))
            .bind(("doc", doc))
            .await?
            .take(0)?;
        created
            .first()
            .and_then(|row| row.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| ForgeError::Database {
                message: format!("initiative {} was not created", initiative.id),
            })
    }

    async fn link_to_assessment(&self, initiative_id: &str, assessment_id: &str) -> Result<()> {
        // Keyed by the pair, so repeating the link rewrites the same record
        self.db
            .query(
                "UPSERT type::thing($tb, $key) SET initiative_id = $iid, \
                 assessment_id = $aid, linked_at = time::now()",
            )
            .bind(("tb", LINK))
            .bind(("key", format!("{}_{}", assessment_id, initiative_id)))
            .bind(("iid", initiative_id.to_string()))
            .bind(("aid", assessment_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }
}

#[async_trait]
impl DraftStore for SurrealStore {
    async fn upsert_draft(&self, assessment_id: &str, drafts: &[InitiativeDraft]) -> Result<()> {
        let drafts = serde_json::to_value(drafts)?;
        self.db
            .query("UPSERT type::thing($tb, $id) SET drafts = $drafts, updated_at = time::now()")
            .bind(("tb", DRAFTS))
            .bind(("id", assessment_id.to_string()))
            .bind(("drafts", drafts))
            .await?
            .check()?;
        Ok(())
    }

    async fn get_draft(&self, assessment_id: &str) -> Result<Vec<InitiativeDraft>> {
        let mut rows: Vec<Value> = self
            .db
            .query("SELECT drafts FROM type::thing($tb, $id)")
            .bind(("tb", DRAFTS))
            .bind(("id", assessment_id.to_string()))
            .await?
            .take(0)?;
        match rows.pop().and_then(|mut row| row.get_mut("drafts").map(Value::take)) {
            Some(drafts) if !drafts.is_null() => Ok(serde_json::from_value(drafts)?),
            _ => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl AuditLog for SurrealStore {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        let id = entry.id.clone();
        let doc = content_without_id(serde_json::to_value(entry)?);
        self.db
            .query("CREATE type::thing($tb, $id) CONTENT $doc")
            .bind(("tb", AUDIT))
            .bind(("id", id))
            .bind(("doc", doc))
            .await?
            .check()?;
        Ok(())
    }
}

/// Secondary framework records stored as `framework_assessment:<framework>_<id>`
pub struct SurrealFrameworkSource {
    db: Arc<Surreal<Client>>,
    framework: String,
}

#[async_trait]
impl FrameworkSource for SurrealFrameworkSource {
    fn framework(&self) -> &str {
        &self.framework
    }

    async fn get_assessment(&self, id: &str, organization_id: &str) -> Result<FrameworkRecord> {
        let key = format!("{}_{}", self.framework, id);
        let row: Option<Value> = select_one(&self.db, FRAMEWORK_ASSESSMENT, &key).await?;
        let row = row
            .filter(|r| r.get("organization_id").and_then(Value::as_str) == Some(organization_id))
            .ok_or_else(|| ForgeError::not_found(format!("{} assessment", self.framework), id))?;
        let record = row.get("record").cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(record)?)
    }
}
