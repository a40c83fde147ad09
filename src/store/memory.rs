//! In-process store used by tests and the CLI `memory` backend.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{AssessmentStore, DraftStore, InitiativeStore, TemplateStore};
use crate::assessment::{FrameworkRecord, FrameworkSource};
use crate::audit::{AuditEntry, AuditLog};
use crate::charter::CharterTemplate;
use crate::error::{ForgeError, Result};
use crate::model::{Assessment, Initiative, InitiativeDraft, WorkflowStatus};

/// Secondary framework record owned by one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkEntry {
    pub framework: String,
    pub organization_id: String,
    pub record: FrameworkRecord,
}

impl FrameworkEntry {
    fn record_id(&self) -> &str {
        match &self.record {
            FrameworkRecord::Lean(l) => &l.id,
            FrameworkRecord::External(e) => &e.id,
        }
    }
}

/// JSON seed for a [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub assessments: Vec<Assessment>,
    pub frameworks: Vec<FrameworkEntry>,
    pub templates: Vec<CharterTemplate>,
    pub drafts: HashMap<String, Vec<InitiativeDraft>>,
}

type FrameworkKey = (String, String);

#[derive(Default)]
pub struct MemoryStore {
    assessments: RwLock<HashMap<String, Assessment>>,
    frameworks: Arc<RwLock<HashMap<FrameworkKey, FrameworkEntry>>>,
    templates: RwLock<HashMap<String, CharterTemplate>>,
    initiatives: RwLock<Vec<Initiative>>,
    links: RwLock<HashSet<(String, String)>>,
    drafts: RwLock<HashMap<String, Vec<InitiativeDraft>>>,
    audit: RwLock<Vec<AuditEntry>>,
    marks: RwLock<HashMap<String, usize>>,
    failing_drafts: RwLock<HashSet<String>>,
    audit_down: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let framework_map = snapshot
            .frameworks
            .into_iter()
            .map(|e| ((e.framework.to_lowercase(), e.record_id().to_string()), e))
            .collect();
        Self {
            assessments: RwLock::new(
                snapshot
                    .assessments
                    .into_iter()
                    .map(|a| (a.id.clone(), a))
                    .collect(),
            ),
            frameworks: Arc::new(RwLock::new(framework_map)),
            templates: RwLock::new(
                snapshot
                    .templates
                    .into_iter()
                    .map(|t| (t.id.clone(), t))
                    .collect(),
            ),
            drafts: RwLock::new(snapshot.drafts),
            ..Default::default()
        }
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ForgeError::Config {
                message: format!("failed to read snapshot {}: {}", path.display(), e),
            })?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        debug!(
            "seeded memory store: {} assessments, {} framework records, {} templates",
            snapshot.assessments.len(),
            snapshot.frameworks.len(),
            snapshot.templates.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn put_assessment(&self, assessment: Assessment) {
        self.assessments
            .write()
            .await
            .insert(assessment.id.clone(), assessment);
    }

    pub async fn put_framework_record(&self, entry: FrameworkEntry) {
        let key = (entry.framework.to_lowercase(), entry.record_id().to_string());
        self.frameworks.write().await.insert(key, entry);
    }

    pub async fn put_template(&self, template: CharterTemplate) {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
    }

    /// One [`FrameworkSource`] per framework name, sharing this store's records
    pub fn framework_source(&self, framework: &str) -> Arc<dyn FrameworkSource> {
        Arc::new(MemoryFrameworkSource {
            framework: framework.to_lowercase(),
            records: Arc::clone(&self.frameworks),
        })
    }

    /// Distinct framework names present in the store
    pub async fn frameworks(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .frameworks
            .read()
            .await
            .keys()
            .map(|(f, _)| f.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Make `insert` fail for the given draft id
    pub async fn fail_inserts_for(&self, draft_id: &str) {
        self.failing_drafts.write().await.insert(draft_id.to_string());
    }

    pub async fn set_audit_down(&self, down: bool) {
        *self.audit_down.write().await = down;
    }

    pub async fn initiatives(&self) -> Vec<Initiative> {
        self.initiatives.read().await.clone()
    }

    pub async fn links(&self) -> Vec<(String, String)> {
        let mut links: Vec<_> = self.links.read().await.iter().cloned().collect();
        links.sort();
        links
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }

    /// How many times the assessment was marked as having generated initiatives
    pub async fn mark_count(&self, assessment_id: &str) -> usize {
        self.marks
            .read()
            .await
            .get(assessment_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get_assessment(&self, id: &str) -> Result<Option<Assessment>> {
        Ok(self.assessments.read().await.get(id).cloned())
    }

    async fn mark_initiatives_generated(&self, id: &str) -> Result<()> {
        let mut assessments = self.assessments.write().await;
        let assessment = assessments
            .get_mut(id)
            .ok_or_else(|| ForgeError::not_found("assessment", id))?;
        assessment.initiatives_generated = true;
        assessment.workflow_status = WorkflowStatus::InitiativesGenerated;
        *self.marks.write().await.entry(id.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_template(&self, id: &str) -> Result<Option<CharterTemplate>> {
        Ok(self.templates.read().await.get(id).cloned())
    }
}

#[async_trait]
impl InitiativeStore for MemoryStore {
    async fn insert(&self, initiative: &Initiative) -> Result<String> {
        if self
            .failing_drafts
            .read()
            .await
            .contains(&initiative.draft_id)
        {
            return Err(ForgeError::Database {
                message: format!("insert rejected for draft {}", initiative.draft_id),
            });
        }
        self.initiatives.write().await.push(initiative.clone());
        Ok(initiative.id.clone())
    }

    async fn link_to_assessment(&self, initiative_id: &str, assessment_id: &str) -> Result<()> {
        self.links
            .write()
            .await
            .insert((initiative_id.to_string(), assessment_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn upsert_draft(&self, assessment_id: &str, drafts: &[InitiativeDraft]) -> Result<()> {
        self.drafts
            .write()
            .await
            .insert(assessment_id.to_string(), drafts.to_vec());
        Ok(())
    }

    async fn get_draft(&self, assessment_id: &str) -> Result<Vec<InitiativeDraft>> {
        Ok(self
            .drafts
            .read()
            .await
            .get(assessment_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        if *self.audit_down.read().await {
            return Err(ForgeError::Database {
                message: "audit log unavailable".to_string(),
            });
        }
        self.audit.write().await.push(entry);
        Ok(())
    }
}

pub struct MemoryFrameworkSource {
    framework: String,
    records: Arc<RwLock<HashMap<FrameworkKey, FrameworkEntry>>>,
}

#[async_trait]
impl FrameworkSource for MemoryFrameworkSource {
    fn framework(&self) -> &str {
        &self.framework
    }

    async fn get_assessment(&self, id: &str, organization_id: &str) -> Result<FrameworkRecord> {
        let records = self.records.read().await;
        records
            .get(&(self.framework.clone(), id.to_string()))
            .filter(|e| e.organization_id == organization_id)
            .map(|e| e.record.clone())
            .ok_or_else(|| ForgeError::not_found(format!("{} assessment", self.framework), id))
    }
}
