//! Approval and batch transfer of drafts into the initiative store.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLog, record_best_effort};
use crate::error::{ForgeError, Result};
use crate::model::{DraftStatus, Initiative, InitiativeDraft};
use crate::store::{AssessmentStore, DraftStore, InitiativeStore};
use crate::validation::Validator;

/// `DRAFT → APPROVED`; anything else is rejected
pub fn approve(draft: &mut InitiativeDraft) -> Result<()> {
    match draft.status {
        DraftStatus::Draft => {
            draft.status = DraftStatus::Approved;
            Ok(())
        }
        DraftStatus::Approved => Err(ForgeError::Transfer {
            message: format!("draft {} is already approved", draft.id),
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub project_id: String,
    #[serde(default)]
    pub source_assessment_id: Option<String>,
    pub drafts: Vec<InitiativeDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferredDraft {
    pub draft_id: String,
    pub initiative_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedDraft {
    pub draft_id: String,
    pub name: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferReport {
    pub transferred: Vec<TransferredDraft>,
    pub failed: Vec<FailedDraft>,
    pub total: usize,
}

pub struct TransferService {
    validator: Validator,
    initiatives: Arc<dyn InitiativeStore>,
    assessments: Arc<dyn AssessmentStore>,
    drafts: Arc<dyn DraftStore>,
    audit: Option<Arc<dyn AuditLog>>,
}

impl TransferService {
    pub fn new(
        validator: Validator,
        initiatives: Arc<dyn InitiativeStore>,
        assessments: Arc<dyn AssessmentStore>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        Self {
            validator,
            initiatives,
            assessments,
            drafts,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Drafts are processed one at a time; a failing draft never stops the batch
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReport> {
        let project_id = request.project_id.trim();
        if project_id.is_empty() {
            return Err(ForgeError::invalid("project_id is required"));
        }
        let batch_assessment = request
            .source_assessment_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut report = TransferReport {
            total: request.drafts.len(),
            ..Default::default()
        };
        let mut to_mark: Vec<String> = Vec::new();
        let mut transferred_ids: HashSet<String> = HashSet::new();

        for draft in request.drafts.iter().cloned() {
            let draft_id = draft.id.clone();
            let name = draft.name.clone();
            match self.transfer_one(draft, project_id, batch_assessment).await {
                Ok((initiative_id, assessment_id)) => {
                    debug!("draft {} transferred as initiative {}", draft_id, initiative_id);
                    if let Some(a) = assessment_id
                        && !to_mark.contains(&a)
                    {
                        to_mark.push(a);
                    }
                    transferred_ids.insert(draft_id.clone());
                    report.transferred.push(TransferredDraft {
                        draft_id,
                        initiative_id,
                    });
                }
                Err(errors) => {
                    warn!("draft {} ('{}') not transferred: {}", draft_id, name, errors.join("; "));
                    report.failed.push(FailedDraft {
                        draft_id,
                        name,
                        errors,
                    });
                }
            }
        }

        for assessment_id in &to_mark {
            if let Err(e) = self.assessments.mark_initiatives_generated(assessment_id).await {
                warn!("could not mark assessment {}: {}", assessment_id, e);
            }
        }

        if let Some(assessment_id) = batch_assessment {
            self.prune_stored_drafts(assessment_id, &transferred_ids).await;
        }

        info!(
            "transfer to project {}: {} transferred, {} failed of {}",
            project_id,
            report.transferred.len(),
            report.failed.len(),
            report.total
        );
        if let Some(log) = self.audit.as_deref() {
            let entry = AuditEntry::new(
                "transfer",
                serde_json::to_value(&request).unwrap_or_default(),
                serde_json::to_value(&report).unwrap_or_default(),
            );
            record_best_effort(Some(log), entry).await;
        }
        Ok(report)
    }

    /// Validate, approve, insert, link. Returns the new initiative id and the
    /// assessment it came from.
    async fn transfer_one(
        &self,
        mut draft: InitiativeDraft,
        project_id: &str,
        batch_assessment: Option<&str>,
    ) -> std::result::Result<(String, Option<String>), Vec<String>> {
        if draft.status != DraftStatus::Draft {
            return Err(vec![format!(
                "draft is {:?}, only DRAFT can be approved",
                draft.status
            )]);
        }
        let result = self.validator.validate(&draft);
        if !result.valid {
            return Err(result.errors);
        }
        approve(&mut draft).map_err(|e| vec![e.to_string()])?;

        let assessment_id = draft
            .source_assessment_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| batch_assessment.map(str::to_string));
        let mut initiative = Initiative::from_draft(&draft, project_id);
        initiative.source_assessment_id = assessment_id.clone();

        let initiative_id = self
            .initiatives
            .insert(&initiative)
            .await
            .map_err(|e| vec![e.to_string()])?;
        if let Some(a) = assessment_id.as_deref() {
            self.initiatives
                .link_to_assessment(&initiative_id, a)
                .await
                .map_err(|e| vec![e.to_string()])?;
        }
        Ok((initiative_id, assessment_id))
    }

    async fn prune_stored_drafts(&self, assessment_id: &str, transferred: &HashSet<String>) {
        let stored = match self.drafts.get_draft(assessment_id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("could not load stored drafts for {}: {}", assessment_id, e);
                return;
            }
        };
        let remaining: Vec<InitiativeDraft> = stored
            .into_iter()
            .filter(|d| !transferred.contains(&d.id))
            .collect();
        if let Err(e) = self.drafts.upsert_draft(assessment_id, &remaining).await {
            warn!("could not rewrite stored drafts for {}: {}", assessment_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssessmentSource, Gap};
    use crate::synthesis::InitiativeSynthesizer;

    fn draft() -> InitiativeDraft {
        let gap = Gap {
            source: AssessmentSource::Drd,
            source_id: "drd-1".into(),
            dimension: "culture".into(),
            as_is: 2.0,
            to_be: 5.0,
            gap_size: 3.0,
            priority_score: 36,
        };
        InitiativeSynthesizer::default().draft_for_gap(&gap, None, Some("drd-1"))
    }

    #[test]
    fn approve_only_from_draft() {
        let mut d = draft();
        approve(&mut d).unwrap();
        assert_eq!(d.status, DraftStatus::Approved);
        assert!(approve(&mut d).is_err());
    }
}
