//! Assessment gathering: fetches the primary DRD record and any Lean / external
//! framework records, and normalizes them into source-tagged [`Assessment`]s.

use crate::error::{ForgeError, Result};
use crate::gaps::themes::normalize_dimension;
use crate::model::{Assessment, AssessmentSource, DimensionScore, WorkflowStatus};
use crate::store::AssessmentStore;
use crate::utils::round1;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// External scores are mapped onto the DRD 7-point scale and measured against its top
pub const EXTERNAL_SCALE_TARGET: f64 = 7.0;

/// Framework name under which the Lean source is registered
pub const LEAN_FRAMEWORK: &str = "lean";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanAxis {
    pub axis: String,
    pub score: f64,
    pub industry_benchmark: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanAssessment {
    pub id: String,
    pub axes: Vec<LeanAxis>,
    /// Axes the Lean framework itself flags as the biggest gaps
    #[serde(default)]
    pub top_gaps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAxis {
    pub axis: String,
    pub score: f64,
    pub scale_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalAssessment {
    pub id: String,
    pub framework: String,
    pub axes: Vec<ExternalAxis>,
}

/// Framework-specific record as returned by a [`FrameworkSource`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameworkRecord {
    Lean(LeanAssessment),
    External(ExternalAssessment),
}

/// Secondary assessment framework (Lean or any external one)
#[async_trait]
pub trait FrameworkSource: Send + Sync {
    fn framework(&self) -> &str;

    /// Errors when the assessment does not exist for the organization
    async fn get_assessment(&self, id: &str, organization_id: &str) -> Result<FrameworkRecord>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRef {
    pub framework: String,
    pub assessment_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherRequest {
    pub organization_id: String,
    pub drd_assessment_id: String,
    #[serde(default)]
    pub lean_assessment_id: Option<String>,
    #[serde(default)]
    pub external: Vec<ExternalRef>,
}

pub struct AssessmentGatherer {
    assessments: Arc<dyn AssessmentStore>,
    sources: HashMap<String, Arc<dyn FrameworkSource>>,
}

impl AssessmentGatherer {
    pub fn new(assessments: Arc<dyn AssessmentStore>) -> Self {
        Self {
            assessments,
            sources: HashMap::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn FrameworkSource>) -> Self {
        self.sources
            .insert(source.framework().to_lowercase(), source);
        self
    }

    /// DRD first, then Lean, then external records in request order.
    /// Secondary sources that fail are skipped.
    pub async fn gather(&self, req: &GatherRequest) -> Result<Vec<Assessment>> {
        if req.organization_id.trim().is_empty() {
            return Err(ForgeError::invalid("organization_id is required"));
        }
        if req.drd_assessment_id.trim().is_empty() {
            return Err(ForgeError::invalid("drd_assessment_id is required"));
        }

        let drd = self
            .assessments
            .get_assessment(&req.drd_assessment_id)
            .await?
            .ok_or_else(|| ForgeError::not_found("assessment", &req.drd_assessment_id))?;
        if drd.source != AssessmentSource::Drd {
            return Err(ForgeError::invalid(format!(
                "assessment '{}' is a {} assessment, expected DRD",
                drd.id, drd.source
            )));
        }

        let mut plan: Vec<(String, String)> = Vec::new();
        if let Some(lean_id) = req.lean_assessment_id.as_ref().filter(|s| !s.is_empty()) {
            plan.push((LEAN_FRAMEWORK.to_string(), lean_id.clone()));
        }
        for ext in &req.external {
            plan.push((ext.framework.to_lowercase(), ext.assessment_id.clone()));
        }

        let fetches = plan
            .iter()
            .map(|(framework, id)| self.fetch_secondary(framework, id, &req.organization_id));
        let secondary: Vec<Assessment> = join_all(fetches).await.into_iter().flatten().collect();

        let mut out = Vec::with_capacity(1 + secondary.len());
        out.push(drd);
        out.extend(secondary);
        info!(
            "gathered {} assessments for organization {} ({} secondary requested)",
            out.len(),
            req.organization_id,
            plan.len()
        );
        Ok(out)
    }

    async fn fetch_secondary(
        &self,
        framework: &str,
        id: &str,
        organization_id: &str,
    ) -> Option<Assessment> {
        let Some(source) = self.sources.get(framework) else {
            warn!("no source registered for framework '{}', skipping {}", framework, id);
            return None;
        };
        match source.get_assessment(id, organization_id).await {
            Ok(record) => normalize(record, organization_id),
            Err(e) => {
                warn!("{} assessment {} unavailable, skipping: {}", framework, id, e);
                None
            }
        }
    }
}

/// Framework record → common Assessment shape
pub fn normalize(record: FrameworkRecord, organization_id: &str) -> Option<Assessment> {
    match record {
        FrameworkRecord::Lean(lean) => Some(normalize_lean(lean, organization_id)),
        FrameworkRecord::External(ext) => normalize_external(ext, organization_id),
    }
}

fn normalize_lean(lean: LeanAssessment, organization_id: &str) -> Assessment {
    let flagged: Vec<String> = lean.top_gaps.iter().map(|a| normalize_dimension(a)).collect();
    let dimensions = lean
        .axes
        .into_iter()
        .map(|a| {
            let top_gap = flagged.contains(&normalize_dimension(&a.axis));
            DimensionScore {
                dimension: a.axis,
                as_is: a.score,
                to_be: a.industry_benchmark,
                top_gap,
            }
        })
        .collect();
    Assessment {
        id: lean.id.clone(),
        source: AssessmentSource::Lean,
        source_id: lean.id,
        organization_id: Some(organization_id.to_string()),
        dimensions,
        workflow_status: WorkflowStatus::Completed,
        project_id: None,
        initiatives_generated: false,
    }
}

fn normalize_external(ext: ExternalAssessment, organization_id: &str) -> Option<Assessment> {
    let mut dimensions = Vec::with_capacity(ext.axes.len());
    for axis in ext.axes {
        if axis.scale_max <= 0.0 || !axis.scale_max.is_finite() {
            warn!(
                "{} assessment {} axis '{}' has invalid scale {}, skipping record",
                ext.framework, ext.id, axis.axis, axis.scale_max
            );
            return None;
        }
        let score = axis.score.clamp(0.0, axis.scale_max);
        dimensions.push(DimensionScore {
            dimension: axis.axis,
            as_is: round1(score * EXTERNAL_SCALE_TARGET / axis.scale_max),
            to_be: EXTERNAL_SCALE_TARGET,
            top_gap: false,
        });
    }
    debug!("normalized {} external axes from {}", dimensions.len(), ext.framework);
    Some(Assessment {
        id: ext.id.clone(),
        source: AssessmentSource::external(&ext.framework),
        source_id: ext.id,
        organization_id: Some(organization_id.to_string()),
        dimensions,
        workflow_status: WorkflowStatus::Completed,
        project_id: None,
        initiatives_generated: false,
    })
}
