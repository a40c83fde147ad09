//! Wires the stages together: gather → consolidate → synthesize → constrain,
//! plus charter composition, validation and transfer.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assessment::{AssessmentGatherer, FrameworkSource, GatherRequest, LEAN_FRAMEWORK};
use crate::audit::AuditLog;
use crate::charter::resolve::{SectionContext, resolve};
use crate::charter::sections::DraftSummary;
use crate::charter::{Charter, CharterComposer, CharterRequest, OrganizationContext, SectionOrigin, SourceType};
use crate::clients::TextGenerator;
use crate::config::Config;
use crate::constraints::apply_constraints;
use crate::error::{ForgeError, Result};
use crate::gaps::{ConsolidationMode, GapConsolidator, SourceWeights, cluster, sort_by_gap_size};
use crate::model::{Assessment, Constraint, Gap, InitiativeDraft, SynthesisMode, ValidationResult};
use crate::store::{
    AssessmentStore, DraftStore, InitiativeStore, MemoryStore, SurrealStore, TemplateStore,
};
use crate::synthesis::{InitiativeSynthesizer, timeline_months};
use crate::transfer::{TransferReport, TransferRequest, TransferService};
use crate::validation::Validator;

/// Collaborators the pipeline reads from and writes to
#[derive(Clone)]
pub struct PipelineStores {
    pub assessments: Arc<dyn AssessmentStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub initiatives: Arc<dyn InitiativeStore>,
    pub drafts: Arc<dyn DraftStore>,
    pub audit: Option<Arc<dyn AuditLog>>,
    pub frameworks: Vec<Arc<dyn FrameworkSource>>,
}

impl PipelineStores {
    /// Every role backed by one memory store; Lean is always registered
    pub async fn from_memory(store: Arc<MemoryStore>) -> Self {
        let mut names = store.frameworks().await;
        if !names.iter().any(|n| n == LEAN_FRAMEWORK) {
            names.push(LEAN_FRAMEWORK.to_string());
        }
        let frameworks = names.iter().map(|n| store.framework_source(n)).collect();
        Self {
            assessments: store.clone(),
            templates: store.clone(),
            initiatives: store.clone(),
            drafts: store.clone(),
            audit: Some(store as Arc<dyn AuditLog>),
            frameworks,
        }
    }

    /// SurrealDB backing; framework sources are registered for the named
    /// frameworks plus Lean
    pub fn from_surreal(store: SurrealStore, frameworks: &[String]) -> Self {
        let mut names: Vec<String> = vec![LEAN_FRAMEWORK.to_string()];
        for f in frameworks {
            let f = f.to_lowercase();
            if !names.contains(&f) {
                names.push(f);
            }
        }
        let frameworks = names.iter().map(|n| store.framework_source(n)).collect();
        let store = Arc::new(store);
        Self {
            assessments: store.clone(),
            templates: store.clone(),
            initiatives: store.clone(),
            drafts: store.clone(),
            audit: Some(store as Arc<dyn AuditLog>),
            frameworks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    #[serde(flatten)]
    pub gather: GatherRequest,
    /// `theme` (legacy) or `gap` (wizard)
    pub mode: SynthesisMode,
    #[serde(default)]
    pub constraints: Constraint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftBatch {
    pub assessment_id: String,
    pub mode: SynthesisMode,
    pub gaps: Vec<Gap>,
    pub drafts: Vec<InitiativeDraft>,
}

pub struct InitiativePipeline {
    config: Config,
    stores: PipelineStores,
    generator: Option<Arc<dyn TextGenerator>>,
    synthesizer: InitiativeSynthesizer,
    validator: Validator,
}

impl InitiativePipeline {
    pub fn new(
        config: Config,
        stores: PipelineStores,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            synthesizer: InitiativeSynthesizer::from_config(&config.pipeline),
            validator: Validator::from_config(&config.pipeline),
            config,
            stores,
            generator,
        }
    }

    pub async fn gather(&self, request: &GatherRequest) -> Result<Vec<Assessment>> {
        let gatherer = self
            .stores
            .frameworks
            .iter()
            .cloned()
            .fold(AssessmentGatherer::new(self.stores.assessments.clone()), |g, s| {
                g.with_source(s)
            });
        gatherer.gather(request).await
    }

    /// Legacy gaps come back by descending priority, wizard gaps by descending size
    pub fn consolidate(&self, assessments: &[Assessment], mode: SynthesisMode) -> Vec<Gap> {
        let consolidation = match mode {
            SynthesisMode::Theme => ConsolidationMode::Legacy {
                min_gap: self.config.pipeline.legacy_min_gap,
            },
            SynthesisMode::Gap | SynthesisMode::Charter => ConsolidationMode::Wizard,
        };
        let mut gaps =
            GapConsolidator::new(SourceWeights::from_config(&self.config.pipeline), consolidation)
                .consolidate(assessments);
        if consolidation == ConsolidationMode::Wizard {
            sort_by_gap_size(&mut gaps);
        }
        gaps
    }

    /// Gather, consolidate, synthesize, constrain and store the drafts under the
    /// DRD assessment id
    pub async fn generate_drafts(&self, request: &DraftRequest) -> Result<DraftBatch> {
        if request.mode == SynthesisMode::Charter {
            return Err(ForgeError::invalid(
                "charter mode is served by compose_charter, use theme or gap",
            ));
        }
        let assessments = self.gather(&request.gather).await?;
        let gaps = self.consolidate(&assessments, request.mode);
        let assessment_id = request.gather.drd_assessment_id.clone();

        let mut drafts = match request.mode {
            SynthesisMode::Theme => {
                let clusters = cluster(&gaps);
                self.synthesizer
                    .synthesize_themes(&clusters, Some(&assessment_id))
            }
            _ => self.synthesizer.synthesize_gaps(
                &gaps,
                request.constraints.team_size,
                Some(&assessment_id),
            ),
        };
        apply_constraints(&mut drafts, &request.constraints);

        if request.mode == SynthesisMode::Gap && self.config.generation.enrich_gap_drafts {
            self.enrich_summaries(&mut drafts, &request.gather.organization_id, &request.constraints)
                .await;
        }

        self.stores.drafts.upsert_draft(&assessment_id, &drafts).await?;
        info!(
            "{} drafts generated for assessment {} from {} gaps ({:?} mode)",
            drafts.len(),
            assessment_id,
            gaps.len(),
            request.mode
        );
        Ok(DraftBatch {
            assessment_id,
            mode: request.mode,
            gaps,
            drafts,
        })
    }

    /// Sequentially ask the generator for better summaries; keeps the
    /// deterministic summary on any failure
    async fn enrich_summaries(
        &self,
        drafts: &mut [InitiativeDraft],
        organization_id: &str,
        constraints: &Constraint,
    ) {
        let Some(generator) = self.generator.as_deref() else {
            debug!("no generator configured; skipping summary enrichment");
            return;
        };
        let timeout = Duration::from_millis(self.config.generation.section_timeout_ms);
        for draft in drafts.iter_mut() {
            let gaps = draft.traceability.source_gaps.clone();
            let total_months = gaps
                .first()
                .map(|g| timeline_months(g.gap_size).1)
                .unwrap_or(crate::charter::assembly::DEFAULT_TOTAL_MONTHS);
            let ctx = SectionContext {
                source_type: SourceType::Gap,
                organization: OrganizationContext {
                    name: organization_id.to_string(),
                    ..Default::default()
                },
                brief: None,
                constraints: constraints.clone(),
                gaps,
                total_months,
                budget_rate: self.config.pipeline.budget_per_gap_point,
                capex_share: self.config.pipeline.capex_share,
                baseline: draft.clone(),
            };
            let resolved = resolve::<DraftSummary>(&ctx, None, Some(generator), timeout).await;
            if resolved.origin == SectionOrigin::Generated {
                draft.summary = resolved.value.summary;
            } else {
                warn!("summary for draft '{}' kept deterministic", draft.name);
            }
        }
    }

    pub async fn stored_drafts(&self, assessment_id: &str) -> Result<Vec<InitiativeDraft>> {
        self.stores.drafts.get_draft(assessment_id).await
    }

    pub async fn compose_charter(&self, request: &CharterRequest) -> Result<Charter> {
        let mut composer = CharterComposer::new(&self.config, self.stores.templates.clone())
            .with_generator(self.generator.clone());
        if let Some(audit) = &self.stores.audit {
            composer = composer.with_audit(audit.clone());
        }
        composer.compose(request).await
    }

    pub fn validate(&self, draft: &InitiativeDraft) -> ValidationResult {
        self.validator.validate(draft)
    }

    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReport> {
        let mut service = TransferService::new(
            self.validator.clone(),
            self.stores.initiatives.clone(),
            self.stores.assessments.clone(),
            self.stores.drafts.clone(),
        );
        if let Some(audit) = &self.stores.audit {
            service = service.with_audit(audit.clone());
        }
        service.transfer(request).await
    }
}
