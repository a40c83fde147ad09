//! Charter composition: eight independently resolved sections assembled into
//! one document.

pub mod assembly;
pub mod prompts;
pub mod resolve;
pub mod sections;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLog, record_best_effort};
use crate::clients::TextGenerator;
use crate::config::Config;
use crate::constraints::apply_constraints;
use crate::error::{ForgeError, Result};
use crate::gaps::{ConsolidationMode, GapConsolidator, SourceWeights, sort_by_gap_size};
use crate::model::{
    DraftStatus, FinancialSplit, Gap, InitiativeDraft, PriorityTier, RiskLevel, SynthesisMode,
    Traceability, ValueTier,
};
use crate::store::TemplateStore;
use crate::synthesis::{InitiativeSynthesizer, objective};
use resolve::{SectionContext, resolve};
use sections::{BRIEF_ONLY_BUDGET, BRIEF_ONLY_ROI};

pub use types::{
    Charter, CharterRequest, CharterRisk, CharterTask, CharterTemplate, ConfidenceTier,
    FinancialEstimate, Identity, KillCriteria, Milestone, OrganizationContext, ProblemStatement,
    RiskRegister, SectionOrigin, SectionTag, SourceType, TargetState, TaskBreakdown, TeamPlan,
    TeamRole,
};

pub struct CharterComposer {
    templates: Arc<dyn TemplateStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    audit: Option<Arc<dyn AuditLog>>,
    consolidator: GapConsolidator,
    synthesizer: InitiativeSynthesizer,
    budget_rate: f64,
    capex_share: f64,
    section_timeout: Duration,
}

impl CharterComposer {
    pub fn new(config: &Config, templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            templates,
            generator: None,
            audit: None,
            consolidator: GapConsolidator::new(
                SourceWeights::from_config(&config.pipeline),
                ConsolidationMode::Wizard,
            ),
            synthesizer: InitiativeSynthesizer::from_config(&config.pipeline),
            budget_rate: config.pipeline.budget_per_gap_point,
            capex_share: config.pipeline.capex_share,
            section_timeout: Duration::from_millis(config.generation.section_timeout_ms),
        }
    }

    pub fn with_generator(mut self, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_section_timeout(mut self, timeout: Duration) -> Self {
        self.section_timeout = timeout;
        self
    }

    /// Build a charter. Only malformed requests fail; every collaborator failure
    /// degrades to a default section.
    pub async fn compose(&self, request: &CharterRequest) -> Result<Charter> {
        let started = Instant::now();
        validate_request(request)?;

        let mut gaps = self.consolidator.from_inputs(&request.gaps);
        sort_by_gap_size(&mut gaps);
        if request.source_type == SourceType::Gap && gaps.is_empty() {
            return Err(ForgeError::invalid(
                "GAP charters need at least one positive gap",
            ));
        }

        let template = self.load_template(request.template_id.as_deref()).await;
        let total_months = assembly::total_months(
            request.timeline_months,
            request.constraints.max_timeline.as_deref(),
            gaps.first(),
        );
        let baseline = self.baseline_draft(request, &gaps, template.as_ref(), total_months);
        let ctx = SectionContext::from_request(
            request,
            gaps,
            total_months,
            self.budget_rate,
            self.capex_share,
            baseline,
        );
        info!(
            "composing {:?} charter '{}' from {} gap(s), {} months",
            request.source_type,
            ctx.baseline.name,
            ctx.gaps.len(),
            total_months
        );

        let tpl = template.as_ref();
        let generator = self.generator.as_deref();
        let timeout = self.section_timeout;
        let (identity, problem, target_state, kill, risks, tasks, team, financials) = tokio::join!(
            resolve::<Identity>(&ctx, tpl, generator, timeout),
            resolve::<ProblemStatement>(&ctx, tpl, generator, timeout),
            resolve::<TargetState>(&ctx, tpl, generator, timeout),
            resolve::<KillCriteria>(&ctx, tpl, generator, timeout),
            resolve::<RiskRegister>(&ctx, tpl, generator, timeout),
            resolve::<TaskBreakdown>(&ctx, tpl, generator, timeout),
            resolve::<TeamPlan>(&ctx, tpl, generator, timeout),
            resolve::<FinancialEstimate>(&ctx, tpl, generator, timeout),
        );

        let section_origins: BTreeMap<SectionTag, SectionOrigin> = [
            (SectionTag::Identity, identity.origin),
            (SectionTag::Problem, problem.origin),
            (SectionTag::TargetState, target_state.origin),
            (SectionTag::KillCriteria, kill.origin),
            (SectionTag::Risks, risks.origin),
            (SectionTag::Tasks, tasks.origin),
            (SectionTag::Team, team.origin),
            (SectionTag::Financials, financials.origin),
        ]
        .into_iter()
        .collect();
        debug!("section origins: {:?}", section_origins);

        let risks = risks.value.risks;
        let mut draft = ctx.baseline.clone();
        let Identity {
            name,
            summary,
            description,
            hypothesis,
            axis,
        } = identity.value;
        draft.name = name;
        draft.summary = summary;
        draft.description = description;
        draft.hypothesis = hypothesis;
        draft.axis = axis;
        draft.risk_level = assembly::risk_rollup(&risks);

        let f = financials.value;
        draft.estimated_budget = f.estimated_budget;
        draft.financial_split = if f.capex.checked_add(f.opex) == Some(f.estimated_budget) {
            FinancialSplit {
                capex: f.capex,
                opex: f.opex,
            }
        } else {
            FinancialSplit::from_budget(f.estimated_budget, self.capex_share)
        };
        draft.estimated_roi = f.estimated_roi;
        apply_constraints(std::slice::from_mut(&mut draft), &request.constraints);
        // An explicit duration outranks the verbatim timeline constraint so the
        // draft and the milestones agree
        if request.timeline_months.is_some_and(|m| m > 0) {
            draft.timeline = format!("{} months", total_months);
        }
        let financials = FinancialEstimate {
            estimated_budget: draft.estimated_budget,
            capex: draft.financial_split.capex,
            opex: draft.financial_split.opex,
            estimated_roi: draft.estimated_roi,
        };

        let start = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let charter = Charter {
            source_type: request.source_type,
            organization: request.organization.clone(),
            problem: problem.value,
            target_state: target_state.value,
            kill_criteria: kill.value.criteria,
            risks,
            tasks: tasks.value.tasks,
            team: team.value.roles,
            financials,
            milestones: assembly::milestones(total_months, start),
            priority_tier: assembly::priority_tier(&ctx.gaps),
            generation_confidence: assembly::confidence(template.is_some(), ctx.gaps.len()),
            section_origins,
            template_id: template.as_ref().map(|t| t.id.clone()),
            draft,
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "charter '{}' composed in {}ms (confidence {:?})",
            charter.draft.name, duration_ms, charter.generation_confidence
        );
        self.audit_charter(request, &charter, duration_ms).await;
        Ok(charter)
    }

    async fn load_template(&self, template_id: Option<&str>) -> Option<CharterTemplate> {
        let id = template_id.map(str::trim).filter(|id| !id.is_empty())?;
        match self.templates.get_template(id).await {
            Ok(Some(template)) => Some(template),
            Ok(None) => {
                warn!("charter template '{}' not found; continuing without it", id);
                None
            }
            Err(e) => {
                warn!("charter template '{}' lookup failed: {}", id, e);
                None
            }
        }
    }

    /// Deterministic draft the sections start from: the largest gap's draft
    /// widened to every gap, or a brief-only draft
    fn baseline_draft(
        &self,
        request: &CharterRequest,
        gaps: &[Gap],
        template: Option<&CharterTemplate>,
        total_months: u32,
    ) -> InitiativeDraft {
        let said = request.source_assessment_id.as_deref();
        if let Some(largest) = gaps.first() {
            let mut draft =
                self.synthesizer
                    .draft_for_gap(largest, request.constraints.team_size, said);
            draft.objectives = gaps.iter().map(objective).collect();
            draft.traceability = Traceability::new(SynthesisMode::Charter, gaps);
            if request.timeline_months.is_some_and(|m| m > 0) {
                draft.timeline = format!("{} months", total_months);
            }
            if let Some(brief) = request.brief.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
                draft.summary = format!("{} {}", draft.summary, brief);
            }
            return draft;
        }

        let brief = request.brief.as_deref().unwrap_or_default().trim();
        let org = match request.organization.name.trim() {
            "" => "The organization",
            name => name,
        };
        let name = template
            .map(|t| t.name.trim())
            .filter(|n| n.chars().count() >= 5)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Transformation Initiative", org));
        let split = FinancialSplit::from_budget(BRIEF_ONLY_BUDGET, self.capex_share);
        InitiativeDraft {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            summary: first_sentence(brief),
            description: format!("{} requested this initiative: {}", org, brief),
            hypothesis: format!(
                "If the initiative delivers its stated objective, {} will see measurable \
                 operational improvement within {} months.",
                org, total_months
            ),
            axis: "Cross-functional".to_string(),
            priority: PriorityTier::Medium,
            business_value: ValueTier::Medium,
            objectives: vec![first_sentence(brief)],
            estimated_budget: BRIEF_ONLY_BUDGET,
            estimated_roi: BRIEF_ONLY_ROI,
            financial_split: split,
            timeline: format!("{} months", total_months),
            risk_level: RiskLevel::Medium,
            status: DraftStatus::Draft,
            source_assessment_id: said.map(str::to_string),
            traceability: Traceability::new(SynthesisMode::Charter, &[]),
        }
    }

    async fn audit_charter(&self, request: &CharterRequest, charter: &Charter, duration_ms: u64) {
        let Some(log) = self.audit.as_deref() else {
            return;
        };
        let inputs = serde_json::to_value(request).unwrap_or_default();
        let output = serde_json::to_value(charter).unwrap_or_default();
        let source_type = serde_json::to_value(request.source_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let confidence = serde_json::to_value(charter.generation_confidence)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let entry = AuditEntry::new("charter", inputs, output)
            .with_source_type(source_type)
            .with_confidence(confidence)
            .with_duration_ms(duration_ms);
        record_best_effort(Some(log), entry).await;
    }
}

fn validate_request(request: &CharterRequest) -> Result<()> {
    let has_brief = request
        .brief
        .as_deref()
        .is_some_and(|b| !b.trim().is_empty());
    match request.source_type {
        SourceType::Gap if request.gaps.is_empty() => {
            Err(ForgeError::invalid("GAP charters need at least one gap"))
        }
        SourceType::Manual | SourceType::Report if request.gaps.is_empty() && !has_brief => {
            Err(ForgeError::invalid(
                "MANUAL and REPORT charters need gaps or a brief",
            ))
        }
        _ => Ok(()),
    }
}

fn first_sentence(text: &str) -> String {
    let sentence = match text.find(['.', '!', '?']) {
        Some(end) => &text[..=end],
        None => text,
    };
    let trimmed: String = sentence.trim().chars().take(200).collect();
    if trimmed.is_empty() {
        "Improvement initiative".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source_type: SourceType) -> CharterRequest {
        CharterRequest {
            source_type,
            template_id: None,
            gaps: vec![],
            organization: OrganizationContext {
                name: "Acme".into(),
                ..Default::default()
            },
            constraints: Default::default(),
            brief: None,
            timeline_months: None,
            start_date: None,
            source_assessment_id: None,
        }
    }

    #[test]
    fn request_input_errors() {
        assert!(validate_request(&request(SourceType::Gap)).is_err());
        assert!(validate_request(&request(SourceType::Manual)).is_err());
        let mut r = request(SourceType::Report);
        r.brief = Some("   ".into());
        assert!(validate_request(&r).is_err());
        r.brief = Some("Automate invoice handling.".into());
        assert!(validate_request(&r).is_ok());
    }

    #[test]
    fn first_sentence_is_bounded() {
        assert_eq!(first_sentence("Do X. Then Y."), "Do X.");
        assert_eq!(first_sentence(""), "Improvement initiative");
        assert_eq!(first_sentence(&"a".repeat(300)).len(), 200);
    }
}
