//! Core data model shared by every pipeline stage.
//!
//! Assessments are owned by persistence and never mutated here. Gaps are rebuilt
//! on every run. Drafts are the only mutable records, and only the constraint
//! adjuster and the transfer state machine touch them after synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Framework an assessment came from. Serialized as `DRD`, `LEAN` or `EXTERNAL_<NAME>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssessmentSource {
    Drd,
    Lean,
    External(String),
}

impl AssessmentSource {
    pub fn external(framework: &str) -> Self {
        AssessmentSource::External(framework.trim().to_uppercase())
    }
}

impl fmt::Display for AssessmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentSource::Drd => write!(f, "DRD"),
            AssessmentSource::Lean => write!(f, "LEAN"),
            AssessmentSource::External(fw) => write!(f, "EXTERNAL_{}", fw),
        }
    }
}

impl From<AssessmentSource> for String {
    fn from(source: AssessmentSource) -> Self {
        source.to_string()
    }
}

impl TryFrom<String> for AssessmentSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let upper = value.trim().to_uppercase();
        match upper.as_str() {
            "DRD" => Ok(AssessmentSource::Drd),
            "LEAN" => Ok(AssessmentSource::Lean),
            _ => match upper.strip_prefix("EXTERNAL_") {
                Some(fw) if !fw.is_empty() => Ok(AssessmentSource::External(fw.to_string())),
                _ => Err(format!("unknown assessment source '{}'", value)),
            },
        }
    }
}

/// One scored dimension of an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub as_is: f64,
    pub to_be: f64,
    /// Set by the Lean normalizer for axes the framework flags as top gaps
    #[serde(default)]
    pub top_gap: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Draft,
    #[default]
    InProgress,
    Completed,
    InitiativesGenerated,
}

/// Source-tagged maturity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub source: AssessmentSource,
    pub source_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    pub dimensions: Vec<DimensionScore>,
    #[serde(default)]
    pub workflow_status: WorkflowStatus,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub initiatives_generated: bool,
}

/// Coarse four-level label used by the per-gap flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Shortfall between current and target maturity on one dimension from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub source: AssessmentSource,
    pub source_id: String,
    pub dimension: String,
    pub as_is: f64,
    pub to_be: f64,
    pub gap_size: f64,
    pub priority_score: u8,
}

impl Gap {
    pub fn severity(&self) -> GapSeverity {
        crate::gaps::priority::classify(self.gap_size)
    }
}

fn default_source() -> AssessmentSource {
    AssessmentSource::Drd
}

/// Raw gap supplied directly by a caller (wizard entry point)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapInput {
    pub dimension: String,
    pub as_is: f64,
    pub to_be: f64,
    #[serde(default = "default_source")]
    pub source: AssessmentSource,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Fixed investment taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    DataManagement,
    ProcessDigitalization,
    OperationalExcellence,
    DigitalProducts,
    OrganizationalCulture,
    Cybersecurity,
    TechnologyInfrastructure,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::DataManagement,
        Theme::ProcessDigitalization,
        Theme::OperationalExcellence,
        Theme::DigitalProducts,
        Theme::OrganizationalCulture,
        Theme::Cybersecurity,
        Theme::TechnologyInfrastructure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Theme::DataManagement => "Data Management",
            Theme::ProcessDigitalization => "Process Digitalization",
            Theme::OperationalExcellence => "Operational Excellence",
            Theme::DigitalProducts => "Digital Products",
            Theme::OrganizationalCulture => "Organizational Culture",
            Theme::Cybersecurity => "Cybersecurity",
            Theme::TechnologyInfrastructure => "Technology Infrastructure",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A theme with the gaps mapped to it, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeCluster {
    pub theme: Theme,
    pub gaps: Vec<Gap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    #[default]
    Draft,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// One initiative per theme (legacy flow)
    Theme,
    /// One initiative per gap (wizard flow)
    Gap,
    /// Fully elaborated charter
    Charter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSplit {
    pub capex: u64,
    pub opex: u64,
}

impl FinancialSplit {
    pub fn from_budget(budget: u64, capex_share: f64) -> Self {
        let capex = crate::utils::to_units(budget as f64 * capex_share.clamp(0.0, 1.0)).min(budget);
        Self {
            capex,
            opex: budget - capex,
        }
    }

    /// Split a new total with the same capex ratio as the current one
    pub fn rebalanced(&self, budget: u64) -> Self {
        let total = u128::from(self.capex) + u128::from(self.opex);
        let share = if total == 0 {
            crate::config::DEFAULT_CAPEX_SHARE
        } else {
            self.capex as f64 / total as f64
        };
        Self::from_budget(budget, share)
    }
}

/// Links a draft back to every gap that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traceability {
    pub mode: SynthesisMode,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<AssessmentSource>,
    pub source_gaps: Vec<Gap>,
}

impl Traceability {
    pub fn new(mode: SynthesisMode, gaps: &[Gap]) -> Self {
        let mut sources: Vec<AssessmentSource> = Vec::new();
        for g in gaps {
            if !sources.contains(&g.source) {
                sources.push(g.source.clone());
            }
        }
        Self {
            mode,
            generated_at: Utc::now(),
            sources,
            source_gaps: gaps.to_vec(),
        }
    }
}

/// Output of the synthesizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeDraft {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub hypothesis: String,
    pub axis: String,
    pub priority: PriorityTier,
    pub business_value: ValueTier,
    #[serde(default)]
    pub objectives: Vec<String>,
    pub estimated_budget: u64,
    pub estimated_roi: f64,
    #[serde(default)]
    pub financial_split: FinancialSplit,
    pub timeline: String,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub status: DraftStatus,
    #[serde(default)]
    pub source_assessment_id: Option<String>,
    pub traceability: Traceability,
}

impl InitiativeDraft {
    /// Replace the budget, keeping the capex/opex ratio
    pub fn set_budget(&mut self, budget: u64) {
        self.financial_split = self.financial_split.rebalanced(budget);
        self.estimated_budget = budget;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAppetite {
    Conservative,
    Balanced,
    Aggressive,
}

/// Caller-supplied limits; never persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraint {
    pub max_budget: Option<u64>,
    pub max_timeline: Option<String>,
    pub team_size: Option<u32>,
    pub risk_appetite: Option<RiskAppetite>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Persisted record created when a draft is transferred
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub project_id: String,
    pub draft_id: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub hypothesis: String,
    pub axis: String,
    pub priority: PriorityTier,
    pub business_value: ValueTier,
    pub objectives: Vec<String>,
    pub estimated_budget: u64,
    pub estimated_roi: f64,
    pub financial_split: FinancialSplit,
    pub timeline: String,
    pub risk_level: RiskLevel,
    pub status: DraftStatus,
    pub source_assessment_id: Option<String>,
    pub traceability: Traceability,
    pub created_at: DateTime<Utc>,
}

impl Initiative {
    pub fn from_draft(draft: &InitiativeDraft, project_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            draft_id: draft.id.clone(),
            name: draft.name.clone(),
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            hypothesis: draft.hypothesis.clone(),
            axis: draft.axis.clone(),
            priority: draft.priority,
            business_value: draft.business_value,
            objectives: draft.objectives.clone(),
            estimated_budget: draft.estimated_budget,
            estimated_roi: draft.estimated_roi,
            financial_split: draft.financial_split,
            timeline: draft.timeline.clone(),
            risk_level: draft.risk_level,
            status: draft.status,
            source_assessment_id: draft.source_assessment_id.clone(),
            traceability: draft.traceability.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_round_trips_through_strings() {
        let src: AssessmentSource = serde_json::from_str("\"EXTERNAL_iso\"").unwrap();
        assert_eq!(src, AssessmentSource::External("ISO".into()));
        assert_eq!(serde_json::to_string(&src).unwrap(), "\"EXTERNAL_ISO\"");
        assert!(serde_json::from_str::<AssessmentSource>("\"EXTERNAL_\"").is_err());
        assert!(serde_json::from_str::<AssessmentSource>("\"SURVEY\"").is_err());
    }

    #[test]
    fn split_rebalance_keeps_ratio() {
        let split = FinancialSplit::from_budget(100_000, 0.6);
        assert_eq!(split, FinancialSplit { capex: 60_000, opex: 40_000 });
        let scaled = split.rebalanced(50_000);
        assert_eq!(scaled, FinancialSplit { capex: 30_000, opex: 20_000 });
    }

    #[test]
    fn rebalance_tolerates_split_above_u64_max() {
        let split = FinancialSplit {
            capex: u64::MAX,
            opex: u64::MAX,
        };
        let scaled = split.rebalanced(1_000);
        assert_eq!(scaled, FinancialSplit { capex: 500, opex: 500 });
    }

    #[test]
    fn empty_split_uses_default_share() {
        let split = FinancialSplit::default().rebalanced(10_000);
        assert_eq!(split.capex + split.opex, 10_000);
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
