//! Charter document and request types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Constraint, GapInput, InitiativeDraft, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Gap,
    Report,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// Generation targets. The first eight are the charter sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Identity,
    Problem,
    TargetState,
    KillCriteria,
    Risks,
    Tasks,
    Team,
    Financials,
    /// Per-gap draft summary enrichment
    Summary,
}

impl SectionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionTag::Identity => "identity",
            SectionTag::Problem => "problem",
            SectionTag::TargetState => "target_state",
            SectionTag::KillCriteria => "kill_criteria",
            SectionTag::Risks => "risks",
            SectionTag::Tasks => "tasks",
            SectionTag::Team => "team",
            SectionTag::Financials => "financials",
            SectionTag::Summary => "summary",
        }
    }
}

/// Where a section's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionOrigin {
    Template,
    Generated,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub hypothesis: String,
    pub axis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemStatement {
    pub symptom: String,
    pub root_cause: String,
    pub cost_of_inaction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub process: Vec<String>,
    pub behavior: Vec<String>,
    pub capability: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillCriteria {
    pub criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharterRisk {
    pub risk: String,
    pub mitigation: String,
    pub severity: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRegister {
    pub risks: Vec<CharterRisk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharterTask {
    pub title: String,
    pub description: String,
    pub phase: String,
    pub duration_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub tasks: Vec<CharterTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRole {
    pub role: String,
    pub allocation_fte: f64,
    pub responsibilities: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPlan {
    pub roles: Vec<TeamRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEstimate {
    pub estimated_budget: u64,
    pub capex: u64,
    pub opex: u64,
    pub estimated_roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    /// Months after start
    pub month: u32,
    pub due_date: NaiveDate,
}

/// Previously stored charter fragments; any present fragment wins over generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharterTemplate {
    pub id: String,
    pub name: String,
    pub problem: Option<ProblemStatement>,
    pub target_state: Option<TargetState>,
    pub kill_criteria: Option<Vec<String>>,
    pub tasks: Option<Vec<CharterTask>>,
    pub risks: Option<Vec<CharterRisk>>,
    pub team: Option<Vec<TeamRole>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationContext {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharterRequest {
    pub source_type: SourceType,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub gaps: Vec<GapInput>,
    pub organization: OrganizationContext,
    #[serde(default)]
    pub constraints: Constraint,
    /// Free-text brief for MANUAL and REPORT charters
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default)]
    pub timeline_months: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub source_assessment_id: Option<String>,
}

/// Fully elaborated initiative document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charter {
    #[serde(flatten)]
    pub draft: InitiativeDraft,
    pub source_type: SourceType,
    pub organization: OrganizationContext,
    pub problem: ProblemStatement,
    pub target_state: TargetState,
    pub kill_criteria: Vec<String>,
    pub risks: Vec<CharterRisk>,
    pub tasks: Vec<CharterTask>,
    pub team: Vec<TeamRole>,
    pub financials: FinancialEstimate,
    pub milestones: Vec<Milestone>,
    /// 1 (most urgent) to 3
    pub priority_tier: u8,
    pub generation_confidence: ConfidenceTier,
    pub section_origins: BTreeMap<SectionTag, SectionOrigin>,
    pub template_id: Option<String>,
}
