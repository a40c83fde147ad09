//! Section implementations and their deterministic defaults.

use serde::{Deserialize, Serialize};

use super::resolve::{CharterSection, SectionContext};
use super::types::{
    CharterRisk, CharterTask, CharterTemplate, FinancialEstimate, Identity, KillCriteria,
    ProblemStatement, RiskRegister, SectionTag, TargetState, TaskBreakdown, TeamPlan, TeamRole,
};
use crate::gaps::classify;
use crate::model::{FinancialSplit, GapSeverity, RiskLevel};
use crate::synthesis::tables::{humanize, team_multiplier};
use crate::synthesis::{estimate_roi, fmt_level, objective};
use crate::utils::to_units;

/// Budget for a charter with no gaps to size it from
pub const BRIEF_ONLY_BUDGET: u64 = 150_000;
pub const BRIEF_ONLY_ROI: f64 = 1.5;

const MIN_NAME_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 20;

fn non_blank(items: &[String]) -> bool {
    !items.is_empty() && items.iter().all(|s| !s.trim().is_empty())
}

fn gap_axes(ctx: &SectionContext) -> String {
    let axes: Vec<String> = ctx.gaps.iter().map(|g| humanize(&g.dimension)).collect();
    axes.join(", ")
}

impl CharterSection for Identity {
    const TAG: SectionTag = SectionTag::Identity;

    /// A named template renames the baseline; the other fields stay derived
    fn from_template(template: &CharterTemplate, ctx: &SectionContext) -> Option<Self> {
        let name = template.name.trim();
        if name.chars().count() < MIN_NAME_CHARS {
            return None;
        }
        Some(Identity {
            name: name.to_string(),
            ..Self::fallback(ctx)
        })
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let b = &ctx.baseline;
        Identity {
            name: b.name.clone(),
            summary: b.summary.clone(),
            description: b.description.clone(),
            hypothesis: b.hypothesis.clone(),
            axis: b.axis.clone(),
        }
    }

    fn is_acceptable(&self) -> bool {
        self.name.trim().chars().count() >= MIN_NAME_CHARS
            && self.description.trim().chars().count() >= MIN_DESCRIPTION_CHARS
            && !self.axis.trim().is_empty()
    }
}

impl CharterSection for ProblemStatement {
    const TAG: SectionTag = SectionTag::Problem;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template.problem.clone()
    }

    fn fallback(ctx: &SectionContext) -> Self {
        match ctx.largest_gap() {
            Some(largest) => {
                let symptoms: Vec<String> = ctx
                    .gaps
                    .iter()
                    .map(|g| {
                        format!(
                            "{} at level {} against a target of {}",
                            humanize(&g.dimension),
                            fmt_level(g.as_is),
                            fmt_level(g.to_be)
                        )
                    })
                    .collect();
                ProblemStatement {
                    symptom: format!("{} reports maturity gaps: {}.", ctx.organization.name, symptoms.join("; ")),
                    root_cause: format!(
                        "Capabilities in {} have not kept pace with the target operating model.",
                        gap_axes(ctx)
                    ),
                    cost_of_inaction: format!(
                        "The {} gap of {} levels keeps widening and limits every dependent initiative.",
                        humanize(&largest.dimension),
                        fmt_level(largest.gap_size)
                    ),
                }
            }
            None => ProblemStatement {
                symptom: ctx
                    .brief
                    .clone()
                    .unwrap_or_else(|| format!("{} has an unaddressed improvement need.", ctx.organization.name)),
                root_cause: "Current processes and tooling do not support the stated objective.".to_string(),
                cost_of_inaction: "Delays keep operating cost high and defer the expected benefits.".to_string(),
            },
        }
    }

    fn is_acceptable(&self) -> bool {
        !self.symptom.trim().is_empty() && !self.root_cause.trim().is_empty()
    }
}

impl CharterSection for TargetState {
    const TAG: SectionTag = SectionTag::TargetState;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template.target_state.clone()
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let capability = if ctx.gaps.is_empty() {
            ctx.baseline.objectives.clone()
        } else {
            ctx.gaps.iter().map(objective).collect()
        };
        TargetState {
            process: vec![
                "Documented, measured processes with named owners".to_string(),
                "Quarterly maturity review against the target levels".to_string(),
            ],
            behavior: vec![
                "Teams use the new capabilities in daily work".to_string(),
                "Decisions reference shared data and agreed metrics".to_string(),
            ],
            capability,
        }
    }

    fn is_acceptable(&self) -> bool {
        non_blank(&self.capability)
    }
}

impl CharterSection for KillCriteria {
    const TAG: SectionTag = SectionTag::KillCriteria;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template
            .kill_criteria
            .clone()
            .map(|criteria| KillCriteria { criteria })
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let midpoint = (ctx.total_months / 2).max(1);
        KillCriteria {
            criteria: vec![
                "Spend exceeds the approved budget by more than 20% without a re-approved case".to_string(),
                format!(
                    "No measurable maturity improvement at the month {} review",
                    midpoint
                ),
                "Pilot adoption stays below 30% of the target users after rollout".to_string(),
                "Executive sponsor withdraws or no replacement is named within one month".to_string(),
            ],
        }
    }

    fn is_acceptable(&self) -> bool {
        non_blank(&self.criteria)
    }
}

impl CharterSection for RiskRegister {
    const TAG: SectionTag = SectionTag::Risks;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template.risks.clone().map(|risks| RiskRegister { risks })
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let mut risks = vec![
            CharterRisk {
                risk: "Resistance to new ways of working".to_string(),
                mitigation: "Change management plan with early adopters in each team".to_string(),
                severity: RiskLevel::Medium,
            },
            CharterRisk {
                risk: "Scope growth beyond the approved charter".to_string(),
                mitigation: "Steering committee approves every scope change".to_string(),
                severity: RiskLevel::Medium,
            },
            CharterRisk {
                risk: "Dependencies on legacy systems and data quality".to_string(),
                mitigation: "Integration assessment during design".to_string(),
                severity: RiskLevel::Low,
            },
        ];
        if let Some(critical) = ctx
            .gaps
            .iter()
            .find(|g| classify(g.gap_size) == GapSeverity::Critical)
        {
            risks.push(CharterRisk {
                risk: format!(
                    "{} gap of {} levels is too wide to close in one wave",
                    humanize(&critical.dimension),
                    fmt_level(critical.gap_size)
                ),
                mitigation: "Phase delivery with an intermediate target level".to_string(),
                severity: RiskLevel::High,
            });
        }
        RiskRegister { risks }
    }

    fn is_acceptable(&self) -> bool {
        !self.risks.is_empty() && self.risks.iter().all(|r| !r.risk.trim().is_empty())
    }
}

const LIFECYCLE: [(&str, &str, &str, f64); 8] = [
    ("Mobilize", "Mobilize", "Confirm sponsor, team and governance", 0.05),
    ("Discovery", "Discover", "Baseline current state and success metrics", 0.10),
    ("Solution design", "Design", "Design target processes and architecture", 0.15),
    ("Build", "Build", "Build and configure the solution", 0.25),
    ("Pilot", "Pilot", "Run a pilot with one business unit", 0.15),
    ("Rollout", "Rollout", "Roll out to the remaining units", 0.15),
    ("Adoption", "Adopt", "Train users and embed new routines", 0.10),
    ("Closure", "Close", "Measure benefits and hand over to operations", 0.05),
];

impl CharterSection for TaskBreakdown {
    const TAG: SectionTag = SectionTag::Tasks;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template.tasks.clone().map(|tasks| TaskBreakdown { tasks })
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let total_weeks = ctx.total_months as f64 * 4.0;
        let tasks = LIFECYCLE
            .iter()
            .map(|(title, phase, description, share)| CharterTask {
                title: title.to_string(),
                description: description.to_string(),
                phase: phase.to_string(),
                duration_weeks: ((total_weeks * share).round() as u32).max(1),
            })
            .collect();
        TaskBreakdown { tasks }
    }

    fn is_acceptable(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| !t.title.trim().is_empty())
    }
}

const CORE_ROLES: [(&str, f64, &str); 6] = [
    ("Executive Sponsor", 0.1, "Owns the business case and removes blockers"),
    ("Product Owner", 0.5, "Prioritizes scope and accepts deliverables"),
    ("Project Manager", 1.0, "Plans, tracks and reports delivery"),
    ("Solution Architect", 0.5, "Owns the target architecture"),
    ("Change Manager", 0.3, "Leads communication and adoption"),
    ("Business Analyst", 0.5, "Captures requirements and process changes"),
];

impl CharterSection for TeamPlan {
    const TAG: SectionTag = SectionTag::Team;

    fn from_template(template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        template.team.clone().map(|roles| TeamPlan { roles })
    }

    fn fallback(ctx: &SectionContext) -> Self {
        let mut roles: Vec<TeamRole> = CORE_ROLES
            .iter()
            .map(|(role, fte, resp)| TeamRole {
                role: role.to_string(),
                allocation_fte: *fte,
                responsibilities: resp.to_string(),
            })
            .collect();
        if let Some(size) = ctx.constraints.team_size
            && size as usize > CORE_ROLES.len()
        {
            roles.push(TeamRole {
                role: "Delivery Team".to_string(),
                allocation_fte: (size as usize - CORE_ROLES.len()) as f64,
                responsibilities: "Builds, tests and deploys the solution".to_string(),
            });
        }
        TeamPlan { roles }
    }

    fn is_acceptable(&self) -> bool {
        !self.roles.is_empty() && self.roles.iter().all(|r| r.allocation_fte >= 0.0)
    }
}

impl CharterSection for FinancialEstimate {
    const TAG: SectionTag = SectionTag::Financials;

    fn fallback(ctx: &SectionContext) -> Self {
        let (mut budget, roi) = match ctx.largest_gap() {
            Some(largest) => {
                let total_gap: f64 = ctx.gaps.iter().map(|g| g.gap_size).sum();
                let budget = to_units(
                    total_gap * ctx.budget_rate * team_multiplier(ctx.constraints.team_size),
                );
                (budget, estimate_roi(largest.gap_size, classify(largest.gap_size)))
            }
            None => (BRIEF_ONLY_BUDGET, BRIEF_ONLY_ROI),
        };
        if let Some(max) = ctx.constraints.max_budget {
            budget = budget.min(max);
        }
        let split = FinancialSplit::from_budget(budget, ctx.capex_share);
        FinancialEstimate {
            estimated_budget: budget,
            capex: split.capex,
            opex: split.opex,
            estimated_roi: roi,
        }
    }

    fn is_acceptable(&self) -> bool {
        self.estimated_budget > 0 && self.estimated_roi.is_finite() && self.estimated_roi >= 0.0
    }
}

/// Executive summary rewrite for a gap-mode draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub summary: String,
}

impl CharterSection for DraftSummary {
    const TAG: SectionTag = SectionTag::Summary;

    fn fallback(ctx: &SectionContext) -> Self {
        DraftSummary {
            summary: ctx.baseline.summary.clone(),
        }
    }

    fn is_acceptable(&self) -> bool {
        self.summary.trim().chars().count() >= MIN_DESCRIPTION_CHARS
    }
}
