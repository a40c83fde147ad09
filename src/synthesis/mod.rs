//! Initiative synthesis: one draft per theme (legacy) or per gap (wizard).

pub mod tables;

use crate::config::PipelineConfig;
use crate::gaps::consolidate::sort_by_gap_size;
use crate::model::{
    DraftStatus, FinancialSplit, Gap, GapSeverity, InitiativeDraft, PriorityTier, RiskLevel,
    SynthesisMode, ThemeCluster, Traceability, ValueTier,
};
use crate::utils::{mean, round1, to_units};
use tables::{axis_name, humanize, team_multiplier, theme_name};

#[derive(Debug, Clone)]
pub struct InitiativeSynthesizer {
    budget_rate: f64,
    capex_share: f64,
}

impl Default for InitiativeSynthesizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl InitiativeSynthesizer {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            budget_rate: cfg.budget_per_gap_point,
            capex_share: cfg.capex_share,
        }
    }

    /// Legacy flow: one aggregated draft per theme
    pub fn synthesize_themes(
        &self,
        clusters: &[ThemeCluster],
        source_assessment_id: Option<&str>,
    ) -> Vec<InitiativeDraft> {
        clusters
            .iter()
            .filter(|c| !c.gaps.is_empty())
            .map(|c| self.draft_for_theme(c, source_assessment_id))
            .collect()
    }

    /// Wizard flow: one draft per gap, largest gap first
    pub fn synthesize_gaps(
        &self,
        gaps: &[Gap],
        team_size: Option<u32>,
        source_assessment_id: Option<&str>,
    ) -> Vec<InitiativeDraft> {
        let mut ordered = gaps.to_vec();
        sort_by_gap_size(&mut ordered);
        ordered
            .iter()
            .map(|g| self.draft_for_gap(g, team_size, source_assessment_id))
            .collect()
    }

    pub fn draft_for_gap(
        &self,
        gap: &Gap,
        team_size: Option<u32>,
        source_assessment_id: Option<&str>,
    ) -> InitiativeDraft {
        let severity = gap.severity();
        let axis = humanize(&gap.dimension);
        let budget = to_units(gap.gap_size * self.budget_rate * team_multiplier(team_size));

        InitiativeDraft {
            id: uuid::Uuid::new_v4().to_string(),
            name: axis_name(&gap.dimension, gap.gap_size),
            summary: format!(
                "Close the {} maturity gap of {} levels reported by {}.",
                axis,
                fmt_level(gap.gap_size),
                gap.source
            ),
            description: format!(
                "{} currently sits at level {} against a target of {}. This initiative \
                 delivers the capabilities needed to reach the target level.",
                axis,
                fmt_level(gap.as_is),
                fmt_level(gap.to_be)
            ),
            hypothesis: format!(
                "If we raise {} from {} to {}, the organization will capture measurable \
                 efficiency and revenue gains within the initiative timeline.",
                axis,
                fmt_level(gap.as_is),
                fmt_level(gap.to_be)
            ),
            axis,
            priority: tier_for_severity(severity),
            business_value: value_tier(gap.gap_size),
            objectives: vec![objective(gap)],
            estimated_budget: budget,
            estimated_roi: estimate_roi(gap.gap_size, severity),
            financial_split: FinancialSplit::from_budget(budget, self.capex_share),
            timeline: timeline_label(gap.gap_size),
            risk_level: risk_for_gap(gap.gap_size),
            status: DraftStatus::Draft,
            source_assessment_id: source_assessment_id.map(str::to_string),
            traceability: Traceability::new(SynthesisMode::Gap, std::slice::from_ref(gap)),
        }
    }

    fn draft_for_theme(
        &self,
        cluster: &ThemeCluster,
        source_assessment_id: Option<&str>,
    ) -> InitiativeDraft {
        let gaps = &cluster.gaps;
        let sizes: Vec<f64> = gaps.iter().map(|g| g.gap_size).collect();
        let scores: Vec<f64> = gaps.iter().map(|g| g.priority_score as f64).collect();
        let mean_gap = mean(&sizes);
        let max_gap = sizes.iter().copied().fold(0.0_f64, f64::max);
        let priority = priority_tier(mean(&scores));
        let budget = to_units(sizes.iter().sum::<f64>() * self.budget_rate);

        let dimensions: Vec<String> = gaps.iter().map(|g| humanize(&g.dimension)).collect();
        let roi_base = mean_gap * 0.4 + 0.5;
        let roi = match priority {
            PriorityTier::Critical => roi_base * 1.3,
            PriorityTier::High => roi_base * 1.1,
            _ => roi_base,
        };

        InitiativeDraft {
            id: uuid::Uuid::new_v4().to_string(),
            name: theme_name(cluster.theme),
            summary: format!(
                "Consolidated {} initiative covering {} gap(s).",
                cluster.theme,
                gaps.len()
            ),
            description: format!(
                "Addresses the {} gaps identified across assessments in: {}. Average gap \
                 size is {} levels.",
                cluster.theme,
                dimensions.join(", "),
                fmt_level(round1(mean_gap))
            ),
            hypothesis: format!(
                "Investing in {} as one program closes related gaps faster and cheaper than \
                 isolated fixes.",
                cluster.theme
            ),
            axis: cluster.theme.label().to_string(),
            priority,
            business_value: value_tier(mean_gap),
            objectives: gaps.iter().map(objective).collect(),
            estimated_budget: budget,
            estimated_roi: round1(roi),
            financial_split: FinancialSplit::from_budget(budget, self.capex_share),
            timeline: timeline_label(max_gap),
            risk_level: risk_for_gap(max_gap),
            status: DraftStatus::Draft,
            source_assessment_id: source_assessment_id.map(str::to_string),
            traceability: Traceability::new(SynthesisMode::Theme, gaps),
        }
    }
}

/// `ceil(gap * 1.5)` to `+2` months
pub fn timeline_months(gap_size: f64) -> (u32, u32) {
    let low = (gap_size.max(0.0) * 1.5).ceil() as u32;
    (low, low.saturating_add(2))
}

pub fn timeline_label(gap_size: f64) -> String {
    let (low, high) = timeline_months(gap_size);
    format!("{}-{} months", low, high)
}

/// `gap * 0.4 + 0.5`, boosted for CRITICAL and HIGH gaps, one decimal
pub fn estimate_roi(gap_size: f64, severity: GapSeverity) -> f64 {
    let base = gap_size * 0.4 + 0.5;
    let boosted = match severity {
        GapSeverity::Critical => base * 1.3,
        GapSeverity::High => base * 1.1,
        _ => base,
    };
    round1(boosted)
}

pub fn risk_for_gap(gap_size: f64) -> RiskLevel {
    if gap_size >= 4.0 {
        RiskLevel::High
    } else if gap_size >= 2.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Mean priority score → tier
pub fn priority_tier(mean_priority: f64) -> PriorityTier {
    if mean_priority > 70.0 {
        PriorityTier::Critical
    } else if mean_priority > 50.0 {
        PriorityTier::High
    } else if mean_priority > 30.0 {
        PriorityTier::Medium
    } else {
        PriorityTier::Low
    }
}

/// Mean gap size → business value
pub fn value_tier(mean_gap: f64) -> ValueTier {
    if mean_gap > 4.0 {
        ValueTier::High
    } else if mean_gap > 2.5 {
        ValueTier::Medium
    } else {
        ValueTier::Low
    }
}

fn tier_for_severity(severity: GapSeverity) -> PriorityTier {
    match severity {
        GapSeverity::Critical => PriorityTier::Critical,
        GapSeverity::High => PriorityTier::High,
        GapSeverity::Medium => PriorityTier::Medium,
        GapSeverity::Low => PriorityTier::Low,
    }
}

pub(crate) fn objective(gap: &Gap) -> String {
    format!(
        "Raise {} maturity from {} to {}",
        humanize(&gap.dimension),
        fmt_level(gap.as_is),
        fmt_level(gap.to_be)
    )
}

/// 4.0 → "4", 2.5 → "2.5"
pub(crate) fn fmt_level(value: f64) -> String {
    let rounded = round1(value);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}
