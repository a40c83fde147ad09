//! Post-processing of a draft batch against caller constraints.
//!
//! Steps run in a fixed order: proportional budget scaling, timeline override,
//! then risk appetite. Risk adjustments therefore apply to already-scaled budgets.

use crate::model::{Constraint, InitiativeDraft, RiskAppetite, RiskLevel};
use crate::utils::{round1, to_units};
use tracing::debug;

const CONSERVATIVE_BUDGET_FACTOR: f64 = 0.8;
const AGGRESSIVE_BUDGET_FACTOR: f64 = 1.2;
const AGGRESSIVE_ROI_BONUS: f64 = 0.5;

/// Apply every constraint to the batch in place
pub fn apply_constraints(drafts: &mut [InitiativeDraft], constraint: &Constraint) {
    if let Some(max_budget) = constraint.max_budget {
        scale_budgets(drafts, max_budget);
    }
    if let Some(timeline) = constraint.max_timeline.as_deref() {
        for d in drafts.iter_mut() {
            d.timeline = timeline.to_string();
        }
    }
    if let Some(appetite) = constraint.risk_appetite {
        apply_risk_appetite(drafts, appetite);
    }
}

/// Shrink every budget by `max / sum` when the batch exceeds `max`
pub fn scale_budgets(drafts: &mut [InitiativeDraft], max_budget: u64) {
    let total: u128 = drafts.iter().map(|d| u128::from(d.estimated_budget)).sum();
    if total <= u128::from(max_budget) || total == 0 {
        return;
    }
    let factor = max_budget as f64 / total as f64;
    debug!(
        "scaling {} draft budgets by {:.4} (total {} > max {})",
        drafts.len(),
        factor,
        total,
        max_budget
    );
    for d in drafts.iter_mut() {
        let scaled = to_units(d.estimated_budget as f64 * factor);
        d.set_budget(scaled);
    }
}

/// MEDIUM drafts are left alone under both appetites
pub fn apply_risk_appetite(drafts: &mut [InitiativeDraft], appetite: RiskAppetite) {
    for d in drafts.iter_mut() {
        match (appetite, d.risk_level) {
            (RiskAppetite::Conservative, RiskLevel::High) => {
                d.risk_level = RiskLevel::Medium;
                let budget = to_units(d.estimated_budget as f64 * CONSERVATIVE_BUDGET_FACTOR);
                d.set_budget(budget);
            }
            (RiskAppetite::Aggressive, RiskLevel::Low) => {
                d.risk_level = RiskLevel::Medium;
                let budget = to_units(d.estimated_budget as f64 * AGGRESSIVE_BUDGET_FACTOR);
                d.set_budget(budget);
                d.estimated_roi = round1(d.estimated_roi + AGGRESSIVE_ROI_BONUS);
            }
            _ => {}
        }
    }
}
