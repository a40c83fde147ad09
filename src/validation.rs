//! Pre-approval checks. Structural problems are errors and block approval;
//! business-rule concerns are warnings only.

use crate::config::PipelineConfig;
use crate::model::{InitiativeDraft, RiskLevel, ValidationResult};

const MIN_NAME_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 20;
const MIN_ROI: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Validator {
    large_budget: u64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Validator {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            large_budget: cfg.large_budget_warning,
        }
    }

    pub fn validate(&self, draft: &InitiativeDraft) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if draft.name.trim().chars().count() < MIN_NAME_CHARS {
            errors.push(format!(
                "name must be at least {} characters",
                MIN_NAME_CHARS
            ));
        }
        if draft.description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            errors.push(format!(
                "description must be at least {} characters",
                MIN_DESCRIPTION_CHARS
            ));
        }
        if draft.estimated_budget == 0 {
            errors.push("estimated budget must be greater than 0".to_string());
        }
        if draft.timeline.trim().is_empty() {
            errors.push("timeline is required".to_string());
        }

        if draft.objectives.iter().all(|o| o.trim().is_empty()) {
            warnings.push("no objectives defined".to_string());
        }
        if draft.estimated_roi < MIN_ROI {
            warnings.push(format!(
                "estimated ROI {:.1} is below {:.1}",
                draft.estimated_roi, MIN_ROI
            ));
        }
        if draft.risk_level == RiskLevel::High && draft.estimated_budget > self.large_budget {
            warnings.push(format!(
                "high-risk initiative with budget above {} needs steering review",
                self.large_budget
            ));
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
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
            dimension: "cybersecurity".into(),
            as_is: 2.0,
            to_be: 5.0,
            gap_size: 3.0,
            priority_score: 36,
        };
        InitiativeSynthesizer::default().draft_for_gap(&gap, None, None)
    }

    #[test]
    fn synthesized_draft_is_valid() {
        let r = Validator::default().validate(&draft());
        assert!(r.valid, "{:?}", r.errors);
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    }

    #[test]
    fn short_name_is_an_error() {
        let mut d = draft();
        d.name = "Abc".into();
        let r = Validator::default().validate(&d);
        assert!(!r.valid);
        assert!(r.errors.iter().any(|e| e.starts_with("name")));
    }

    #[test]
    fn structural_errors_accumulate() {
        let mut d = draft();
        d.description = "too short".into();
        d.set_budget(0);
        d.timeline = "  ".into();
        let r = Validator::default().validate(&d);
        assert_eq!(r.errors.len(), 3);
    }

    #[test]
    fn low_roi_only_warns() {
        let mut d = draft();
        d.estimated_roi = 0.7;
        let r = Validator::default().validate(&d);
        assert!(r.valid);
        assert!(r.warnings.iter().any(|w| w.contains("ROI")));
    }

    #[test]
    fn large_high_risk_budget_warns() {
        let mut d = draft();
        d.risk_level = RiskLevel::High;
        d.set_budget(750_000);
        d.objectives.clear();
        let r = Validator::default().validate(&d);
        assert!(r.valid);
        assert_eq!(r.warnings.len(), 2);
    }
}
