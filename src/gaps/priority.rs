//! Priority scoring with source-specific weighting.

use crate::config::PipelineConfig;
use crate::model::{AssessmentSource, GapSeverity};

/// Trust weights per framework; the primary framework counts the most
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWeights {
    pub primary: f64,
    pub secondary: f64,
    pub default: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            primary: 1.2,
            secondary: 1.1,
            default: 1.0,
        }
    }
}

impl SourceWeights {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            primary: cfg.primary_weight,
            secondary: cfg.secondary_weight,
            default: cfg.default_weight,
        }
    }

    pub fn weight(&self, source: &AssessmentSource) -> f64 {
        match source {
            AssessmentSource::Drd => self.primary,
            AssessmentSource::Lean => self.secondary,
            AssessmentSource::External(_) => self.default,
        }
    }
}

/// `clamp(round(gap * 10 * weight), 0, 100)`
pub fn priority_score(gap_size: f64, source: &AssessmentSource, weights: &SourceWeights) -> u8 {
    let raw = (gap_size * 10.0 * weights.weight(source)).round();
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, 100.0) as u8
}

/// Coarse label used by the per-gap flow instead of the numeric score
pub fn classify(gap_size: f64) -> GapSeverity {
    if gap_size >= 4.0 {
        GapSeverity::Critical
    } else if gap_size >= 3.0 {
        GapSeverity::High
    } else if gap_size >= 2.0 {
        GapSeverity::Medium
    } else {
        GapSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_favour_primary_framework() {
        let w = SourceWeights::default();
        assert_eq!(priority_score(4.0, &AssessmentSource::Drd, &w), 48);
        assert_eq!(priority_score(4.0, &AssessmentSource::Lean, &w), 44);
        assert_eq!(
            priority_score(4.0, &AssessmentSource::external("iso"), &w),
            40
        );
    }

    #[test]
    fn score_is_clamped() {
        let w = SourceWeights::default();
        assert_eq!(priority_score(12.0, &AssessmentSource::Drd, &w), 100);
        assert_eq!(priority_score(-3.0, &AssessmentSource::Drd, &w), 0);
    }

    #[test]
    fn classifier_boundaries() {
        assert_eq!(classify(4.0), GapSeverity::Critical);
        assert_eq!(classify(3.9), GapSeverity::High);
        assert_eq!(classify(3.0), GapSeverity::High);
        assert_eq!(classify(2.0), GapSeverity::Medium);
        assert_eq!(classify(1.99), GapSeverity::Low);
    }
}
