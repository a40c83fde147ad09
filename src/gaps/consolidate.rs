//! Turns normalized assessments into a flat, ranked list of gaps.

use super::priority::{SourceWeights, priority_score};
use crate::assessment::EXTERNAL_SCALE_TARGET;
use crate::model::{Assessment, AssessmentSource, DimensionScore, Gap, GapInput};

/// External axes at or above this mapped score are not treated as gaps
const EXTERNAL_GAP_CEILING: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsolidationMode {
    /// Theme flow: only gaps strictly larger than `min_gap` survive
    Legacy { min_gap: f64 },
    /// Per-gap flow: every positive gap survives
    Wizard,
}

impl ConsolidationMode {
    fn threshold(&self) -> f64 {
        match self {
            ConsolidationMode::Legacy { min_gap } => *min_gap,
            ConsolidationMode::Wizard => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GapConsolidator {
    weights: SourceWeights,
    mode: ConsolidationMode,
}

impl GapConsolidator {
    pub fn new(weights: SourceWeights, mode: ConsolidationMode) -> Self {
        Self { weights, mode }
    }

    pub fn mode(&self) -> ConsolidationMode {
        self.mode
    }

    /// Extract, filter and score every assessment; sorted by descending priority
    pub fn consolidate(&self, assessments: &[Assessment]) -> Vec<Gap> {
        let mut gaps: Vec<Gap> = assessments
            .iter()
            .flat_map(|a| {
                a.dimensions
                    .iter()
                    .filter_map(move |d| self.extract(&a.source, &a.source_id, d))
            })
            .collect();
        sort_by_priority(&mut gaps);
        tracing::debug!(
            "consolidated {} gaps from {} assessments",
            gaps.len(),
            assessments.len()
        );
        gaps
    }

    /// Gaps supplied directly by a caller; same filtering and scoring
    pub fn from_inputs(&self, inputs: &[GapInput]) -> Vec<Gap> {
        let mut gaps: Vec<Gap> = inputs
            .iter()
            .filter_map(|input| {
                let source_id = input.source_id.clone().unwrap_or_else(|| "manual".to_string());
                self.build(
                    input.source.clone(),
                    source_id,
                    &input.dimension,
                    input.as_is,
                    input.to_be,
                )
            })
            .collect();
        sort_by_priority(&mut gaps);
        gaps
    }

    fn extract(&self, source: &AssessmentSource, source_id: &str, d: &DimensionScore) -> Option<Gap> {
        let (as_is, to_be) = match source {
            AssessmentSource::Drd => (d.as_is, d.to_be),
            // Lean: benchmark - score, only for axes flagged as top gaps
            AssessmentSource::Lean if d.top_gap => (d.as_is, d.to_be),
            AssessmentSource::Lean => return None,
            AssessmentSource::External(_) if d.as_is < EXTERNAL_GAP_CEILING => {
                (d.as_is, EXTERNAL_SCALE_TARGET)
            }
            AssessmentSource::External(_) => return None,
        };
        self.build(source.clone(), source_id.to_string(), &d.dimension, as_is, to_be)
    }

    fn build(
        &self,
        source: AssessmentSource,
        source_id: String,
        dimension: &str,
        as_is: f64,
        to_be: f64,
    ) -> Option<Gap> {
        let gap_size = to_be - as_is;
        if !gap_size.is_finite() || gap_size <= 0.0 || gap_size <= self.mode.threshold() {
            return None;
        }
        let priority_score = priority_score(gap_size, &source, &self.weights);
        Some(Gap {
            source,
            source_id,
            dimension: dimension.to_string(),
            as_is,
            to_be,
            gap_size,
            priority_score,
        })
    }
}

/// Descending priority score; ties keep input order
pub fn sort_by_priority(gaps: &mut [Gap]) {
    gaps.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
}

/// Descending gap size; ties keep input order
pub fn sort_by_gap_size(gaps: &mut [Gap]) {
    gaps.sort_by(|a, b| b.gap_size.total_cmp(&a.gap_size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkflowStatus;

    fn dim(name: &str, as_is: f64, to_be: f64, top_gap: bool) -> DimensionScore {
        DimensionScore {
            dimension: name.to_string(),
            as_is,
            to_be,
            top_gap,
        }
    }

    fn assessment(source: AssessmentSource, dims: Vec<DimensionScore>) -> Assessment {
        Assessment {
            id: "a-1".into(),
            source,
            source_id: "src-1".into(),
            organization_id: None,
            dimensions: dims,
            workflow_status: WorkflowStatus::Completed,
            project_id: None,
            initiatives_generated: false,
        }
    }

    #[test]
    fn wizard_keeps_every_positive_gap() {
        let c = GapConsolidator::new(SourceWeights::default(), ConsolidationMode::Wizard);
        let gaps = c.consolidate(&[assessment(
            AssessmentSource::Drd,
            vec![
                dim("processes", 3.0, 4.0, false),
                dim("culture", 5.0, 5.0, false),
                dim("cybersecurity", 6.0, 4.0, false),
            ],
        )]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap_size, 1.0);
        assert_eq!(gaps[0].priority_score, 12);
    }

    #[test]
    fn legacy_drops_small_gaps() {
        let c = GapConsolidator::new(
            SourceWeights::default(),
            ConsolidationMode::Legacy { min_gap: 2.0 },
        );
        let gaps = c.consolidate(&[assessment(
            AssessmentSource::Drd,
            vec![dim("processes", 2.0, 4.0, false), dim("culture", 1.0, 4.0, false)],
        )]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].dimension, "culture");
    }

    #[test]
    fn lean_uses_only_flagged_axes() {
        let c = GapConsolidator::new(SourceWeights::default(), ConsolidationMode::Wizard);
        let gaps = c.consolidate(&[assessment(
            AssessmentSource::Lean,
            vec![dim("flow", 2.0, 4.5, true), dim("quality", 1.0, 4.0, false)],
        )]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].dimension, "flow");
        assert_eq!(gaps[0].gap_size, 2.5);
    }

    #[test]
    fn external_gaps_measure_against_top_of_scale() {
        let c = GapConsolidator::new(SourceWeights::default(), ConsolidationMode::Wizard);
        let gaps = c.consolidate(&[assessment(
            AssessmentSource::external("siri"),
            vec![dim("automation", 3.5, 7.0, false), dim("cloud", 4.0, 7.0, false)],
        )]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap_size, 3.5);
        assert_eq!(gaps[0].priority_score, 35);
    }

    #[test]
    fn output_is_sorted_by_priority() {
        let c = GapConsolidator::new(SourceWeights::default(), ConsolidationMode::Wizard);
        let gaps = c.consolidate(&[
            assessment(
                AssessmentSource::external("siri"),
                vec![dim("automation", 1.0, 7.0, false)],
            ),
            assessment(AssessmentSource::Drd, vec![dim("culture", 2.0, 5.0, false)]),
        ]);
        let scores: Vec<u8> = gaps.iter().map(|g| g.priority_score).collect();
        assert_eq!(scores, vec![60, 36]);
    }

    #[test]
    fn gap_size_sort_is_descending() {
        let c = GapConsolidator::new(SourceWeights::default(), ConsolidationMode::Wizard);
        let mut gaps = c.from_inputs(&[
            GapInput {
                dimension: "culture".into(),
                as_is: 3.0,
                to_be: 5.0,
                source: AssessmentSource::Drd,
                source_id: None,
            },
            GapInput {
                dimension: "automation".into(),
                as_is: 1.0,
                to_be: 4.0,
                source: AssessmentSource::external("siri"),
                source_id: None,
            },
        ]);
        sort_by_gap_size(&mut gaps);
        assert_eq!(gaps[0].dimension, "automation");
        assert_eq!(gaps[1].source_id, "manual");
    }
}
