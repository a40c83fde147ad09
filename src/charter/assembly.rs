//! Roll-ups computed after all sections are resolved.

use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{CharterRisk, ConfidenceTier, Milestone};
use crate::model::{Gap, GapSeverity, RiskLevel};
use crate::synthesis::timeline_months;

pub const DEFAULT_TOTAL_MONTHS: u32 = 6;

const MILESTONES: [(&str, f64); 5] = [
    ("Mobilization complete", 0.1),
    ("Solution design approved", 0.3),
    ("Pilot in production", 0.5),
    ("Rollout complete", 0.7),
    ("Benefits review & closure", 1.0),
];

static MONTH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)(?:\s*(?:-|to)\s*(\d+))?\s*(months?|years?)")
        .expect("month range pattern is valid")
});

/// Upper bound of a free-text duration: "6-8 months" → 8, "1 year" → 12
pub fn parse_upper_months(text: &str) -> Option<u32> {
    let caps = MONTH_RANGE.captures(text)?;
    let upper: u32 = caps
        .get(2)
        .or_else(|| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())?;
    let unit = caps.get(3).map(|m| m.as_str().to_ascii_lowercase())?;
    let months = if unit.starts_with("year") {
        upper.checked_mul(12)?
    } else {
        upper
    };
    (months > 0).then_some(months)
}

/// Request override, then the timeline constraint, then the largest gap, then 6
pub fn total_months(
    requested: Option<u32>,
    max_timeline: Option<&str>,
    largest_gap: Option<&Gap>,
) -> u32 {
    if let Some(m) = requested.filter(|m| *m > 0) {
        return m;
    }
    if let Some(m) = max_timeline.and_then(parse_upper_months) {
        return m;
    }
    match largest_gap {
        Some(g) => timeline_months(g.gap_size).1.max(1),
        None => DEFAULT_TOTAL_MONTHS,
    }
}

/// First checkpoint at month 1; later ones never go backwards
pub fn milestones(total_months: u32, start: NaiveDate) -> Vec<Milestone> {
    let total = total_months.max(1);
    let mut previous = 0u32;
    MILESTONES
        .iter()
        .enumerate()
        .map(|(i, (name, fraction))| {
            let month = if i == 0 {
                1
            } else {
                ((total as f64 * fraction).round() as u32).max(previous)
            };
            previous = month;
            Milestone {
                name: name.to_string(),
                month,
                due_date: start.checked_add_months(Months::new(month)).unwrap_or(start),
            }
        })
        .collect()
}

pub fn risk_rollup(risks: &[CharterRisk]) -> RiskLevel {
    let high = risks.iter().filter(|r| r.severity == RiskLevel::High).count();
    let medium = risks.iter().filter(|r| r.severity == RiskLevel::Medium).count();
    if high >= 2 {
        RiskLevel::High
    } else if high >= 1 || medium >= 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// 1 when any gap is critical, 2 with two or more high gaps, else 3
pub fn priority_tier(gaps: &[Gap]) -> u8 {
    if gaps.iter().any(|g| g.severity() == GapSeverity::Critical) {
        1
    } else if gaps.iter().filter(|g| g.severity() == GapSeverity::High).count() >= 2 {
        2
    } else {
        3
    }
}

pub fn confidence(template_found: bool, gap_count: usize) -> ConfidenceTier {
    if gap_count == 0 {
        ConfidenceTier::Low
    } else if template_found && gap_count >= 3 {
        ConfidenceTier::High
    } else {
        ConfidenceTier::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssessmentSource;

    fn gap(size: f64) -> Gap {
        Gap {
            source: AssessmentSource::Drd,
            source_id: "d".into(),
            dimension: "processes".into(),
            as_is: 1.0,
            to_be: 1.0 + size,
            gap_size: size,
            priority_score: 0,
        }
    }

    fn risk(severity: RiskLevel) -> CharterRisk {
        CharterRisk {
            risk: "r".into(),
            mitigation: "m".into(),
            severity,
        }
    }

    #[test]
    fn parses_duration_text() {
        assert_eq!(parse_upper_months("6-8 months"), Some(8));
        assert_eq!(parse_upper_months("within 10 Months"), Some(10));
        assert_eq!(parse_upper_months("3 to 5 months"), Some(5));
        assert_eq!(parse_upper_months("1 year"), Some(12));
        assert_eq!(parse_upper_months("Q3 2027"), None);
    }

    #[test]
    fn total_months_precedence() {
        let g = gap(4.0);
        assert_eq!(total_months(Some(12), Some("4 months"), Some(&g)), 12);
        assert_eq!(total_months(None, Some("4 months"), Some(&g)), 4);
        assert_eq!(total_months(None, Some("Q3"), Some(&g)), 8);
        assert_eq!(total_months(None, None, None), 6);
    }

    #[test]
    fn milestones_for_short_and_long_charters() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let m: Vec<u32> = milestones(12, start).iter().map(|m| m.month).collect();
        assert_eq!(m, vec![1, 4, 6, 8, 12]);
        let short: Vec<u32> = milestones(2, start).iter().map(|m| m.month).collect();
        assert_eq!(short, vec![1, 1, 1, 1, 2]);
        assert_eq!(
            milestones(12, start)[0].due_date,
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn risk_rollup_thresholds() {
        use RiskLevel::*;
        assert_eq!(risk_rollup(&[risk(High), risk(High)]), High);
        assert_eq!(risk_rollup(&[risk(High), risk(Low)]), Medium);
        assert_eq!(risk_rollup(&[risk(Medium), risk(Medium), risk(Medium)]), Medium);
        assert_eq!(risk_rollup(&[risk(Medium), risk(Medium), risk(Low)]), Low);
        assert_eq!(risk_rollup(&[]), Low);
    }

    #[test]
    fn priority_and_confidence() {
        assert_eq!(priority_tier(&[gap(4.0)]), 1);
        assert_eq!(priority_tier(&[gap(3.0), gap(3.0)]), 2);
        assert_eq!(priority_tier(&[gap(3.0), gap(1.0)]), 3);
        assert_eq!(confidence(true, 3), ConfidenceTier::High);
        assert_eq!(confidence(true, 2), ConfidenceTier::Medium);
        assert_eq!(confidence(false, 5), ConfidenceTier::Medium);
        assert_eq!(confidence(true, 0), ConfidenceTier::Low);
    }
}
