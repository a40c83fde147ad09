//! Immutable lookup tables for initiative naming and sizing.

use crate::gaps::themes::normalize_dimension;
use crate::model::Theme;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Theme → initiative name. Technology Infrastructure is deliberately absent and
/// uses the generic fallback.
const THEME_NAMES: &[(Theme, &str)] = &[
    (Theme::DataManagement, "Data Foundation & Analytics Platform"),
    (Theme::ProcessDigitalization, "End-to-End Process Digitalization"),
    (Theme::OperationalExcellence, "Operational Excellence Program"),
    (Theme::DigitalProducts, "Digital Products & Services Expansion"),
    (Theme::OrganizationalCulture, "Digital Culture & Capability Building"),
    (Theme::Cybersecurity, "Cyber Resilience Program"),
];

/// Per-axis names indexed by severity tier (0 = largest gap)
static AXIS_NAMES: Lazy<HashMap<&'static str, [&'static str; 3]>> = Lazy::new(|| {
    [
        (
            "processes",
            [
                "End-to-End Process Digitalization Program",
                "Workflow Automation Rollout",
                "Process Digitization Quick Wins",
            ],
        ),
        (
            "digitalproducts",
            [
                "Digital Product Platform Launch",
                "Connected Product Features",
                "Product Data Enrichment",
            ],
        ),
        (
            "businessmodels",
            [
                "Digital Business Model Transformation",
                "Service-Based Revenue Pilot",
                "Digital Sales Channel Extension",
            ],
        ),
        (
            "datamanagement",
            [
                "Enterprise Data Platform & Governance",
                "Data Integration & Quality Program",
                "Reporting Automation Initiative",
            ],
        ),
        (
            "culture",
            [
                "Digital Culture Transformation",
                "Digital Skills Academy",
                "Change Champions Network",
            ],
        ),
        (
            "cybersecurity",
            [
                "Cybersecurity Resilience Program",
                "Security Operations Upgrade",
                "Security Awareness & Hygiene Sprint",
            ],
        ),
        (
            "aimaturity",
            [
                "AI Center of Excellence",
                "AI Use-Case Portfolio",
                "AI Pilot Sprint",
            ],
        ),
    ]
    .into_iter()
    .collect()
});

const GENERIC_AXIS_PATTERNS: [&str; 3] = [
    "{axis} Transformation Program",
    "{axis} Modernization",
    "{axis} Improvement Sprint",
];

pub fn theme_name(theme: Theme) -> String {
    THEME_NAMES
        .iter()
        .find(|(t, _)| *t == theme)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("{} Improvement Initiative", theme.label()))
}

/// Tier 0 for gap >= 4, tier 1 for gap >= 3, tier 2 otherwise
pub fn name_tier(gap_size: f64) -> usize {
    if gap_size >= 4.0 {
        0
    } else if gap_size >= 3.0 {
        1
    } else {
        2
    }
}

pub fn axis_name(dimension: &str, gap_size: f64) -> String {
    let tier = name_tier(gap_size);
    match AXIS_NAMES.get(normalize_dimension(dimension).as_str()) {
        Some(names) => names[tier.min(names.len() - 1)].to_string(),
        None => GENERIC_AXIS_PATTERNS[tier.min(GENERIC_AXIS_PATTERNS.len() - 1)]
            .replace("{axis}", &humanize(dimension)),
    }
}

/// Budget multiplier for team-size bands 1-5 / 6-10 / 11-20 / >20
pub fn team_multiplier(team_size: Option<u32>) -> f64 {
    match team_size {
        None | Some(0) => 1.0,
        Some(1..=5) => 0.6,
        Some(6..=10) => 1.0,
        Some(11..=20) => 1.3,
        Some(_) => 1.5,
    }
}

/// `dataManagement` / `data_management` → `Data Management`
pub fn humanize(dimension: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in dimension.trim().chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
