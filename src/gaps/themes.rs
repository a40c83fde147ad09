//! Dimension → theme dictionary and clustering.

use crate::model::{Gap, Theme, ThemeCluster};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Normalized dimension key → theme. Keys cover the DRD axes, the Lean axes and
/// the common names used by external frameworks.
static DIMENSION_THEMES: Lazy<HashMap<&'static str, Theme>> = Lazy::new(|| {
    use Theme::*;
    [
        ("datamanagement", DataManagement),
        ("data", DataManagement),
        ("dataanalytics", DataManagement),
        ("analytics", DataManagement),
        ("datagovernance", DataManagement),
        ("dataquality", DataManagement),
        ("aimaturity", DataManagement),
        ("ai", DataManagement),
        ("artificialintelligence", DataManagement),
        ("processes", ProcessDigitalization),
        ("process", ProcessDigitalization),
        ("digitalprocesses", ProcessDigitalization),
        ("processautomation", ProcessDigitalization),
        ("automation", ProcessDigitalization),
        ("workflow", ProcessDigitalization),
        ("operations", OperationalExcellence),
        ("operationalexcellence", OperationalExcellence),
        ("lean", OperationalExcellence),
        ("leanmanagement", OperationalExcellence),
        ("flow", OperationalExcellence),
        ("production", OperationalExcellence),
        ("quality", OperationalExcellence),
        ("maintenance", OperationalExcellence),
        ("supplychain", OperationalExcellence),
        ("logistics", OperationalExcellence),
        ("standardwork", OperationalExcellence),
        ("continuousimprovement", OperationalExcellence),
        ("digitalproducts", DigitalProducts),
        ("products", DigitalProducts),
        ("product", DigitalProducts),
        ("businessmodels", DigitalProducts),
        ("digitalbusinessmodels", DigitalProducts),
        ("customerexperience", DigitalProducts),
        ("services", DigitalProducts),
        ("culture", OrganizationalCulture),
        ("digitalculture", OrganizationalCulture),
        ("organizationalculture", OrganizationalCulture),
        ("people", OrganizationalCulture),
        ("skills", OrganizationalCulture),
        ("competencies", OrganizationalCulture),
        ("leadership", OrganizationalCulture),
        ("changemanagement", OrganizationalCulture),
        ("cybersecurity", Cybersecurity),
        ("security", Cybersecurity),
        ("cyber", Cybersecurity),
        ("informationsecurity", Cybersecurity),
        ("infosec", Cybersecurity),
        ("infrastructure", TechnologyInfrastructure),
        ("technology", TechnologyInfrastructure),
        ("technologyinfrastructure", TechnologyInfrastructure),
        ("it", TechnologyInfrastructure),
        ("cloud", TechnologyInfrastructure),
        ("integration", TechnologyInfrastructure),
    ]
    .into_iter()
    .collect()
});

/// NFKC, lowercase, alphanumerics only: `Data Management` == `data_management` == `dataManagement`
pub fn normalize_dimension(dimension: &str) -> String {
    dimension
        .nfkc()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Total: unmapped dimensions land in Technology Infrastructure
pub fn theme_for(dimension: &str) -> Theme {
    DIMENSION_THEMES
        .get(normalize_dimension(dimension).as_str())
        .copied()
        .unwrap_or(Theme::TechnologyInfrastructure)
}

/// Group gaps by theme in taxonomy order, preserving gap order within a theme.
/// Themes without members are dropped.
pub fn cluster(gaps: &[Gap]) -> Vec<ThemeCluster> {
    let mut buckets: HashMap<Theme, Vec<Gap>> = HashMap::new();
    for gap in gaps {
        buckets
            .entry(theme_for(&gap.dimension))
            .or_default()
            .push(gap.clone());
    }
    Theme::ALL
        .iter()
        .filter_map(|theme| {
            buckets
                .remove(theme)
                .filter(|g| !g.is_empty())
                .map(|gaps| ThemeCluster {
                    theme: *theme,
                    gaps,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssessmentSource;

    fn gap(dimension: &str, size: f64) -> Gap {
        Gap {
            source: AssessmentSource::Drd,
            source_id: "drd-1".into(),
            dimension: dimension.into(),
            as_is: 1.0,
            to_be: 1.0 + size,
            gap_size: size,
            priority_score: 0,
        }
    }

    #[test]
    fn spelling_variants_resolve_to_same_theme() {
        assert_eq!(theme_for("dataManagement"), Theme::DataManagement);
        assert_eq!(theme_for("Data Management"), Theme::DataManagement);
        assert_eq!(theme_for("data_management"), Theme::DataManagement);
        assert_eq!(theme_for("ＣＵＬＴＵＲＥ"), Theme::OrganizationalCulture);
    }

    #[test]
    fn unmapped_dimension_falls_back() {
        assert_eq!(theme_for("quantum readiness"), Theme::TechnologyInfrastructure);
        assert_eq!(theme_for(""), Theme::TechnologyInfrastructure);
    }

    #[test]
    fn drd_axes_are_all_mapped() {
        for axis in [
            "processes",
            "digitalProducts",
            "businessModels",
            "dataManagement",
            "culture",
            "cybersecurity",
            "aiMaturity",
        ] {
            assert_ne!(
                theme_for(axis),
                Theme::TechnologyInfrastructure,
                "{} should map to a named theme",
                axis
            );
        }
    }

    #[test]
    fn clustering_is_total_and_drops_empty_themes() {
        let gaps = vec![
            gap("culture", 3.0),
            gap("dataManagement", 4.0),
            gap("skills", 2.5),
            gap("mystery", 3.0),
        ];
        let clusters = cluster(&gaps);
        let total: usize = clusters.iter().map(|c| c.gaps.len()).sum();
        assert_eq!(total, gaps.len());
        let themes: Vec<Theme> = clusters.iter().map(|c| c.theme).collect();
        assert_eq!(
            themes,
            vec![
                Theme::DataManagement,
                Theme::OrganizationalCulture,
                Theme::TechnologyInfrastructure
            ]
        );
        let culture = &clusters[1];
        assert_eq!(culture.gaps[0].dimension, "culture");
        assert_eq!(culture.gaps[1].dimension, "skills");
    }
}
