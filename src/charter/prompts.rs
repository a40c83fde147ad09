//! Versioned prompt templates for charter sections.
//!
//! Each template carries a stable id and a content checksum so audit entries can
//! record exactly which prompt text produced a generated section.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::resolve::SectionContext;
use super::types::SectionTag;
use crate::synthesis::fmt_level;
use crate::synthesis::tables::humanize;

const PREAMBLE: &str = "You are drafting one section of a digital transformation project \
charter. Answer with a single JSON object and nothing else.\n\n{{context}}\n\n";

/// Prompt template for one section
#[derive(Debug, Clone, Serialize)]
pub struct SectionPrompt {
    /// Stable identifier (format: charter-<section>-v1)
    pub id: String,
    pub section: SectionTag,
    pub template: String,
    /// blake3 of the template text
    pub checksum: String,
}

impl SectionPrompt {
    fn new(section: SectionTag, instruction: &str) -> Self {
        let template = format!("{}{}", PREAMBLE, instruction);
        Self {
            id: format!("charter-{}-v1", section.as_str().replace('_', "-")),
            section,
            checksum: blake3::hash(template.as_bytes()).to_hex().to_string(),
            template,
        }
    }
}

#[derive(Debug, Default)]
pub struct PromptRegistry {
    prompts: HashMap<SectionTag, SectionPrompt>,
}

pub static PROMPTS: Lazy<PromptRegistry> = Lazy::new(PromptRegistry::new);

impl PromptRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_sections();
        registry
    }

    pub fn register(&mut self, prompt: SectionPrompt) {
        self.prompts.insert(prompt.section, prompt);
    }

    pub fn get(&self, section: SectionTag) -> Option<&SectionPrompt> {
        self.prompts.get(&section)
    }

    /// Fill the section template with the rendered request context
    pub fn render(&self, section: SectionTag, ctx: &SectionContext) -> String {
        let context = render_context(ctx);
        match self.get(section) {
            Some(p) => p.template.replace("{{context}}", &context),
            None => format!("{}\n\nWrite the {} section as JSON.", context, section.as_str()),
        }
    }

    fn register_sections(&mut self) {
        let sections: [(SectionTag, &str); 9] = [
            (
                SectionTag::Identity,
                "Name the initiative and describe it.\nShape: {\"name\": string, \"summary\": string, \
                 \"description\": string, \"hypothesis\": string, \"axis\": string}\nThe name must be at \
                 least 5 characters and the description at least 20.",
            ),
            (
                SectionTag::Problem,
                "State the problem.\nShape: {\"symptom\": string, \"root_cause\": string, \
                 \"cost_of_inaction\": string}",
            ),
            (
                SectionTag::TargetState,
                "Describe the target state after the initiative.\nShape: {\"process\": [string], \
                 \"behavior\": [string], \"capability\": [string]}",
            ),
            (
                SectionTag::KillCriteria,
                "List the conditions under which the initiative should be stopped.\nShape: \
                 {\"criteria\": [string]}",
            ),
            (
                SectionTag::Risks,
                "List the main delivery risks.\nShape: {\"risks\": [{\"risk\": string, \"mitigation\": \
                 string, \"severity\": \"LOW\" | \"MEDIUM\" | \"HIGH\"}]}",
            ),
            (
                SectionTag::Tasks,
                "Break the work into tasks.\nShape: {\"tasks\": [{\"title\": string, \"description\": \
                 string, \"phase\": string, \"duration_weeks\": integer}]}",
            ),
            (
                SectionTag::Team,
                "Propose the team.\nShape: {\"roles\": [{\"role\": string, \"allocation_fte\": number, \
                 \"responsibilities\": string}]}",
            ),
            (
                SectionTag::Financials,
                "Estimate the financials in whole currency units.\nShape: {\"estimated_budget\": integer, \
                 \"capex\": integer, \"opex\": integer, \"estimated_roi\": number}",
            ),
            (
                SectionTag::Summary,
                "Rewrite the initiative summary in two sentences for an executive audience.\nShape: \
                 {\"summary\": string}",
            ),
        ];
        for (section, instruction) in sections {
            self.register(SectionPrompt::new(section, instruction));
        }
    }
}

/// Plain-text rendering of the request the section is written for
pub fn render_context(ctx: &SectionContext) -> String {
    let mut out = format!("Organization: {}", ctx.organization.name);
    if let Some(industry) = &ctx.organization.industry {
        out.push_str(&format!("\nIndustry: {}", industry));
    }
    if let Some(size) = &ctx.organization.size {
        out.push_str(&format!("\nSize: {}", size));
    }
    out.push_str(&format!(
        "\nSource: {:?}\nInitiative: {}\nDuration: {} months",
        ctx.source_type, ctx.baseline.name, ctx.total_months
    ));
    if let Some(brief) = &ctx.brief {
        out.push_str(&format!("\nBrief: {}", brief));
    }
    if !ctx.gaps.is_empty() {
        out.push_str("\nMaturity gaps:");
        for g in &ctx.gaps {
            out.push_str(&format!(
                "\n- {} ({}): level {} -> {} (gap {}, {:?})",
                humanize(&g.dimension),
                g.source,
                fmt_level(g.as_is),
                fmt_level(g.to_be),
                fmt_level(g.gap_size),
                g.severity()
            ));
        }
    }
    let c = &ctx.constraints;
    if let Some(max) = c.max_budget {
        out.push_str(&format!("\nMaximum budget: {}", max));
    }
    if let Some(team) = c.team_size {
        out.push_str(&format!("\nTeam size: {}", team));
    }
    if let Some(appetite) = c.risk_appetite {
        out.push_str(&format!("\nRisk appetite: {:?}", appetite));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_has_a_prompt() {
        for tag in [
            SectionTag::Identity,
            SectionTag::Problem,
            SectionTag::TargetState,
            SectionTag::KillCriteria,
            SectionTag::Risks,
            SectionTag::Tasks,
            SectionTag::Team,
            SectionTag::Financials,
            SectionTag::Summary,
        ] {
            let p = PROMPTS.get(tag).unwrap();
            assert!(p.template.contains("{{context}}"));
            assert_eq!(p.checksum.len(), 64);
        }
    }

    #[test]
    fn ids_are_stable() {
        assert_eq!(
            PROMPTS.get(SectionTag::KillCriteria).unwrap().id,
            "charter-kill-criteria-v1"
        );
    }
}
