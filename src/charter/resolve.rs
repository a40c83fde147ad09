//! Three-tier section resolution: template fragment, then text generation, then
//! the section's deterministic default.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::prompts::PROMPTS;
use super::types::{
    CharterRequest, CharterTemplate, OrganizationContext, SectionOrigin, SectionTag, SourceType,
};
use crate::clients::{Generation, TextGenerator, generate_section};
use crate::model::{Constraint, Gap, InitiativeDraft};

/// Everything a section needs to build its prompt or its default
#[derive(Debug, Clone)]
pub struct SectionContext {
    pub source_type: SourceType,
    pub organization: OrganizationContext,
    pub brief: Option<String>,
    pub constraints: Constraint,
    /// Ordered by gap size, largest first
    pub gaps: Vec<Gap>,
    pub total_months: u32,
    pub budget_rate: f64,
    pub capex_share: f64,
    /// Deterministic draft the charter starts from
    pub baseline: InitiativeDraft,
}

impl SectionContext {
    pub fn from_request(
        request: &CharterRequest,
        gaps: Vec<Gap>,
        total_months: u32,
        budget_rate: f64,
        capex_share: f64,
        baseline: InitiativeDraft,
    ) -> Self {
        Self {
            source_type: request.source_type,
            organization: request.organization.clone(),
            brief: request
                .brief
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
            constraints: request.constraints.clone(),
            gaps,
            total_months,
            budget_rate,
            capex_share,
            baseline,
        }
    }

    pub fn largest_gap(&self) -> Option<&Gap> {
        self.gaps.first()
    }
}

/// One charter section. Implementors supply the default; the resolver owns the
/// ordering of the tiers.
pub trait CharterSection: Serialize + DeserializeOwned + Send + Sized {
    const TAG: SectionTag;

    /// Fragment taken from a stored template, if the template carries one
    fn from_template(_template: &CharterTemplate, _ctx: &SectionContext) -> Option<Self> {
        None
    }

    fn prompt(ctx: &SectionContext) -> String {
        PROMPTS.render(Self::TAG, ctx)
    }

    fn fallback(ctx: &SectionContext) -> Self;

    /// Shape checks beyond deserialization; a failing value counts as malformed
    fn is_acceptable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct Resolved<S> {
    pub value: S,
    pub origin: SectionOrigin,
}

pub async fn resolve<S: CharterSection>(
    ctx: &SectionContext,
    template: Option<&CharterTemplate>,
    generator: Option<&dyn TextGenerator>,
    timeout: Duration,
) -> Resolved<S> {
    let tag = S::TAG.as_str();

    if let Some(value) = template.and_then(|t| S::from_template(t, ctx))
        && value.is_acceptable()
    {
        debug!("section {} taken from template", tag);
        return Resolved {
            value,
            origin: SectionOrigin::Template,
        };
    }

    if let Some(generator) = generator {
        let prompt = S::prompt(ctx);
        match generate_section(generator, &prompt, tag, timeout).await {
            Generation::Parsed(raw) => match serde_json::from_value::<S>(raw) {
                Ok(value) if value.is_acceptable() => {
                    debug!("section {} generated by {}", tag, generator.name());
                    return Resolved {
                        value,
                        origin: SectionOrigin::Generated,
                    };
                }
                Ok(_) => warn!("section {}: generated value rejected, using default", tag),
                Err(e) => warn!("section {}: generated value malformed ({}), using default", tag, e),
            },
            Generation::Malformed(reason) => {
                warn!("section {}: malformed generation ({}), using default", tag, reason)
            }
            Generation::Unavailable(reason) => {
                warn!("section {}: generation unavailable ({}), using default", tag, reason)
            }
        }
    }

    Resolved {
        value: S::fallback(ctx),
        origin: SectionOrigin::Default,
    }
}
