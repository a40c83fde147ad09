//! Persistence collaborators. The pipeline only sees these traits; `memory` backs
//! tests and the CLI, `surreal` backs a real deployment.

pub mod memory;
pub mod surreal;

use crate::charter::CharterTemplate;
use crate::error::Result;
use crate::model::{Assessment, Initiative, InitiativeDraft};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn get_assessment(&self, id: &str) -> Result<Option<Assessment>>;

    /// Flag the assessment once initiatives have been transferred from it
    async fn mark_initiatives_generated(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, id: &str) -> Result<Option<CharterTemplate>>;
}

#[async_trait]
pub trait InitiativeStore: Send + Sync {
    /// Persist a new initiative and return its id
    async fn insert(&self, initiative: &Initiative) -> Result<String>;

    /// Idempotent: linking the same pair twice is not an error
    async fn link_to_assessment(&self, initiative_id: &str, assessment_id: &str) -> Result<()>;
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn upsert_draft(&self, assessment_id: &str, drafts: &[InitiativeDraft]) -> Result<()>;

    /// Empty when nothing was stored for the assessment
    async fn get_draft(&self, assessment_id: &str) -> Result<Vec<InitiativeDraft>>;
}
