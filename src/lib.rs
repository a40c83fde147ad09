//! Turns digital-maturity assessments into ranked gaps, draft initiatives and
//! project charters, and promotes approved drafts into the initiative store.

pub mod assessment;
pub mod audit;
pub mod charter;
pub mod clients;
pub mod config;
pub mod constraints;
pub mod error;
pub mod gaps;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod synthesis;
pub mod transfer;
pub mod utils;
pub mod validation;

pub use error::{ForgeError, Result};
pub use pipeline::{DraftBatch, DraftRequest, InitiativePipeline, PipelineStores};

