//! Gap reconciliation: extraction from assessments, scoring and thematic clustering.
//! Deterministic, no I/O.

pub mod consolidate;
pub mod priority;
pub mod themes;

pub use consolidate::{ConsolidationMode, GapConsolidator, sort_by_gap_size, sort_by_priority};
pub use priority::{SourceWeights, classify, priority_score};
pub use themes::{cluster, theme_for};
