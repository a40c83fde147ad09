//! Utility functions shared across the codebase

pub mod db;
pub mod math;

// Re-export commonly used utilities
pub use db::normalize_ws_url;
pub use math::{mean, round1, to_units};
