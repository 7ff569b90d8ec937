//! Parameter definitions with physical units and documented semantics.
//!
//! All tunable numbers live here with:
//! - Units (milliseconds, Hz, bins)
//! - Documented ranges and meanings
//! - Defaults matching the stock presentation

mod audio;
mod timing;

// Re-export all types
pub use audio::AnalysisConfig;
pub use timing::{CosmeticConfig, SequenceTiming};
