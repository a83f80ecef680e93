//! Clinical laboratory analysis library
//!
//! This library evaluates a patient's laboratory values against demographic- and
//! condition-specific reference ranges, classifies each value's clinical state and
//! severity, raises alerts for critical findings, and aggregates everything into a
//! per-encounter analysis record. Standalone clinical calculators (eGFR, anion gap,
//! osmolarity, corrected sodium) are provided as pure functions.

pub mod models;
pub mod resolver;
pub mod classifier;
pub mod alerts;
pub mod calculators;
pub mod analyzer;
pub mod reference_data;
pub mod extraction;
pub mod clock;
pub mod output;
pub mod example_data;
pub mod errors;

pub use models::*;
pub use analyzer::*;
pub use errors::*;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, AnalysisError>;
