//! Normalizers turn raw model completions into the fixed response contracts.

pub mod analysis;
pub mod generation;

pub use analysis::AnalysisNormalizer;
pub use generation::GenerationNormalizer;
