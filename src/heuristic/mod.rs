//! Deterministic, rule-based paths. Also the fallback target whenever the AI path fails.

pub mod analyzer;
pub mod generator;

pub use analyzer::HeuristicAnalyzer;
pub use generator::HeuristicGenerator;
