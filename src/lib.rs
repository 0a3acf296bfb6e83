//! SQL query optimizer core
//!
//! Analyzes SQL queries and generates SQL from natural-language questions,
//! using a language model when one is configured and deterministic heuristics
//! otherwise (or whenever the model's answer cannot be used).

pub mod config;
pub mod engine;
pub mod error;
pub mod heuristic;
pub mod llm;
pub mod models;
pub mod normalizer;
pub mod observability;
pub mod prompts;
pub mod server;

pub use config::OptimizerConfig;
pub use engine::{Mode, OptimizerEngine};
pub use error::{AiFailure, OptimizerError, Result};
pub use models::{AnalysisResult, AnalyzeRequest, Impact, PlanNode, Suggestion, TextToSqlRequest, TextToSqlResponse};
