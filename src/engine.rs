//! Mode selection and fallback
//!
//! The AI path is an optional accelerator; the heuristic path is the baseline.
//! Each AI attempt yields either a normalized contract or an [`AiFailure`], and
//! any failure is answered by running the heuristic path on the same input.
//! Only request validation errors reach the caller.

use crate::config::OptimizerConfig;
use crate::error::{AiFailure, Result};
use crate::heuristic::{HeuristicAnalyzer, HeuristicGenerator};
use crate::llm::{self, LanguageModel};
use crate::models::{AnalysisResult, AnalyzeRequest, TextToSqlRequest, TextToSqlResponse};
use crate::normalizer::{AnalysisNormalizer, GenerationNormalizer};
use crate::prompts;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ai,
    Heuristic,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ai => write!(f, "ai"),
            Mode::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Stateless per request; share it behind an `Arc`.
#[derive(Clone)]
pub struct OptimizerEngine {
    model: Option<Arc<dyn LanguageModel>>,
    analyzer: HeuristicAnalyzer,
    generator: HeuristicGenerator,
    analysis_normalizer: AnalysisNormalizer,
    generation_normalizer: GenerationNormalizer,
}

impl OptimizerEngine {
    /// `model = None` pins the engine to the heuristic path.
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            model,
            analyzer: HeuristicAnalyzer::new(),
            generator: HeuristicGenerator::new(),
            analysis_normalizer: AnalysisNormalizer::new(),
            generation_normalizer: GenerationNormalizer::new(),
        }
    }

    pub fn heuristic_only() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        let model = if config.ai_enabled() {
            llm::from_settings(&config.llm)
        } else {
            None
        };
        Self::new(model)
    }

    pub fn ai_enabled(&self) -> bool {
        self.model.is_some()
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult> {
        Ok(self.analyze_with_mode(request).await?.0)
    }

    /// Like [`analyze`](Self::analyze) but also reports which path answered.
    pub async fn analyze_with_mode(&self, request: &AnalyzeRequest) -> Result<(AnalysisResult, Mode)> {
        request.validate()?;

        match self.try_ai_analysis(request).await {
            Ok(result) => {
                info!(mode = %Mode::Ai, suggestions = result.suggestions.len(), "analysis complete");
                Ok((result, Mode::Ai))
            }
            Err(failure) => {
                log_fallback("analysis", &failure);
                let result = self.analyzer.analyze(&request.query);
                info!(mode = %Mode::Heuristic, suggestions = result.suggestions.len(), "analysis complete");
                Ok((result, Mode::Heuristic))
            }
        }
    }

    pub async fn generate_sql(&self, request: &TextToSqlRequest) -> Result<TextToSqlResponse> {
        Ok(self.generate_sql_with_mode(request).await?.0)
    }

    pub async fn generate_sql_with_mode(
        &self,
        request: &TextToSqlRequest,
    ) -> Result<(TextToSqlResponse, Mode)> {
        request.validate()?;

        match self.try_ai_generation(request).await {
            Ok(response) => {
                info!(mode = %Mode::Ai, "sql generation complete");
                Ok((response, Mode::Ai))
            }
            Err(failure) => {
                log_fallback("generation", &failure);
                let response = self.generator.generate(&request.schema_def, &request.question);
                info!(mode = %Mode::Heuristic, "sql generation complete");
                Ok((response, Mode::Heuristic))
            }
        }
    }

    async fn try_ai_analysis(&self, request: &AnalyzeRequest) -> std::result::Result<AnalysisResult, AiFailure> {
        let model = self.model.as_ref().ok_or(AiFailure::Disabled)?;
        debug!(model = model.name(), "requesting AI analysis");
        let completion = model.complete(&prompts::analysis_prompt(request)).await?;
        self.analysis_normalizer.normalize(&request.query, &completion)
    }

    async fn try_ai_generation(
        &self,
        request: &TextToSqlRequest,
    ) -> std::result::Result<TextToSqlResponse, AiFailure> {
        let model = self.model.as_ref().ok_or(AiFailure::Disabled)?;
        debug!(model = model.name(), "requesting AI sql generation");
        let completion = model.complete(&prompts::generation_prompt(request)).await?;
        self.generation_normalizer.normalize(&completion)
    }
}

fn log_fallback(operation: &str, failure: &AiFailure) {
    match failure {
        AiFailure::Disabled => debug!(operation, "AI path not configured, using heuristics"),
        _ => warn!(
            operation,
            reason = failure.kind(),
            error = %failure,
            "AI path failed, falling back to heuristics"
        ),
    }
}
