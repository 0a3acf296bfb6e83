//! Request and response contracts
//!
//! Every path through the engine, AI-assisted or heuristic, produces exactly
//! these shapes. They are built once per request and never mutated afterwards.

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};

/// Analysis request: `{query, schema_context?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,

    #[serde(default)]
    pub schema_context: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            schema_context: None,
        }
    }

    pub fn with_schema_context(mut self, schema_context: impl Into<String>) -> Self {
        self.schema_context = Some(schema_context.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(OptimizerError::InvalidRequest("query must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Generation request: `{schema_def, question}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToSqlRequest {
    pub schema_def: String,
    pub question: String,
}

impl TextToSqlRequest {
    pub fn new(schema_def: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            schema_def: schema_def.into(),
            question: question.into(),
        }
    }

    /// The schema may be empty; the question may not.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(OptimizerError::InvalidRequest("question must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Synthetic or model-estimated execution step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    /// Operator label, e.g. "Seq Scan"
    pub node_type: String,

    /// Estimated relative cost (never negative)
    pub cost: f64,

    /// Estimated row count
    pub rows: u64,

    pub relation_name: Option<String>,

    /// Reserved for nested plans; always empty today
    #[serde(default)]
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(node_type: impl Into<String>, cost: f64, rows: u64, relation_name: Option<String>) -> Self {
        Self {
            node_type: node_type.into(),
            cost,
            rows,
            relation_name,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    #[default]
    Medium,
    Low,
}

impl Impact {
    /// Case-insensitive label lookup; anything unrecognised is `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Impact::High,
            "low" => Impact::Low,
            _ => Impact::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub sql_snippet: Option<String>,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, description: impl Into<String>, impact: Impact) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            impact,
            sql_snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.sql_snippet = Some(snippet.into());
        self
    }

    /// Appended when nothing else applies, so a report never has zero suggestions.
    pub fn looks_efficient() -> Self {
        Self::new(
            "Query looks efficient",
            "The execution plan uses indexes effectively. Consider caching if QPS is high.",
            Impact::Low,
        )
    }
}

/// Full analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub original_query: String,
    pub execution_plan: PlanNode,
    pub suggestions: Vec<Suggestion>,
    pub optimized_query: Option<String>,
    pub explanation: String,
}

impl AnalysisResult {
    /// Builds a report, appending the default suggestion if `suggestions` is empty.
    pub fn new(
        original_query: impl Into<String>,
        execution_plan: PlanNode,
        mut suggestions: Vec<Suggestion>,
        optimized_query: Option<String>,
        explanation: impl Into<String>,
    ) -> Self {
        if suggestions.is_empty() {
            suggestions.push(Suggestion::looks_efficient());
        }
        Self {
            original_query: original_query.into(),
            execution_plan,
            suggestions,
            optimized_query,
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextToSqlResponse {
    pub query: String,
    pub explanation: String,
}
