//! Analysis normalizer
//!
//! Decodes a model completion that should hold a JSON object into an
//! [`AnalysisResult`]. Optional fields and their defaults are declared once on
//! the wire structs below; anything that fails to decode is a
//! normalization failure and the caller falls back to the heuristic path.

use crate::error::AiFailure;
use crate::models::{AnalysisResult, Impact, PlanNode, Suggestion};
use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    execution_plan_summary: PlanSummary,

    #[serde(default)]
    suggestions: Vec<SuggestionPayload>,

    /// Outer `None` = key missing, `Some(None)` = explicit null.
    #[serde(default, deserialize_with = "present")]
    optimized_query: Option<Option<String>>,

    #[serde(default = "default_explanation")]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct PlanSummary {
    #[serde(default = "default_node_type")]
    node_type: String,

    #[serde(default = "default_cost", deserialize_with = "lenient_cost")]
    cost: f64,

    #[serde(default, deserialize_with = "lenient_rows")]
    rows: u64,

    #[serde(default = "default_relation_name")]
    relation_name: Option<String>,
}

impl Default for PlanSummary {
    fn default() -> Self {
        Self {
            node_type: default_node_type(),
            cost: default_cost(),
            rows: 0,
            relation_name: default_relation_name(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionPayload {
    #[serde(default = "default_title")]
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default, deserialize_with = "lenient_impact")]
    impact: Impact,

    #[serde(default)]
    sql_snippet: Option<String>,
}

fn default_node_type() -> String {
    "Unknown Scan".to_string()
}

fn default_cost() -> f64 {
    100.0
}

fn default_relation_name() -> Option<String> {
    Some("unknown".to_string())
}

fn default_title() -> String {
    "Optimization Tip".to_string()
}

fn default_explanation() -> String {
    "Analysis complete.".to_string()
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Models emit numbers as JSON numbers or as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn lenient_cost<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Numeric::deserialize(deserializer)?;
    match raw.to_f64() {
        Some(cost) if cost.is_finite() && cost >= 0.0 => Ok(cost),
        _ => Err(de::Error::custom("cost must be a non-negative number")),
    }
}

/// Fractional JSON numbers are truncated; strings must hold a whole number.
fn lenient_rows<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = match Numeric::deserialize(deserializer)? {
        Numeric::Number(rows) if rows.is_finite() && rows >= 0.0 => Some(rows.trunc() as u64),
        Numeric::Number(_) => None,
        Numeric::Text(text) => text.trim().parse::<u64>().ok(),
    };
    rows.ok_or_else(|| de::Error::custom("rows must be a non-negative integer"))
}

fn lenient_impact<'de, D>(deserializer: D) -> Result<Impact, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    Ok(Impact::from_label(&label))
}

/// Strips surrounding whitespace and the literal ```` ```json ```` / ```` ``` ```` fences.
fn strip_fences(completion: &str) -> &str {
    let text = completion.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisNormalizer;

impl AnalysisNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, query: &str, completion: &str) -> Result<AnalysisResult, AiFailure> {
        let value: serde_json::Value = serde_json::from_str(strip_fences(completion))
            .map_err(|e| AiFailure::Normalization(format!("invalid analysis JSON: {}", e)))?;
        if !value.is_object() {
            return Err(AiFailure::Normalization(
                "analysis response is not a JSON object".to_string(),
            ));
        }
        let payload: AnalysisPayload = serde_json::from_value(value)
            .map_err(|e| AiFailure::Normalization(format!("unexpected analysis shape: {}", e)))?;

        let plan = payload.execution_plan_summary;
        let execution_plan = PlanNode::new(plan.node_type, plan.cost, plan.rows, plan.relation_name);

        let suggestions = payload
            .suggestions
            .into_iter()
            .map(|s| Suggestion {
                title: s.title,
                description: s.description,
                impact: s.impact,
                sql_snippet: s.sql_snippet,
            })
            .collect();

        let optimized_query = payload
            .optimized_query
            .unwrap_or_else(|| Some(query.to_string()));

        Ok(AnalysisResult::new(
            query,
            execution_plan,
            suggestions,
            optimized_query,
            payload.explanation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "execution_plan_summary": {
            "node_type": "Bitmap Heap Scan",
            "cost": 321.5,
            "rows": 42,
            "relation_name": "orders"
        },
        "suggestions": [
            {
                "title": "Add index on customer_id",
                "description": "Filtering on an unindexed column forces a full scan.",
                "impact": "High",
                "sql_snippet": "CREATE INDEX idx_orders_customer ON orders(customer_id);"
            },
            {
                "title": "Drop ORDER BY",
                "description": "Ordering is not needed by the caller.",
                "impact": "Low"
            }
        ],
        "optimized_query": "SELECT id FROM orders WHERE customer_id = 7",
        "explanation": "Index the filter column."
    }"#;

    const QUERY: &str = "SELECT * FROM orders WHERE customer_id = 7 ORDER BY id";

    #[test]
    fn test_full_response_recovers_every_field() {
        let result = AnalysisNormalizer::new().normalize(QUERY, FULL_RESPONSE).unwrap();

        assert_eq!(result.original_query, QUERY);
        assert_eq!(
            result.execution_plan,
            PlanNode::new("Bitmap Heap Scan", 321.5, 42, Some("orders".to_string()))
        );
        assert_eq!(result.suggestions.len(), 2);
        assert_eq!(result.suggestions[0].title, "Add index on customer_id");
        assert_eq!(result.suggestions[0].impact, Impact::High);
        assert_eq!(
            result.suggestions[0].sql_snippet.as_deref(),
            Some("CREATE INDEX idx_orders_customer ON orders(customer_id);")
        );
        assert_eq!(result.suggestions[1].title, "Drop ORDER BY");
        assert_eq!(result.suggestions[1].impact, Impact::Low);
        assert!(result.suggestions[1].sql_snippet.is_none());
        assert_eq!(
            result.optimized_query.as_deref(),
            Some("SELECT id FROM orders WHERE customer_id = 7")
        );
        assert_eq!(result.explanation, "Index the filter column.");
    }

    #[test]
    fn test_fenced_response_matches_bare_response() {
        let normalizer = AnalysisNormalizer::new();
        let fenced = format!("\n  ```json\n{}\n```  \n", FULL_RESPONSE);
        assert_eq!(
            normalizer.normalize(QUERY, &fenced).unwrap(),
            normalizer.normalize(QUERY, FULL_RESPONSE).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let result = AnalysisNormalizer::new()
            .normalize(QUERY, r#"{"suggestions": [{}]}"#)
            .unwrap();

        assert_eq!(
            result.execution_plan,
            PlanNode::new("Unknown Scan", 100.0, 0, Some("unknown".to_string()))
        );
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].title, "Optimization Tip");
        assert_eq!(result.suggestions[0].description, "");
        assert_eq!(result.suggestions[0].impact, Impact::Medium);
        assert!(result.suggestions[0].sql_snippet.is_none());
        assert_eq!(result.optimized_query.as_deref(), Some(QUERY));
        assert_eq!(result.explanation, "Analysis complete.");
    }

    #[test]
    fn test_empty_object_still_has_a_suggestion() {
        let result = AnalysisNormalizer::new().normalize(QUERY, "{}").unwrap();
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].title, "Query looks efficient");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let result = AnalysisNormalizer::new()
            .normalize(
                QUERY,
                r#"{"execution_plan_summary": {"cost": "12.5", "rows": 7.9}}"#,
            )
            .unwrap();
        assert_eq!(result.execution_plan.cost, 12.5);
        assert_eq!(result.execution_plan.rows, 7);

        let result = AnalysisNormalizer::new()
            .normalize(QUERY, r#"{"execution_plan_summary": {"rows": " 42 "}}"#)
            .unwrap();
        assert_eq!(result.execution_plan.rows, 42);
    }

    #[test]
    fn test_bad_numbers_are_failures() {
        let normalizer = AnalysisNormalizer::new();
        for body in [
            r#"{"execution_plan_summary": {"cost": "cheap"}}"#,
            r#"{"execution_plan_summary": {"rows": -3}}"#,
            r#"{"execution_plan_summary": {"rows": "7.9"}}"#,
            r#"{"execution_plan_summary": {"rows": "-3"}}"#,
            r#"{"execution_plan_summary": {"cost": null}}"#,
        ] {
            assert!(
                matches!(normalizer.normalize(QUERY, body), Err(AiFailure::Normalization(_))),
                "accepted {}",
                body
            );
        }
    }

    #[test]
    fn test_invalid_json_is_failure() {
        let normalizer = AnalysisNormalizer::new();
        for body in ["", "Sure! Here is the analysis:", "{\"suggestions\": [", "[1, 2, 3]"] {
            assert!(matches!(
                normalizer.normalize(QUERY, body),
                Err(AiFailure::Normalization(_))
            ));
        }
    }

    #[test]
    fn test_null_optional_fields() {
        let result = AnalysisNormalizer::new()
            .normalize(
                QUERY,
                r#"{"execution_plan_summary": {"relation_name": null}, "optimized_query": null}"#,
            )
            .unwrap();
        assert!(result.execution_plan.relation_name.is_none());
        assert!(result.optimized_query.is_none());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let result = AnalysisNormalizer::new()
            .normalize(QUERY, r#"{"confidence": 0.9, "explanation": "fine", "notes": []}"#)
            .unwrap();
        assert_eq!(result.explanation, "fine");
    }
}
