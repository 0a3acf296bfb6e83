//! Prompts for the AI path
//!
//! The analysis prompt asks for a JSON object matching what
//! [`crate::normalizer::AnalysisNormalizer`] decodes; the generation prompt asks
//! for the `SQL:` / `Explanation:` layout that
//! [`crate::normalizer::GenerationNormalizer`] scans for.

use crate::models::{AnalyzeRequest, TextToSqlRequest};

const ANALYSIS_RESPONSE_FORMAT: &str = r#"{
    "execution_plan_summary": {
        "node_type": "Primary operation (e.g., Seq Scan, Index Scan)",
        "cost": 123.45 (estimated float),
        "rows": 100 (estimated integer),
        "relation_name": "Table name involved"
    },
    "suggestions": [
        {
            "title": "Short title of the problem",
            "description": "Detailed explanation of why this is inefficient",
            "impact": "High/Medium/Low",
            "sql_snippet": "Optimized SQL snippet or command"
        }
    ],
    "optimized_query": "The fully rewritten optimized SQL query",
    "explanation": "A concise summary of why the query was slow and how the changes improve it."
}"#;

pub fn analysis_prompt(request: &AnalyzeRequest) -> String {
    let schema_section = match request.schema_context.as_deref().map(str::trim) {
        Some(schema) if !schema.is_empty() => format!("\nSchema context:\n{}\n", schema),
        _ => String::new(),
    };

    format!(
        r#"You are an expert PostgreSQL Database Administrator. Analyze the following SQL query for performance issues.

Query: {}
{}
Provide your analysis in the following JSON format ONLY:
{}

Do not include markdown backticks around the JSON. Just return the raw JSON string."#,
        request.query, schema_section, ANALYSIS_RESPONSE_FORMAT
    )
}

pub fn generation_prompt(request: &TextToSqlRequest) -> String {
    format!(
        r#"You are an expert SQL Generator.

Context (Database Schema):
{}

Question: {}

Task: Generate a valid SQL query to answer the question based on the schema.
Also provide a brief explanation of how the query works.

Output format provided as plain text logic, but structured as:
SQL: <the sql query>
Explanation: <the explanation>

Separate the SQL and explanation clearly."#,
        request.schema_def, request.question
    )
}
