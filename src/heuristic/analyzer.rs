//! Heuristic Analyzer
//!
//! Rule-based stand-in for a real planner. Everything is lexical: the query is
//! lowercased once and probed for a handful of substrings. The plan it emits is
//! a label, not an estimate.

use crate::models::{AnalysisResult, Impact, PlanNode, Suggestion};

const EXPLICIT_COLUMNS: &str = "id, name, email";

const GENERIC_EXPLANATION: &str = "The query uses a Sequential Scan which is slow on large datasets. \
Optimization suggests targeting specific columns and adding indexes.";

/// Lexical features the rules look at.
#[derive(Debug, Clone, Copy)]
struct QueryTraits {
    select_star: bool,
    has_where: bool,
    has_limit: bool,
    leading_wildcard_like: bool,
    mentions_users: bool,
}

impl QueryTraits {
    fn scan(query: &str) -> Self {
        let lower = query.to_lowercase();
        Self {
            select_star: lower.contains("select *"),
            has_where: lower.contains("where"),
            has_limit: lower.contains("limit"),
            leading_wildcard_like: lower.contains("like '%"),
            mentions_users: lower.contains("users"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, query: &str) -> AnalysisResult {
        let traits = QueryTraits::scan(query);

        let optimized_query = if traits.select_star {
            query.replace('*', EXPLICIT_COLUMNS)
        } else {
            query.to_string()
        };

        AnalysisResult::new(
            query,
            synthesize_plan(&traits),
            suggest(&traits),
            Some(optimized_query),
            GENERIC_EXPLANATION,
        )
    }
}

fn synthesize_plan(traits: &QueryTraits) -> PlanNode {
    let node_type = if !traits.has_where || traits.select_star {
        "Seq Scan"
    } else {
        "Index Scan"
    };
    let (cost, rows) = if traits.select_star { (1250.0, 10000) } else { (45.0, 50) };
    let relation = if traits.mentions_users { "users" } else { "unknown_table" };

    PlanNode::new(node_type, cost, rows, Some(relation.to_string()))
}

/// Rules fire independently, in this order. An empty result is filled in by
/// `AnalysisResult::new` with the low-impact default.
fn suggest(traits: &QueryTraits) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if traits.select_star {
        suggestions.push(
            Suggestion::new(
                "Avoid SELECT *",
                "Selecting all columns causes unnecessary I/O overhead. Specify only the columns you need.",
                Impact::High,
            )
            .with_snippet("SELECT id, name, email FROM ..."),
        );
    }

    if !traits.has_where && !traits.has_limit {
        suggestions.push(
            Suggestion::new(
                "Unbounded Query",
                "Querying without WHERE or LIMIT can retrieve the entire table, causing performance issues.",
                Impact::High,
            )
            .with_snippet("LIMIT 100"),
        );
    }

    if traits.leading_wildcard_like {
        suggestions.push(
            Suggestion::new(
                "Inefficient Wildcard",
                "Leading wildcards (e.g. LIKE '%term') prevent index usage. Consider Full Text Search.",
                Impact::Medium,
            )
            .with_snippet("to_tsvector(...)"),
        );
    }

    suggestions
}
