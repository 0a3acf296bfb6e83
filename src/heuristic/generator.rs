//! Heuristic Generator
//!
//! Maps a natural-language question to one of a few canned queries by keyword.
//! Rules are checked in order and each match overwrites the previous choice,
//! so the last matching rule wins: a question mentioning both "sales" and
//! "analytics" gets the analytics query.

use crate::models::TextToSqlResponse;

struct CannedQuery {
    keywords: &'static [&'static str],
    sql: &'static str,
    explanation: &'static str,
}

const DEFAULT_QUERY: CannedQuery = CannedQuery {
    keywords: &[],
    sql: "SELECT * FROM users WHERE active = true;",
    explanation: "I analyzed the schema and identified the 'users' table. I filtered by 'active = true' based on your question.",
};

/// Checked in this order; later matches override earlier ones.
const RULES: &[CannedQuery] = &[
    CannedQuery {
        keywords: &["sales"],
        sql: "SELECT SUM(amount) FROM sales WHERE date > NOW() - INTERVAL '30 days';",
        explanation: "Aggregated sales amount for the last 30 days.",
    },
    CannedQuery {
        keywords: &["join", "orders"],
        // Interior trailing spaces are part of the output.
        sql: concat!(
            "\n",
            "SELECT u.name, COUNT(o.id) as order_count \n",
            "FROM users u \n",
            "JOIN orders o ON u.id = o.user_id \n",
            "GROUP BY u.name \n",
            "ORDER BY order_count DESC;",
        ),
        explanation: "Joined users and orders to count orders per user, sorting by highest count.",
    },
    CannedQuery {
        keywords: &["analytics", "performance"],
        sql: concat!(
            "\n",
            "WITH RegionStats AS (\n",
            "    SELECT \n",
            "        r.region_name,\n",
            "        p.category,\n",
            "        SUM(s.amount) as total_revenue,\n",
            "        AVG(s.latency_ms) as avg_latency\n",
            "    FROM server_logs s\n",
            "    JOIN regions r ON s.region_id = r.id\n",
            "    JOIN products p ON s.product_id = p.id\n",
            "    WHERE s.timestamp >= NOW() - INTERVAL '24 hours'\n",
            "    GROUP BY r.region_name, p.category\n",
            ")\n",
            "SELECT * FROM RegionStats \n",
            "WHERE total_revenue > 10000 \n",
            "ORDER BY avg_latency ASC;",
        ),
        explanation: "Constructed a CTE 'RegionStats' to aggregate revenue and latency by region and category. Filtered for high-revenue regions and sorted by lowest latency for performance analysis.",
    },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicGenerator;

impl HeuristicGenerator {
    pub fn new() -> Self {
        Self
    }

    /// `_schema` is accepted for signature parity with the AI path but not consulted.
    pub fn generate(&self, _schema: &str, question: &str) -> TextToSqlResponse {
        let question = question.to_lowercase();

        let mut chosen = &DEFAULT_QUERY;
        for rule in RULES {
            if rule.keywords.iter().any(|kw| question.contains(kw)) {
                chosen = rule;
            }
        }

        TextToSqlResponse {
            query: chosen.sql.trim().to_string(),
            explanation: chosen.explanation.to_string(),
        }
    }
}
