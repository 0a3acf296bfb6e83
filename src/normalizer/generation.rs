//! Generation normalizer
//!
//! Models are asked to answer with `SQL:` and `Explanation:` sections, but the
//! layout they actually return varies. A single forward pass over the lines
//! drives a three-state machine that accumulates each section into a buffer.

use crate::error::AiFailure;
use crate::models::TextToSqlResponse;

const SQL_MARKER: &str = "sql:";
const EXPLANATION_MARKER: &str = "explanation:";
const BARE_SQL_EXPLANATION: &str = "Generated based on your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Sql,
    Explanation,
}

/// What a single line means to the scanner.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Opens a section; carries the text after the colon.
    Marker(Section, &'a str),
    Body(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    let lower = trimmed.to_lowercase();
    let marker = if lower.starts_with(SQL_MARKER) {
        Some(Section::Sql)
    } else if lower.starts_with(EXPLANATION_MARKER) {
        Some(Section::Explanation)
    } else {
        None
    };

    match marker {
        // Both markers are ASCII, so the first ':' closes the marker.
        Some(section) => {
            let rest = trimmed.split_once(':').map(|(_, rest)| rest).unwrap_or("");
            Line::Marker(section, rest.trim())
        }
        None => Line::Body(line),
    }
}

#[derive(Debug)]
struct SectionScanner<'a> {
    state: Section,
    saw_sql_marker: bool,
    sql: Vec<&'a str>,
    explanation: Vec<&'a str>,
}

impl<'a> SectionScanner<'a> {
    fn new() -> Self {
        Self {
            state: Section::None,
            saw_sql_marker: false,
            sql: Vec::new(),
            explanation: Vec::new(),
        }
    }

    fn feed(&mut self, line: &'a str) {
        match classify(line) {
            Line::Marker(section, rest) => {
                self.state = section;
                if section == Section::Sql {
                    self.saw_sql_marker = true;
                }
                self.push(rest);
            }
            Line::Body(text) => self.push(text),
        }
    }

    fn push(&mut self, text: &'a str) {
        match self.state {
            Section::Sql => self.sql.push(text),
            Section::Explanation => self.explanation.push(text),
            Section::None => {}
        }
    }
}

fn clean_sql(sql: &str) -> String {
    sql.replace("```sql", "").replace("```", "").trim().to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GenerationNormalizer;

impl GenerationNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, completion: &str) -> Result<TextToSqlResponse, AiFailure> {
        let text = completion.trim();

        let mut scanner = SectionScanner::new();
        for line in text.lines() {
            scanner.feed(line);
        }

        let (sql, explanation) = if scanner.saw_sql_marker {
            (scanner.sql.join(" "), scanner.explanation.join(" "))
        } else if text.to_lowercase().contains("select") {
            (text.to_string(), BARE_SQL_EXPLANATION.to_string())
        } else {
            return Err(AiFailure::Normalization(
                "no SQL section and no SELECT in completion".to_string(),
            ));
        };

        let query = clean_sql(&sql);
        if query.is_empty() {
            return Err(AiFailure::Normalization("completion produced an empty query".to_string()));
        }

        Ok(TextToSqlResponse {
            query,
            explanation: explanation.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_transitions() {
        assert_eq!(classify("  SQL: SELECT 1"), Line::Marker(Section::Sql, "SELECT 1"));
        assert_eq!(
            classify("explanation:counts rows"),
            Line::Marker(Section::Explanation, "counts rows")
        );
        assert_eq!(classify("Sql:"), Line::Marker(Section::Sql, ""));
        assert_eq!(classify("FROM users"), Line::Body("FROM users"));
        // marker must lead the line
        assert_eq!(classify("the sql: below"), Line::Body("the sql: below"));
    }

    #[test]
    fn test_scanner_ignores_preamble() {
        let mut scanner = SectionScanner::new();
        scanner.feed("Here is your answer.");
        assert_eq!(scanner.state, Section::None);
        scanner.feed("SQL: SELECT 1");
        assert_eq!(scanner.state, Section::Sql);
        scanner.feed("Explanation: trivial");
        assert_eq!(scanner.state, Section::Explanation);
        assert_eq!(scanner.sql, vec!["SELECT 1"]);
        assert_eq!(scanner.explanation, vec!["trivial"]);
    }

    #[test]
    fn test_sections_on_one_line_each() {
        let response = GenerationNormalizer::new()
            .normalize("SQL: SELECT id FROM users;\nExplanation: Lists user ids.")
            .unwrap();
        assert_eq!(response.query, "SELECT id FROM users;");
        assert_eq!(response.explanation, "Lists user ids.");
    }

    #[test]
    fn test_multiline_sections_join_with_spaces() {
        let completion = "Sure!\nSQL:\nSELECT name\nFROM users\nWHERE active = true;\n\nExplanation:\nFilters to\nactive users.";
        let response = GenerationNormalizer::new().normalize(completion).unwrap();
        assert_eq!(response.query, "SELECT name FROM users WHERE active = true;");
        assert_eq!(response.explanation, "Filters to active users.");
    }

    #[test]
    fn test_code_fences_are_stripped() {
        let completion = "SQL: ```sql\nSELECT COUNT(*) FROM orders;\n```\nExplanation: Counts orders.";
        let response = GenerationNormalizer::new().normalize(completion).unwrap();
        assert_eq!(response.query, "SELECT COUNT(*) FROM orders;");
        assert_eq!(response.explanation, "Counts orders.");
    }

    #[test]
    fn test_bare_select_is_taken_whole() {
        let completion = "  select id from users where active = true  ";
        let response = GenerationNormalizer::new().normalize(completion).unwrap();
        assert_eq!(response.query, "select id from users where active = true");
        assert_eq!(response.explanation, "Generated based on your question.");
    }

    #[test]
    fn test_explanation_without_sql_marker_uses_bare_text() {
        let completion = "Explanation: this will select everything\nSELECT * FROM t";
        let response = GenerationNormalizer::new().normalize(completion).unwrap();
        assert_eq!(response.query, "Explanation: this will select everything\nSELECT * FROM t");
        assert_eq!(response.explanation, "Generated based on your question.");
    }

    #[test]
    fn test_no_sql_is_failure() {
        let normalizer = GenerationNormalizer::new();
        assert!(matches!(
            normalizer.normalize("I cannot answer that."),
            Err(AiFailure::Normalization(_))
        ));
        assert!(normalizer.normalize("").is_err());
    }

    #[test]
    fn test_empty_sql_section_is_failure() {
        let normalizer = GenerationNormalizer::new();
        assert!(normalizer.normalize("SQL:\nExplanation: nothing to do").is_err());
        assert!(normalizer.normalize("SQL: ```sql\n```").is_err());
    }

    #[test]
    fn test_repeated_markers_accumulate() {
        let completion = "SQL: SELECT 1;\nExplanation: first\nSQL: SELECT 2;";
        let response = GenerationNormalizer::new().normalize(completion).unwrap();
        assert_eq!(response.query, "SELECT 1; SELECT 2;");
        assert_eq!(response.explanation, "first");
    }
}
