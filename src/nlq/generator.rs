//! Query generation.
//!
//! Two interchangeable strategies produce a candidate SELECT statement from
//! a question: a remote completion-service strategy (best effort, may fail)
//! and a deterministic pattern strategy (total, always succeeds). Remote
//! failures of any kind are absorbed here and redirected to the pattern
//! fallback; the caller only ever learns which strategy won via the
//! `method` field.

use crate::error::NlqResult;
use crate::models::{DatabaseSchema, Documentation};
use crate::nlq::completion::CompletionClient;
use crate::nlq::context::render_schema_context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Emitted as the quoted target when the schema has no tables. A defined
/// degenerate output rather than an error; the executor boundary will
/// reject the statement when it runs against a real database.
pub const MISSING_TABLE_PLACEHOLDER: &str = "unknown_table";

/// Strategy that produced a generated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    /// Remote completion service
    Ai,
    /// Deterministic keyword fallback
    Pattern,
}

impl std::fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ai => write!(f, "ai"),
            Self::Pattern => write!(f, "pattern"),
        }
    }
}

/// A generated query and the strategy that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuery {
    pub query: String,
    pub method: GenerationMethod,
}

/// Generate a candidate SELECT statement for a question.
///
/// Tries the remote strategy when a client is available, falling back to
/// the pattern strategy on any failure. This function itself never fails.
pub async fn generate_query(
    question: &str,
    schema: &DatabaseSchema,
    documentation: &Documentation,
    completion: Option<&CompletionClient>,
) -> GeneratedQuery {
    if let Some(client) = completion {
        match remote_query(client, question, schema, documentation).await {
            Ok(query) => {
                debug!(model = client.model(), "Generated query via completion service");
                return GeneratedQuery {
                    query,
                    method: GenerationMethod::Ai,
                };
            }
            Err(err) => {
                warn!(error = %err, "Remote generation failed, using pattern fallback");
            }
        }
    }

    GeneratedQuery {
        query: pattern_query(question, schema),
        method: GenerationMethod::Pattern,
    }
}

/// Remote strategy: prompt the completion service with the rendered schema
/// context and the question.
async fn remote_query(
    client: &CompletionClient,
    question: &str,
    schema: &DatabaseSchema,
    documentation: &Documentation,
) -> NlqResult<String> {
    let context = render_schema_context(schema, documentation);
    let prompt = build_prompt(&context, question);
    let raw = client.complete(&prompt).await?;
    let query = strip_code_fences(&raw);
    if query.is_empty() {
        return Err(crate::error::NlqError::completion(
            "Completion service returned an empty query",
        ));
    }
    Ok(query)
}

/// Build the instructional prompt for the completion service.
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a SQL query generator. Given the following database schema and a natural language question, generate a valid SQL SELECT query.\n\
        \n\
        DATABASE SCHEMA:\n\
        {context}\n\
        \n\
        USER QUESTION: {question}\n\
        \n\
        IMPORTANT RULES:\n\
        1. Only generate SELECT queries\n\
        2. Use proper SQL syntax\n\
        3. Return ONLY the SQL query, no explanations\n\
        4. If the question cannot be answered with the schema, return a query that gets the closest relevant data\n\
        \n\
        SQL QUERY:"
    )
}

/// Strip markdown code-fence decoration from a completion response.
fn strip_code_fences(text: &str) -> String {
    text.replace("```sql", "").replace("```", "").trim().to_string()
}

/// Pattern strategy: deterministic, keyword-driven translation. Total
/// function; identical (question, schema) inputs always yield identical
/// SQL text.
pub fn pattern_query(question: &str, schema: &DatabaseSchema) -> String {
    let question_lower = question.to_lowercase();

    // First table (in schema order) whose name appears in the question wins;
    // otherwise the first table; otherwise the placeholder.
    let target = schema
        .tables
        .iter()
        .find(|t| question_lower.contains(&t.name.to_lowercase()))
        .or_else(|| schema.tables.first());
    let table = target
        .map(|t| t.name.as_str())
        .unwrap_or(MISSING_TABLE_PLACEHOLDER);

    const COUNT_KEYWORDS: &[&str] = &["count", "how many", "total"];
    const LIST_KEYWORDS: &[&str] = &["all", "show", "list", "get"];

    if COUNT_KEYWORDS.iter().any(|kw| question_lower.contains(kw)) {
        return format!("SELECT COUNT(*) FROM \"{}\"", table);
    }

    if LIST_KEYWORDS.iter().any(|kw| question_lower.contains(kw)) {
        return format!("SELECT * FROM \"{}\" LIMIT 100", table);
    }

    if question_lower.contains("average") || question_lower.contains("avg") {
        if let Some(column) = target.and_then(|t| t.first_numeric_column()) {
            return format!("SELECT AVG(\"{}\") FROM \"{}\"", column.name, table);
        }
        // No numeric column: fall through to the default
    }

    format!("SELECT * FROM \"{}\" LIMIT 10", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnInfo, TableSchema};

    fn schema_with(tables: &[&str]) -> DatabaseSchema {
        tables.iter().fold(DatabaseSchema::new(), |schema, name| {
            schema.with_table(
                TableSchema::new(*name)
                    .with_column(ColumnInfo::new("id", "INTEGER", false).with_primary_key(true))
                    .with_column(ColumnInfo::new("name", "TEXT", true)),
            )
        })
    }

    #[test]
    fn test_count_intent() {
        let schema = schema_with(&["users"]);
        assert_eq!(
            pattern_query("How many users are there?", &schema),
            r#"SELECT COUNT(*) FROM "users""#
        );
    }

    #[test]
    fn test_total_keyword_hits_count_branch() {
        // "total" is in the count keyword set; this is intentional legacy
        // behavior, not a SUM mapping.
        let schema = schema_with(&["sales"]);
        assert_eq!(
            pattern_query("What were total sales last month?", &schema),
            r#"SELECT COUNT(*) FROM "sales""#
        );
    }

    #[test]
    fn test_list_intent() {
        let schema = schema_with(&["orders"]);
        assert_eq!(
            pattern_query("Show me all orders", &schema),
            r#"SELECT * FROM "orders" LIMIT 100"#
        );
    }

    #[test]
    fn test_average_intent_picks_first_numeric_column() {
        let schema = DatabaseSchema::new().with_table(
            TableSchema::new("products")
                .with_column(ColumnInfo::new("name", "TEXT", false))
                .with_column(ColumnInfo::new("price", "FLOAT", true))
                .with_column(ColumnInfo::new("stock", "INTEGER", true)),
        );
        assert_eq!(
            pattern_query("What is the average price of products?", &schema),
            r#"SELECT AVG("price") FROM "products""#
        );
    }

    #[test]
    fn test_average_without_numeric_column_falls_through() {
        let schema = DatabaseSchema::new().with_table(
            TableSchema::new("notes").with_column(ColumnInfo::new("body", "TEXT", true)),
        );
        assert_eq!(
            pattern_query("What is the average note?", &schema),
            r#"SELECT * FROM "notes" LIMIT 10"#
        );
    }

    #[test]
    fn test_table_resolution_prefers_mentioned_table() {
        let schema = schema_with(&["users", "orders"]);
        assert_eq!(
            pattern_query("How many orders do we have?", &schema),
            r#"SELECT COUNT(*) FROM "orders""#
        );
    }

    #[test]
    fn test_table_resolution_defaults_to_first_table() {
        let schema = schema_with(&["users", "orders"]);
        assert_eq!(
            pattern_query("What happened yesterday?", &schema),
            r#"SELECT * FROM "users" LIMIT 10"#
        );
    }

    #[test]
    fn test_empty_schema_uses_placeholder() {
        let schema = DatabaseSchema::new();
        assert_eq!(
            pattern_query("Show me everything", &schema),
            format!(r#"SELECT * FROM "{}" LIMIT 100"#, MISSING_TABLE_PLACEHOLDER)
        );
    }

    #[test]
    fn test_pattern_generation_is_deterministic() {
        let schema = schema_with(&["users", "orders"]);
        let question = "How many orders were placed?";
        assert_eq!(
            pattern_query(question, &schema),
            pattern_query(question, &schema)
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT * FROM users\n```"),
            "SELECT * FROM users"
        );
        assert_eq!(strip_code_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("  \n```sql```  "), "");
    }

    #[test]
    fn test_prompt_embeds_context_and_question() {
        let prompt = build_prompt("TABLE: users", "How many users?");
        assert!(prompt.contains("TABLE: users"));
        assert!(prompt.contains("USER QUESTION: How many users?"));
        assert!(prompt.contains("Only generate SELECT queries"));
    }

    #[tokio::test]
    async fn test_generate_without_client_uses_pattern() {
        let schema = schema_with(&["users"]);
        let result = generate_query(
            "How many users are there?",
            &schema,
            &Documentation::new(),
            None,
        )
        .await;
        assert_eq!(result.method, GenerationMethod::Pattern);
        assert_eq!(result.query, r#"SELECT COUNT(*) FROM "users""#);
    }

    #[tokio::test]
    async fn test_generate_falls_back_when_remote_fails() {
        use crate::nlq::completion::{CompletionClient, CompletionConfig};

        // Unreachable endpoint: the failure must be absorbed, not surfaced.
        let client = CompletionClient::new(CompletionConfig {
            api_base: "http://localhost:9/v1/chat/completions".to_string(),
            api_key: "key".to_string(),
            model: "model".to_string(),
        })
        .unwrap();

        let schema = schema_with(&["orders"]);
        let result = generate_query(
            "Show me all orders",
            &schema,
            &Documentation::new(),
            Some(&client),
        )
        .await;
        assert_eq!(result.method, GenerationMethod::Pattern);
        assert_eq!(result.query, r#"SELECT * FROM "orders" LIMIT 100"#);
    }
}
