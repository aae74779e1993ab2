//! Query execution tool.
//!
//! This module implements the `query` MCP tool for executing SELECT
//! statements. Anything that is not a SELECT is rejected by the read-only
//! guard before touching the database.

use crate::db::{ConnectionManager, QueryExecutor};
use crate::error::NlqResult;
use crate::models::{ColumnMetadata, QueryRequest, QueryResult};
use crate::tools::format::{OutputFormat, format_as_markdown, format_as_table};
use crate::tools::guard;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// SQL SELECT statement to execute. Anything else is rejected.
    pub sql: String,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Query timeout in seconds. Default: 30
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    /// Output format: "json" returns structured data, "table" returns ASCII table, "markdown" returns markdown table
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output from the query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    /// Column metadata (name, type). Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnMetadata>,
    /// Result rows as column-name -> stringified-value maps. Empty if format is table/markdown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Pre-formatted output when format is table or markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// True if the result was truncated by the row limit
    pub truncated: bool,
    /// Number of rows returned
    pub row_count: usize,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryOutput {
    /// Create output from a query result with the requested format.
    pub fn from_result(result: QueryResult, format: OutputFormat) -> Self {
        let row_count = result.rows.len();
        let truncated = result.truncated;
        let execution_time_ms = result.execution_time_ms;

        match format {
            OutputFormat::Json => Self {
                columns: result.columns,
                rows: result.rows,
                formatted: None,
                truncated,
                row_count,
                execution_time_ms,
            },
            OutputFormat::Table => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format_as_table(
                    &result.columns,
                    &result.rows,
                    row_count,
                    execution_time_ms,
                )),
                truncated,
                row_count,
                execution_time_ms,
            },
            OutputFormat::Markdown => Self {
                columns: Vec::new(),
                rows: Vec::new(),
                formatted: Some(format_as_markdown(&result.columns, &result.rows, row_count)),
                truncated,
                row_count,
                execution_time_ms,
            },
        }
    }
}

/// Handler for the query tool.
pub struct QueryToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl QueryToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Execute a read-only query.
    pub async fn query(&self, input: QueryInput) -> NlqResult<QueryOutput> {
        let pool = self.connection_manager.get_pool(&input.connection_id).await?;

        guard::ensure_select(&input.sql, pool.db_type())?;

        let mut request = QueryRequest::new(&input.connection_id, input.sql.trim());
        request.limit = input.limit;
        request.timeout_secs = input.timeout_secs;

        let result = QueryExecutor::new().execute_query(&pool, &request).await?;

        info!(
            connection_id = %input.connection_id,
            rows = result.rows.len(),
            truncated = result.truncated,
            elapsed_ms = result.execution_time_ms,
            "Query executed"
        );

        Ok(QueryOutput::from_result(result, input.format))
    }
}
