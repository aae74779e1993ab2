//! Query-related data models.
//!
//! This module defines types for SQL query requests and results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit for query results.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Maximum allowed row limit.
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 30;

/// Maximum query timeout in seconds.
pub const MAX_QUERY_TIMEOUT_SECS: u32 = 300;

/// A read-only query to execute against a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub connection_id: String,
    pub sql: String,
    /// Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Default: 30, max: 300
    #[serde(default)]
    pub timeout_secs: Option<u32>,
}

impl QueryRequest {
    /// Create a new query request with default options.
    pub fn new(connection_id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            sql: sql.into(),
            limit: None,
            timeout_secs: None,
        }
    }

    /// Set the row limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the query timeout.
    pub fn with_timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Effective row limit, clamped to [1, MAX_ROW_LIMIT].
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .map(|l| l.clamp(1, MAX_ROW_LIMIT))
            .unwrap_or(DEFAULT_ROW_LIMIT)
    }

    /// Effective timeout in seconds, clamped to [1, MAX_QUERY_TIMEOUT_SECS].
    pub fn effective_timeout_secs(&self) -> u32 {
        self.timeout_secs
            .map(|t| t.clamp(1, MAX_QUERY_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS)
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_name: String,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The result of executing a read-only query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    /// Rows as column-name -> stringified-value-or-null maps.
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub truncated: bool,
    pub execution_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_defaults_and_clamps() {
        assert_eq!(QueryRequest::new("db", "SELECT 1").effective_limit(), DEFAULT_ROW_LIMIT);
        assert_eq!(
            QueryRequest::new("db", "SELECT 1").with_limit(0).effective_limit(),
            1
        );
        assert_eq!(
            QueryRequest::new("db", "SELECT 1")
                .with_limit(99999)
                .effective_limit(),
            MAX_ROW_LIMIT
        );
    }

    #[test]
    fn test_effective_timeout_defaults_and_clamps() {
        assert_eq!(
            QueryRequest::new("db", "SELECT 1").effective_timeout_secs(),
            DEFAULT_QUERY_TIMEOUT_SECS
        );
        assert_eq!(
            QueryRequest::new("db", "SELECT 1")
                .with_timeout(9999)
                .effective_timeout_secs(),
            MAX_QUERY_TIMEOUT_SECS
        );
    }
}
