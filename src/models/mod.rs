//! Data models for the NLQ MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod docs;
pub mod query;
pub mod schema;
pub mod snapshot;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, ConnectionInfo, DatabaseType};
pub use docs::{Documentation, TableDoc};
pub use query::{
    ColumnMetadata, DEFAULT_ROW_LIMIT, DEFAULT_QUERY_TIMEOUT_SECS, MAX_QUERY_TIMEOUT_SECS,
    MAX_ROW_LIMIT, QueryRequest, QueryResult,
};
pub use schema::{ColumnInfo, DatabaseSchema, ForeignKeyInfo, SampleRow, TableSchema};
pub use snapshot::SchemaSnapshot;
