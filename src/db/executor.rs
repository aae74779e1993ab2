//! Read-only query execution engine.
//!
//! This module executes SELECT statements with row limits (enforced via
//! streaming - only limit + 1 rows are ever fetched) and timeouts, and
//! converts result rows into stringified JSON maps: every value becomes a
//! string or null, matching the sample-row representation used by
//! introspection.
//!
//! # Architecture
//!
//! Database-specific fetch and decode functions live in the `mysql`,
//! `postgres` and `sqlite` submodules; the code structure is intentionally
//! parallel to make differences obvious.

use crate::db::pool::DbPool;
use crate::error::{NlqError, NlqResult};
use crate::models::{ColumnMetadata, DatabaseType, QueryRequest, QueryResult};
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles read-only query execution.
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a SELECT query described by a request.
    pub async fn execute_query(
        &self,
        pool: &DbPool,
        request: &QueryRequest,
    ) -> NlqResult<QueryResult> {
        self.execute_sql(
            pool,
            &request.sql,
            request.effective_limit(),
            Duration::from_secs(request.effective_timeout_secs() as u64),
        )
        .await
    }

    /// Execute a SELECT statement directly.
    pub async fn execute_sql(
        &self,
        pool: &DbPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> NlqResult<QueryResult> {
        let start = Instant::now();

        debug!(
            sql = %sql,
            limit = row_limit,
            timeout_secs = query_timeout.as_secs(),
            "Executing query"
        );

        let (columns, rows) = match pool {
            DbPool::MySql(p) => {
                let raw = mysql::fetch_rows(p, sql, row_limit, query_timeout).await?;
                mysql::stringify_rows(&raw)
            }
            DbPool::Postgres(p) => {
                let raw = postgres::fetch_rows(p, sql, row_limit, query_timeout).await?;
                postgres::stringify_rows(&raw)
            }
            DbPool::SQLite(p) => {
                let raw = sqlite::fetch_rows(p, sql, row_limit, query_timeout).await?;
                sqlite::stringify_rows(&raw)
            }
        };

        let truncated = rows.len() > row_limit as usize;
        let rows: Vec<_> = rows.into_iter().take(row_limit as usize).collect();
        if truncated {
            warn!(limit = row_limit, "Query result truncated");
        }

        Ok(QueryResult {
            columns,
            rows,
            truncated,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Common helpers
// =============================================================================

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> NlqResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(NlqError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> NlqError {
    NlqError::timeout(operation, timeout.as_secs() as u32)
}

/// Logical category for database column types, used to pick a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Binary,
    Other,
}

/// Classify a database type name into a logical category.
fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC affinity is effectively a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower.contains("timestamp")
        || lower == "datetime"
        || lower == "date"
        || lower == "time"
        || lower == "timetz"
    {
        return TypeCategory::DateTime;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    TypeCategory::Other
}

/// Encode binary column data as base64 text.
fn encode_binary(bytes: &[u8]) -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    STANDARD.encode(bytes)
}

fn string_or_null(value: Option<String>) -> JsonValue {
    match value {
        Some(s) => JsonValue::String(s),
        None => JsonValue::Null,
    }
}

// =============================================================================
// Database-specific implementations
// =============================================================================

macro_rules! try_stringify {
    ($row:expr, $idx:expr, $ty:ty) => {
        if let Ok(v) = sqlx::Row::try_get::<Option<$ty>, _>($row, $idx) {
            return string_or_null(v.map(|v| v.to_string()));
        }
    };
}

pub(crate) mod mysql {
    use super::*;
    use crate::models::SampleRow;
    use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
    use sqlx::{Column, Decode, Row, Type, TypeInfo};

    /// Raw DECIMAL/NUMERIC values as strings, preserving the exact
    /// database representation.
    struct RawDecimal(String);

    impl Type<sqlx::MySql> for RawDecimal {
        fn type_info() -> MySqlTypeInfo {
            <String as Type<sqlx::MySql>>::type_info()
        }

        fn compatible(ty: &MySqlTypeInfo) -> bool {
            let name = ty.name().to_lowercase();
            name.contains("decimal") || name.contains("numeric")
        }
    }

    impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
        fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
            let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
            Ok(RawDecimal(s.to_string()))
        }
    }

    pub async fn fetch_rows(
        pool: &sqlx::MySqlPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> NlqResult<Vec<MySqlRow>> {
        use sqlx::Executor;
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub fn stringify_rows(rows: &[MySqlRow]) -> (Vec<ColumnMetadata>, Vec<SampleRow>) {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnMetadata::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let maps = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        (
                            col.name().to_string(),
                            decode_column(row, idx, col.type_info().name()),
                        )
                    })
                    .collect()
            })
            .collect();

        (columns, maps)
    }

    fn decode_column(row: &MySqlRow, idx: usize, type_name: &str) -> JsonValue {
        match categorize_type(type_name, DatabaseType::MySQL) {
            TypeCategory::Integer => {
                try_stringify!(row, idx, i64);
                try_stringify!(row, idx, u64);
                JsonValue::Null
            }
            TypeCategory::Float => {
                try_stringify!(row, idx, f64);
                try_stringify!(row, idx, f32);
                JsonValue::Null
            }
            TypeCategory::Decimal => {
                if let Ok(v) = row.try_get::<Option<RawDecimal>, _>(idx) {
                    return string_or_null(v.map(|d| d.0));
                }
                JsonValue::Null
            }
            TypeCategory::Boolean => {
                try_stringify!(row, idx, bool);
                try_stringify!(row, idx, i64);
                JsonValue::Null
            }
            TypeCategory::DateTime => {
                try_stringify!(row, idx, chrono::NaiveDateTime);
                try_stringify!(row, idx, chrono::DateTime<chrono::Utc>);
                try_stringify!(row, idx, chrono::NaiveDate);
                try_stringify!(row, idx, chrono::NaiveTime);
                try_stringify!(row, idx, String);
                JsonValue::Null
            }
            TypeCategory::Binary => {
                if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                    return string_or_null(v.map(|b| encode_binary(&b)));
                }
                JsonValue::Null
            }
            TypeCategory::Other => {
                try_stringify!(row, idx, String);
                try_stringify!(row, idx, i64);
                try_stringify!(row, idx, f64);
                if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                    return string_or_null(v.map(|b| encode_binary(&b)));
                }
                JsonValue::Null
            }
        }
    }
}

pub(crate) mod postgres {
    use super::*;
    use crate::models::SampleRow;
    use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
    use sqlx::{Column, Decode, Row, Type, TypeInfo};

    /// Raw NUMERIC values as strings, preserving precision.
    struct RawDecimal(String);

    impl Type<sqlx::Postgres> for RawDecimal {
        fn type_info() -> PgTypeInfo {
            <String as Type<sqlx::Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            let name = ty.name().to_lowercase();
            name.contains("numeric") || name.contains("decimal")
        }
    }

    impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
        fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
            let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
            Ok(RawDecimal(s.to_string()))
        }
    }

    pub async fn fetch_rows(
        pool: &sqlx::PgPool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> NlqResult<Vec<PgRow>> {
        use sqlx::Executor;
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub fn stringify_rows(rows: &[PgRow]) -> (Vec<ColumnMetadata>, Vec<SampleRow>) {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnMetadata::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let maps = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        (
                            col.name().to_string(),
                            decode_column(row, idx, col.type_info().name()),
                        )
                    })
                    .collect()
            })
            .collect();

        (columns, maps)
    }

    fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> JsonValue {
        match categorize_type(type_name, DatabaseType::PostgreSQL) {
            TypeCategory::Integer => {
                try_stringify!(row, idx, i64);
                try_stringify!(row, idx, i32);
                try_stringify!(row, idx, i16);
                JsonValue::Null
            }
            TypeCategory::Float => {
                try_stringify!(row, idx, f64);
                try_stringify!(row, idx, f32);
                JsonValue::Null
            }
            TypeCategory::Decimal => {
                if let Ok(v) = row.try_get::<Option<RawDecimal>, _>(idx) {
                    return string_or_null(v.map(|d| d.0));
                }
                JsonValue::Null
            }
            TypeCategory::Boolean => {
                try_stringify!(row, idx, bool);
                JsonValue::Null
            }
            TypeCategory::DateTime => {
                try_stringify!(row, idx, chrono::DateTime<chrono::Utc>);
                try_stringify!(row, idx, chrono::NaiveDateTime);
                try_stringify!(row, idx, chrono::NaiveDate);
                try_stringify!(row, idx, chrono::NaiveTime);
                JsonValue::Null
            }
            TypeCategory::Binary => {
                if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                    return string_or_null(v.map(|b| encode_binary(&b)));
                }
                JsonValue::Null
            }
            TypeCategory::Other => {
                try_stringify!(row, idx, String);
                try_stringify!(row, idx, i64);
                try_stringify!(row, idx, f64);
                try_stringify!(row, idx, bool);
                JsonValue::Null
            }
        }
    }
}

pub(crate) mod sqlite {
    use super::*;
    use crate::models::SampleRow;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Column, Row, TypeInfo};

    pub async fn fetch_rows(
        pool: &sqlx::SqlitePool,
        sql: &str,
        row_limit: u32,
        query_timeout: Duration,
    ) -> NlqResult<Vec<SqliteRow>> {
        use sqlx::Executor;
        let fetch_limit = row_limit as usize + 1;
        let stream = pool.fetch(sql);
        let rows_future = stream.take(fetch_limit).collect::<Vec<_>>();

        match timeout(query_timeout, rows_future).await {
            Ok(results) => collect_rows(results),
            Err(_) => Err(timeout_error("query execution", query_timeout)),
        }
    }

    pub fn stringify_rows(rows: &[SqliteRow]) -> (Vec<ColumnMetadata>, Vec<SampleRow>) {
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnMetadata::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let maps = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| (col.name().to_string(), decode_column(row, idx)))
                    .collect()
            })
            .collect();

        (columns, maps)
    }

    /// SQLite storage classes are dynamic per value, so the declared type is
    /// unreliable; walk the decoders instead.
    fn decode_column(row: &SqliteRow, idx: usize) -> JsonValue {
        try_stringify!(row, idx, String);
        try_stringify!(row, idx, i64);
        try_stringify!(row, idx, f64);
        try_stringify!(row, idx, bool);
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return string_or_null(v.map(|b| encode_binary(&b)));
        }
        JsonValue::Null
    }
}
