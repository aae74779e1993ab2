//! Schema introspection.
//!
//! Builds a [`DatabaseSchema`] from a live connection: tables, columns with
//! primary-key membership merged in by name, foreign keys, up to five
//! sample rows and a best-effort row count per table.
//!
//! Structural failures (cannot list tables, cannot read columns) propagate;
//! sampling and counting failures only degrade the affected table and are
//! logged, never raised.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for
//! each database type. Database-specific implementations are in their
//! respective submodules (postgres, mysql, sqlite), each providing the same
//! interface.

use crate::db::executor::QueryExecutor;
use crate::db::pool::DbPool;
use crate::error::NlqResult;
use crate::models::schema::MAX_SAMPLE_ROWS;
use crate::models::{DatabaseSchema, ForeignKeyInfo, SampleRow, TableSchema};
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for each introspection statement.
const INTROSPECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// Introspect the full schema of a connected database.
    pub async fn introspect(pool: &DbPool) -> NlqResult<DatabaseSchema> {
        let table_names = match pool {
            DbPool::Postgres(p) => postgres::list_tables(p).await?,
            DbPool::MySql(p) => mysql::list_tables(p).await?,
            DbPool::SQLite(p) => sqlite::list_tables(p).await?,
        };

        let mut schema = DatabaseSchema::new();
        for name in table_names {
            let mut table = match pool {
                DbPool::Postgres(p) => postgres::describe_table(p, &name).await?,
                DbPool::MySql(p) => mysql::describe_table(p, &name).await?,
                DbPool::SQLite(p) => sqlite::describe_table(p, &name).await?,
            };

            table.sample_rows = sample_rows(pool, &name).await;
            table.row_count = row_count(pool, &name).await;
            debug!(
                table = %name,
                columns = table.columns.len(),
                rows = table.row_count,
                "Introspected table"
            );
            schema = schema.with_table(table);
        }

        Ok(schema)
    }
}

/// Fetch up to [`MAX_SAMPLE_ROWS`] rows from a table. Failures degrade to
/// an empty sample.
async fn sample_rows(pool: &DbPool, table: &str) -> Vec<SampleRow> {
    let sql = format!(
        "SELECT * FROM {} LIMIT {}",
        pool.quote_ident(table),
        MAX_SAMPLE_ROWS
    );
    match QueryExecutor::new()
        .execute_sql(pool, &sql, MAX_SAMPLE_ROWS as u32, INTROSPECT_TIMEOUT)
        .await
    {
        Ok(result) => result.rows,
        Err(e) => {
            warn!(table = %table, error = %e, "Failed to sample table rows");
            Vec::new()
        }
    }
}

/// Count rows in a table. Failures degrade to 0.
async fn row_count(pool: &DbPool, table: &str) -> u64 {
    let sql = format!("SELECT COUNT(*) FROM {}", pool.quote_ident(table));
    let result = match pool {
        DbPool::Postgres(p) => sqlx::query_scalar::<_, i64>(&sql).fetch_one(p).await,
        DbPool::MySql(p) => sqlx::query_scalar::<_, i64>(&sql).fetch_one(p).await,
        DbPool::SQLite(p) => sqlx::query_scalar::<_, i64>(&sql).fetch_one(p).await,
    };
    match result {
        Ok(count) => count.max(0) as u64,
        Err(e) => {
            warn!(table = %table, error = %e, "Failed to count table rows");
            0
        }
    }
}

/// Group (constraint key, column, referenced table, referenced column) rows
/// into ForeignKeyInfo entries, preserving row order within each constraint.
fn group_foreign_keys(rows: Vec<(String, String, String, String)>) -> Vec<ForeignKeyInfo> {
    let mut fks: Vec<(String, ForeignKeyInfo)> = Vec::new();
    for (key, column, ref_table, ref_column) in rows {
        match fks.iter_mut().find(|(k, _)| *k == key) {
            Some((_, fk)) => {
                fk.constrained_columns.push(column);
                fk.referenced_columns.push(ref_column);
            }
            None => fks.push((
                key,
                ForeignKeyInfo {
                    constrained_columns: vec![column],
                    referenced_table: ref_table,
                    referenced_columns: vec![ref_column],
                },
            )),
        }
    }
    fks.into_iter().map(|(_, fk)| fk).collect()
}

// =============================================================================
// SQL Query Templates
// =============================================================================
//
// Centralized SQL queries for schema introspection. Each database has its
// own submodule with queries adapted to its specific system catalogs.

mod queries {
    pub mod postgres {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                column_name,
                data_type,
                is_nullable,
                column_default
            FROM information_schema.columns
            WHERE table_schema = 'public'
              AND table_name = $1
            ORDER BY ordinal_position
            "#;

        pub const PRIMARY_KEY_COLUMNS: &str = r#"
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
                AND kcu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = 'public'
              AND tc.table_name = $1
            ORDER BY kcu.ordinal_position
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT
                tc.constraint_name,
                kcu.column_name,
                ccu.table_name AS referenced_table,
                ccu.column_name AS referenced_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
                AND kcu.table_schema = tc.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
              AND tc.table_schema = 'public'
              AND tc.table_name = $1
            ORDER BY tc.constraint_name, kcu.ordinal_position
            "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                column_name,
                column_type,
                is_nullable,
                column_default
            FROM information_schema.columns
            WHERE table_schema = DATABASE()
              AND table_name = ?
            ORDER BY ordinal_position
            "#;

        pub const PRIMARY_KEY_COLUMNS: &str = r#"
            SELECT column_name
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
              AND table_name = ?
              AND constraint_name = 'PRIMARY'
            ORDER BY ordinal_position
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT
                constraint_name,
                column_name,
                referenced_table_name,
                referenced_column_name
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
              AND table_name = ?
              AND referenced_table_name IS NOT NULL
            ORDER BY constraint_name, ordinal_position
            "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?)
            ORDER BY cid
            "#;

        pub const FOREIGN_KEYS: &str = r#"
            SELECT id, "table", "from", "to"
            FROM pragma_foreign_key_list(?)
            ORDER BY id, seq
            "#;
    }
}

// =============================================================================
// Database-specific implementations
// =============================================================================

mod postgres {
    use super::*;
    use crate::models::ColumnInfo;
    use sqlx::{PgPool, Row};

    pub async fn list_tables(pool: &PgPool) -> NlqResult<Vec<String>> {
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(Into::into))
            .collect()
    }

    pub async fn describe_table(pool: &PgPool, table_name: &str) -> NlqResult<TableSchema> {
        let mut table = TableSchema::new(table_name);

        let column_rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        for row in &column_rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let default_value: Option<String> = row.try_get("column_default")?;

            let mut column = ColumnInfo::new(name, data_type, is_nullable == "YES");
            if let Some(default) = default_value {
                column = column.with_default(default);
            }
            table.columns.push(column);
        }

        // Primary-key membership is a separate constraint lookup, merged in
        // by column name.
        let pk_rows = sqlx::query(queries::postgres::PRIMARY_KEY_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        for row in &pk_rows {
            let pk_column: String = row.try_get("column_name")?;
            if let Some(column) = table.columns.iter_mut().find(|c| c.name == pk_column) {
                column.primary_key = true;
            }
        }

        let fk_rows = sqlx::query(queries::postgres::FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        let mut tuples = Vec::with_capacity(fk_rows.len());
        for row in &fk_rows {
            tuples.push((
                row.try_get::<String, _>("constraint_name")?,
                row.try_get::<String, _>("column_name")?,
                row.try_get::<String, _>("referenced_table")?,
                row.try_get::<String, _>("referenced_column")?,
            ));
        }
        table.foreign_keys = group_foreign_keys(tuples);

        Ok(table)
    }
}

mod mysql {
    use super::*;
    use crate::models::ColumnInfo;
    use sqlx::{MySqlPool, Row};

    pub async fn list_tables(pool: &MySqlPool) -> NlqResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(Into::into))
            .collect()
    }

    pub async fn describe_table(pool: &MySqlPool, table_name: &str) -> NlqResult<TableSchema> {
        let mut table = TableSchema::new(table_name);

        let column_rows = sqlx::query(queries::mysql::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        for row in &column_rows {
            let name: String = row.try_get(0)?;
            let data_type: String = row.try_get(1)?;
            let is_nullable: String = row.try_get(2)?;
            let default_value: Option<String> = row.try_get(3)?;

            let mut column = ColumnInfo::new(name, data_type, is_nullable == "YES");
            if let Some(default) = default_value {
                column = column.with_default(default);
            }
            table.columns.push(column);
        }

        let pk_rows = sqlx::query(queries::mysql::PRIMARY_KEY_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        for row in &pk_rows {
            let pk_column: String = row.try_get(0)?;
            if let Some(column) = table.columns.iter_mut().find(|c| c.name == pk_column) {
                column.primary_key = true;
            }
        }

        let fk_rows = sqlx::query(queries::mysql::FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        let mut tuples = Vec::with_capacity(fk_rows.len());
        for row in &fk_rows {
            tuples.push((
                row.try_get::<String, _>(0)?,
                row.try_get::<String, _>(1)?,
                row.try_get::<String, _>(2)?,
                row.try_get::<String, _>(3)?,
            ));
        }
        table.foreign_keys = group_foreign_keys(tuples);

        Ok(table)
    }
}

mod sqlite {
    use super::*;
    use crate::models::ColumnInfo;
    use sqlx::{Row, SqlitePool};

    pub async fn list_tables(pool: &SqlitePool) -> NlqResult<Vec<String>> {
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    pub async fn describe_table(pool: &SqlitePool, table_name: &str) -> NlqResult<TableSchema> {
        let mut table = TableSchema::new(table_name);

        let column_rows = sqlx::query(queries::sqlite::DESCRIBE_COLUMNS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        for row in &column_rows {
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get("type")?;
            let notnull: i64 = row.try_get("notnull")?;
            let default_value: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            let mut column =
                ColumnInfo::new(name, data_type, notnull == 0).with_primary_key(pk > 0);
            if let Some(default) = default_value {
                column = column.with_default(default);
            }
            table.columns.push(column);
        }

        let fk_rows = sqlx::query(queries::sqlite::FOREIGN_KEYS)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        let mut tuples = Vec::with_capacity(fk_rows.len());
        for row in &fk_rows {
            tuples.push((
                row.try_get::<i64, _>("id")?.to_string(),
                row.try_get::<String, _>("from")?,
                row.try_get::<String, _>("table")?,
                row.try_get::<String, _>("to")?,
            ));
        }
        table.foreign_keys = group_foreign_keys(tuples);

        Ok(table)
    }
}
