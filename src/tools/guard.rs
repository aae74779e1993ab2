//! Read-only statement guard.
//!
//! Two layers enforce the executor boundary's safety invariant:
//!
//! 1. The statement text must begin with SELECT, case-insensitively. This
//!    is the hard contract; it intentionally also rejects statements like
//!    `WITH ... SELECT` and `EXPLAIN SELECT`.
//! 2. The statement must parse (with the dialect matching the target
//!    database) and every parsed statement must be a plain query. This
//!    catches write operations smuggled behind a leading SELECT, e.g.
//!    `SELECT 1; DROP TABLE users`.

use crate::error::{NlqError, NlqResult};
use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// Get the appropriate SQL dialect for the given database type.
fn dialect_for(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Validate that a statement is a read-only SELECT.
///
/// Returns `Ok(())` when the statement may be executed, or
/// `Err(NlqError::Permission)` / `Err(NlqError::InvalidInput)` otherwise.
pub fn ensure_select(sql: &str, db_type: DatabaseType) -> NlqResult<()> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(NlqError::invalid_input("Empty SQL statement"));
    }

    if !trimmed.to_uppercase().starts_with("SELECT") {
        return Err(NlqError::permission(
            leading_word(trimmed),
            "Only SELECT queries are allowed",
        ));
    }

    let dialect = dialect_for(db_type);
    let statements = Parser::parse_sql(dialect.as_ref(), trimmed).map_err(|e| {
        NlqError::invalid_input(format!("Failed to parse SQL statement. Error: {}", e))
    })?;

    if statements.is_empty() {
        return Err(NlqError::invalid_input("Empty SQL statement"));
    }

    for stmt in &statements {
        if !matches!(stmt, Statement::Query(_)) {
            return Err(NlqError::permission(
                operation_name(stmt),
                "Only SELECT queries are allowed; the statement contains a non-query operation",
            ));
        }
    }

    Ok(())
}

/// First word of the statement, for error messages.
fn leading_word(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or("statement")
        .to_uppercase()
}

/// Human-readable name for a rejected statement.
fn operation_name(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::Merge { .. } => "MERGE",
        Statement::CreateTable { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex(_) => "CREATE",
        Statement::Drop { .. } => "DROP",
        Statement::AlterTable { .. } => "ALTER",
        Statement::Truncate { .. } => "TRUNCATE",
        Statement::StartTransaction { .. } => "BEGIN",
        Statement::Commit { .. } => "COMMIT",
        Statement::Rollback { .. } => "ROLLBACK",
        Statement::Grant { .. } => "GRANT",
        Statement::Revoke { .. } => "REVOKE",
        Statement::Set(_) => "SET",
        Statement::Pragma { .. } => "PRAGMA",
        _ => "non-SELECT statement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DB_TYPE: DatabaseType = DatabaseType::PostgreSQL;

    #[test]
    fn test_select_ok() {
        assert!(ensure_select("SELECT * FROM users", TEST_DB_TYPE).is_ok());
        assert!(ensure_select("select 1", TEST_DB_TYPE).is_ok());
        assert!(ensure_select("  SELECT COUNT(*) FROM \"orders\"  ", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_select_with_subquery_and_union() {
        let sql = r#"
            SELECT u.name, (SELECT COUNT(*) FROM orders WHERE user_id = u.id) AS order_count
            FROM users u
            WHERE u.id IN (SELECT user_id FROM active_users)
        "#;
        assert!(ensure_select(sql, TEST_DB_TYPE).is_ok());
        assert!(ensure_select("SELECT a FROM t1 UNION ALL SELECT b FROM t2", TEST_DB_TYPE).is_ok());
    }

    #[test]
    fn test_insert_rejected() {
        let result = ensure_select("INSERT INTO users VALUES (1)", TEST_DB_TYPE);
        assert!(matches!(result, Err(NlqError::Permission { .. })));
    }

    #[test]
    fn test_update_and_delete_rejected() {
        assert!(ensure_select("UPDATE users SET name = 'x'", TEST_DB_TYPE).is_err());
        assert!(ensure_select("DELETE FROM users", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_ddl_rejected() {
        assert!(ensure_select("CREATE TABLE t (id INT)", TEST_DB_TYPE).is_err());
        assert!(ensure_select("DROP TABLE users", TEST_DB_TYPE).is_err());
        assert!(ensure_select("TRUNCATE users", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_cte_rejected_by_prefix_rule() {
        // The boundary contract is literal: text must begin with SELECT.
        let result = ensure_select("WITH c AS (SELECT 1) SELECT * FROM c", TEST_DB_TYPE);
        assert!(matches!(result, Err(NlqError::Permission { .. })));
    }

    #[test]
    fn test_explain_rejected_by_prefix_rule() {
        assert!(ensure_select("EXPLAIN SELECT 1", TEST_DB_TYPE).is_err());
    }

    #[test]
    fn test_trailing_write_rejected() {
        // Leading SELECT does not excuse the INSERT behind it
        let result = ensure_select("SELECT 1; INSERT INTO users VALUES (1)", TEST_DB_TYPE);
        assert!(matches!(result, Err(NlqError::Permission { .. })));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            ensure_select("", TEST_DB_TYPE),
            Err(NlqError::InvalidInput { .. })
        ));
        assert!(matches!(
            ensure_select("   ", TEST_DB_TYPE),
            Err(NlqError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_unparseable_rejected() {
        let result = ensure_select("SELECT FROM WHERE", TEST_DB_TYPE);
        assert!(matches!(result, Err(NlqError::InvalidInput { .. })));
    }

    #[test]
    fn test_error_message_names_operation() {
        let err = ensure_select("DROP TABLE users", TEST_DB_TYPE).unwrap_err();
        assert!(err.to_string().contains("DROP"));
    }

    #[test]
    fn test_all_dialects_accept_select() {
        for db in [
            DatabaseType::PostgreSQL,
            DatabaseType::MySQL,
            DatabaseType::SQLite,
        ] {
            assert!(ensure_select("SELECT * FROM t LIMIT 5", db).is_ok());
        }
    }
}
