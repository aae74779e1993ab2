//! End-to-end integration tests against a real SQLite database.
//!
//! Covers introspection (column order, primary-key merge, foreign keys,
//! sample-row cap, row counts), documentation survival across schema
//! reloads, and the generate -> validate -> execute pipeline.

use nlq_mcp_server::config::PoolOptions;
use nlq_mcp_server::db::ConnectionManager;
use nlq_mcp_server::models::ConnectionConfig;
use nlq_mcp_server::models::docs::{Documentation, TableDoc};
use nlq_mcp_server::nlq::{GenerationMethod, ValidationStatus};
use nlq_mcp_server::tools::docs::{DocsToolHandler, GetDocumentationInput, SetDocumentationInput};
use nlq_mcp_server::tools::format::OutputFormat;
use nlq_mcp_server::tools::generate::{GenerateQueryInput, GenerateToolHandler};
use nlq_mcp_server::tools::query::{QueryInput, QueryToolHandler};
use nlq_mcp_server::tools::schema::{
    ExploreSchemaInput, SchemaContextInput, SchemaToolHandler,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::NamedTempFile;

const CONN_ID: &str = "testdb";

/// Seed a temp SQLite database and connect the (read-only) manager to it.
async fn setup() -> (Arc<ConnectionManager>, String) {
    let db_path = NamedTempFile::new()
        .unwrap()
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Seed with a writable pool outside the manager; the server itself
    // opens SQLite read-only.
    {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE orders (
                id INTEGER PRIMARY KEY,
                user_id INTEGER REFERENCES users(id),
                total REAL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        for i in 1..=7 {
            sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
                .bind(i)
                .bind(format!("user{}", i))
                .bind("2026-01-01")
                .execute(&pool)
                .await
                .unwrap();
        }
        for i in 1..=3 {
            sqlx::query("INSERT INTO orders (id, user_id, total) VALUES (?, ?, ?)")
                .bind(i)
                .bind(i)
                .bind(10.5 * i as f64)
                .execute(&pool)
                .await
                .unwrap();
        }

        pool.close().await;
    }

    let manager = Arc::new(ConnectionManager::new());
    let config = ConnectionConfig::new(
        CONN_ID,
        format!("sqlite:{}", db_path),
        None,
        PoolOptions::default(),
    )
    .unwrap();
    manager.connect(config).await.unwrap();

    (manager, db_path)
}

#[tokio::test]
async fn explore_schema_reports_structure_samples_and_counts() {
    let (manager, _path) = setup().await;
    let handler = SchemaToolHandler::new(manager.clone());

    let output = handler
        .explore_schema(ExploreSchemaInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(output.table_count, 2);
    // sqlite_master is queried in name order
    let names: Vec<&str> = output.schema.table_names().collect();
    assert_eq!(names, vec!["orders", "users"]);

    let users = output.schema.table("users").unwrap();
    let column_names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(column_names, vec!["id", "name", "created_at"]);
    assert!(users.columns[0].primary_key);
    assert!(!users.columns[1].primary_key);
    assert!(!users.columns[1].nullable);
    assert!(users.columns[2].nullable);
    assert_eq!(users.row_count, 7);
    // Sample rows are capped at 5
    assert_eq!(users.sample_rows.len(), 5);
    assert_eq!(
        users.sample_rows[0].get("name").unwrap().as_str(),
        Some("user1")
    );

    let orders = output.schema.table("orders").unwrap();
    assert_eq!(orders.row_count, 3);
    assert_eq!(orders.foreign_keys.len(), 1);
    assert_eq!(orders.foreign_keys[0].constrained_columns, vec!["user_id"]);
    assert_eq!(orders.foreign_keys[0].referenced_table, "users");
    assert_eq!(orders.foreign_keys[0].referenced_columns, vec!["id"]);
}

#[tokio::test]
async fn documentation_survives_schema_reexploration() {
    let (manager, _path) = setup().await;
    let schema_handler = SchemaToolHandler::new(manager.clone());
    let docs_handler = DocsToolHandler::new(manager.clone());

    schema_handler
        .explore_schema(ExploreSchemaInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();

    let mut documentation = Documentation::new();
    documentation.tables.insert(
        "users".to_string(),
        TableDoc {
            description: "Registered application users".to_string(),
            columns: HashMap::from([("name".to_string(), "Display name".to_string())]),
        },
    );
    docs_handler
        .set_documentation(SetDocumentationInput {
            connection_id: CONN_ID.to_string(),
            documentation,
        })
        .await
        .unwrap();

    // Re-introspect: the overlay must carry forward
    schema_handler
        .explore_schema(ExploreSchemaInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();

    let docs = docs_handler
        .get_documentation(GetDocumentationInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        docs.documentation.table_description("users"),
        Some("Registered application users")
    );

    // And it shows up in the rendered context
    let context = schema_handler
        .schema_context(SchemaContextInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();
    assert!(context.context.contains("TABLE: users"));
    assert!(context.context.contains("Description: Registered application users"));
    assert!(context.context.contains("-- Display name"));
}

#[tokio::test]
async fn generate_validate_execute_pipeline() {
    let (manager, _path) = setup().await;
    let schema_handler = SchemaToolHandler::new(manager.clone());
    let generate_handler = GenerateToolHandler::new(manager.clone(), None);
    let query_handler = QueryToolHandler::new(manager.clone());

    schema_handler
        .explore_schema(ExploreSchemaInput {
            connection_id: CONN_ID.to_string(),
        })
        .await
        .unwrap();

    let generated = generate_handler
        .generate_query(GenerateQueryInput {
            connection_id: CONN_ID.to_string(),
            question: "How many users are there?".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(generated.method, GenerationMethod::Pattern);
    assert_eq!(generated.query, r#"SELECT COUNT(*) FROM "users""#);
    assert_eq!(generated.validation.confidence, 100);
    assert_eq!(generated.validation.status, ValidationStatus::Good);

    let result = query_handler
        .query(QueryInput {
            connection_id: CONN_ID.to_string(),
            sql: generated.query,
            limit: None,
            timeout_secs: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    let value = result.rows[0].values().next().unwrap();
    assert_eq!(value.as_str(), Some("7"));
}

#[tokio::test]
async fn query_tool_rejects_writes_and_enforces_limits() {
    let (manager, _path) = setup().await;
    let query_handler = QueryToolHandler::new(manager.clone());

    let rejected = query_handler
        .query(QueryInput {
            connection_id: CONN_ID.to_string(),
            sql: "DELETE FROM users".to_string(),
            limit: None,
            timeout_secs: None,
            format: OutputFormat::Json,
        })
        .await;
    assert!(rejected.is_err());

    let limited = query_handler
        .query(QueryInput {
            connection_id: CONN_ID.to_string(),
            sql: "SELECT * FROM users".to_string(),
            limit: Some(3),
            timeout_secs: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
    assert_eq!(limited.row_count, 3);
    assert!(limited.truncated);

    let markdown = query_handler
        .query(QueryInput {
            connection_id: CONN_ID.to_string(),
            sql: "SELECT name FROM users ORDER BY id LIMIT 2".to_string(),
            limit: None,
            timeout_secs: None,
            format: OutputFormat::Markdown,
        })
        .await
        .unwrap();
    let formatted = markdown.formatted.unwrap();
    assert!(formatted.contains("| name |"));
    assert!(formatted.contains("user1"));
}

#[tokio::test]
async fn generation_without_exploration_uses_degenerate_schema() {
    let (manager, _path) = setup().await;
    let generate_handler = GenerateToolHandler::new(manager.clone(), None);

    // No explore_schema call: the snapshot holds an empty schema
    let generated = generate_handler
        .generate_query(GenerateQueryInput {
            connection_id: CONN_ID.to_string(),
            question: "Show me everything".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(generated.query, r#"SELECT * FROM "unknown_table" LIMIT 100"#);
    assert_eq!(generated.method, GenerationMethod::Pattern);
}
