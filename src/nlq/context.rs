//! Schema context rendering.
//!
//! Turns a (schema, documentation) pair into the deterministic text block
//! used as generation context. Purely presentational, but determinism
//! matters: the rendered text feeds the remote generator's prompt and the
//! reproducibility of test fixtures depends on stable output.

use crate::models::{DatabaseSchema, Documentation};

/// Render the schema and documentation overlay as a text block.
///
/// Tables appear in schema order, columns in their stored order. Either
/// input may be empty; the output is then correspondingly sparse, never an
/// error.
pub fn render_schema_context(schema: &DatabaseSchema, documentation: &Documentation) -> String {
    let mut lines: Vec<String> = Vec::new();

    for table in &schema.tables {
        lines.push(format!("TABLE: {}", table.name));
        if let Some(desc) = documentation.table_description(&table.name) {
            lines.push(format!("  Description: {}", desc));
        }
        lines.push("  COLUMNS:".to_string());

        for column in &table.columns {
            let pk = if column.primary_key {
                " (PRIMARY KEY)"
            } else {
                ""
            };
            let mut line = format!("    - {}: {}{}", column.name, column.data_type, pk);
            if let Some(doc) = documentation.column_description(&table.name, &column.name) {
                line.push_str(&format!(" -- {}", doc));
            }
            lines.push(line);
        }

        if !table.foreign_keys.is_empty() {
            lines.push("  FOREIGN KEYS:".to_string());
            for fk in &table.foreign_keys {
                lines.push(format!(
                    "    - {} -> {}({})",
                    fk.constrained_columns.join(", "),
                    fk.referenced_table,
                    fk.referenced_columns.join(", ")
                ));
            }
        }

        lines.push(String::new());
    }

    if lines.is_empty() {
        return String::new();
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::docs::TableDoc;
    use crate::models::{ColumnInfo, ForeignKeyInfo, TableSchema};
    use std::collections::HashMap;

    fn sample_schema() -> DatabaseSchema {
        DatabaseSchema::new()
            .with_table(
                TableSchema::new("users")
                    .with_column(ColumnInfo::new("id", "INTEGER", false).with_primary_key(true))
                    .with_column(ColumnInfo::new("name", "TEXT", true)),
            )
            .with_table(
                TableSchema::new("orders")
                    .with_column(ColumnInfo::new("id", "INTEGER", false).with_primary_key(true))
                    .with_column(ColumnInfo::new("user_id", "INTEGER", true))
                    .with_foreign_key(ForeignKeyInfo::new("user_id", "users", "id")),
            )
    }

    #[test]
    fn test_renders_tables_in_schema_order() {
        let rendered = render_schema_context(&sample_schema(), &Documentation::new());
        let users_pos = rendered.find("TABLE: users").unwrap();
        let orders_pos = rendered.find("TABLE: orders").unwrap();
        assert!(users_pos < orders_pos);
    }

    #[test]
    fn test_renders_columns_in_stored_order_with_pk_marker() {
        let rendered = render_schema_context(&sample_schema(), &Documentation::new());
        assert!(rendered.contains("    - id: INTEGER (PRIMARY KEY)"));
        let id_pos = rendered.find("- id: INTEGER").unwrap();
        let name_pos = rendered.find("- name: TEXT").unwrap();
        assert!(id_pos < name_pos);
    }

    #[test]
    fn test_renders_foreign_keys_only_when_present() {
        let rendered = render_schema_context(&sample_schema(), &Documentation::new());
        assert!(rendered.contains("    - user_id -> users(id)"));
        // users table has no FK block
        let users_block = &rendered[..rendered.find("TABLE: orders").unwrap()];
        assert!(!users_block.contains("FOREIGN KEYS"));
    }

    #[test]
    fn test_renders_documentation_overlay() {
        let mut docs = Documentation::new();
        docs.tables.insert(
            "users".to_string(),
            TableDoc {
                description: "Registered users".to_string(),
                columns: HashMap::from([("name".to_string(), "Display name".to_string())]),
            },
        );

        let rendered = render_schema_context(&sample_schema(), &docs);
        assert!(rendered.contains("  Description: Registered users"));
        assert!(rendered.contains("- name: TEXT -- Display name"));
    }

    #[test]
    fn test_unmatched_documentation_keys_are_inert() {
        let mut docs = Documentation::new();
        docs.tables
            .insert("nonexistent".to_string(), TableDoc::default());

        let rendered = render_schema_context(&sample_schema(), &docs);
        assert!(!rendered.contains("nonexistent"));
    }

    #[test]
    fn test_empty_schema_renders_empty() {
        let rendered = render_schema_context(&DatabaseSchema::new(), &Documentation::new());
        assert!(rendered.is_empty());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let schema = sample_schema();
        let docs = Documentation::new();
        assert_eq!(
            render_schema_context(&schema, &docs),
            render_schema_context(&schema, &docs)
        );
    }
}
