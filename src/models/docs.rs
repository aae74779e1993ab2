//! Documentation overlay models.
//!
//! User-supplied free-text descriptions keyed by table and column name.
//! The overlay is independent of the schema: keys that match no table or
//! column are inert, and the overlay survives a schema reload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Documentation for one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TableDoc {
    /// Free-text table description. Empty string means undocumented.
    #[serde(default)]
    pub description: String,
    /// Per-column descriptions, keyed by column name.
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

/// The full documentation overlay, keyed by table name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Documentation {
    pub tables: HashMap<String, TableDoc>,
}

impl Documentation {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documentation for a table, if any.
    pub fn table(&self, table_name: &str) -> Option<&TableDoc> {
        self.tables.get(table_name)
    }

    /// Non-empty description for a table, if any.
    pub fn table_description(&self, table_name: &str) -> Option<&str> {
        self.table(table_name)
            .map(|doc| doc.description.as_str())
            .filter(|desc| !desc.is_empty())
    }

    /// Non-empty description for a column, if any.
    pub fn column_description(&self, table_name: &str, column_name: &str) -> Option<&str> {
        self.table(table_name)
            .and_then(|doc| doc.columns.get(column_name))
            .map(String::as_str)
            .filter(|desc| !desc.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_descriptions_are_absent() {
        let mut docs = Documentation::new();
        docs.tables.insert("users".to_string(), TableDoc::default());

        assert!(docs.table("users").is_some());
        assert!(docs.table_description("users").is_none());
        assert!(docs.column_description("users", "id").is_none());
    }

    #[test]
    fn test_lookups() {
        let mut docs = Documentation::new();
        docs.tables.insert(
            "orders".to_string(),
            TableDoc {
                description: "Customer orders".to_string(),
                columns: HashMap::from([("total".to_string(), "Order total in cents".to_string())]),
            },
        );

        assert_eq!(docs.table_description("orders"), Some("Customer orders"));
        assert_eq!(
            docs.column_description("orders", "total"),
            Some("Order total in cents")
        );
        // Unmatched keys are inert, not errors
        assert!(docs.table_description("missing").is_none());
        assert!(docs.column_description("orders", "missing").is_none());
    }

    #[test]
    fn test_transparent_json_shape() {
        let json = r#"{"users": {"description": "App users", "columns": {"id": "Primary key"}}}"#;
        let docs: Documentation = serde_json::from_str(json).unwrap();
        assert_eq!(docs.table_description("users"), Some("App users"));
    }
}
