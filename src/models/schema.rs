//! Schema-related data models.
//!
//! This module defines the passive schema description produced by
//! introspection and consumed by the context renderer, the query generator
//! and the validator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single sample row: column name mapped to a stringified value or null.
pub type SampleRow = serde_json::Map<String, serde_json::Value>;

/// Maximum number of sample rows captured per table during introspection.
pub const MAX_SAMPLE_ROWS: usize = 5;

/// A column as discovered by introspection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as reported by the database (e.g. `VARCHAR(30)`, `bigint`).
    /// Kept as free-form text, never parsed further.
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Merged in by name match against the table's primary-key constraint.
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Create a new column description.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            primary_key: false,
        }
    }

    /// Set the default value literal.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Mark this column as part of the primary key.
    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Whether the declared type looks numeric (INT, FLOAT, DECIMAL, NUMERIC).
    pub fn is_numeric(&self) -> bool {
        let upper = self.data_type.to_uppercase();
        ["INT", "FLOAT", "DECIMAL", "NUMERIC"]
            .iter()
            .any(|t| upper.contains(t))
    }
}

/// A foreign-key constraint, structural only. The core performs no
/// referential validation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyInfo {
    pub constrained_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyInfo {
    /// Create a single-column foreign key.
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            constrained_columns: vec![column.into()],
            referenced_table: referenced_table.into(),
            referenced_columns: vec![referenced_column.into()],
        }
    }
}

/// One table as discovered by introspection.
///
/// Column order is discovery order and is load-bearing: it drives
/// numeric-column selection in the pattern generator and the rendering
/// order of the schema context.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    /// Up to [`MAX_SAMPLE_ROWS`] rows, values stringified or null.
    /// Empty when sampling failed (best-effort).
    pub sample_rows: Vec<SampleRow>,
    /// Best-effort; 0 when counting failed.
    pub row_count: u64,
}

impl TableSchema {
    /// Create an empty table schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            sample_rows: Vec::new(),
            row_count: 0,
        }
    }

    /// Append a column, preserving discovery order.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a foreign key.
    pub fn with_foreign_key(mut self, fk: ForeignKeyInfo) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Set the best-effort row count.
    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    /// First column whose declared type looks numeric, in column order.
    pub fn first_numeric_column(&self) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.is_numeric())
    }
}

/// The full schema of one data source: tables in discovery order.
///
/// Table order is load-bearing (fallback table selection and context
/// rendering both depend on it), so tables live in a Vec rather than a map;
/// names are unique by construction and lookup is a linear scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table, preserving discovery order.
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Look up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in discovery order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}
