//! Schema snapshot: the immutable (schema, documentation) unit.
//!
//! A request always observes one consistent pair. The snapshot is never
//! mutated in place; reconnects and re-introspections build a new snapshot
//! and swap the `Arc` behind the connection's lock, so a reloaded schema is
//! never visible alongside stale documentation from a prior pair.

use crate::models::docs::Documentation;
use crate::models::schema::DatabaseSchema;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    pub schema: DatabaseSchema,
    pub documentation: Documentation,
    /// When the schema was last introspected. None until the first explore.
    pub introspected_at: Option<DateTime<Utc>>,
}

impl SchemaSnapshot {
    /// The empty snapshot installed at connect time.
    pub fn empty() -> Self {
        Self::default()
    }

    /// New snapshot with a freshly introspected schema, carrying the current
    /// documentation forward.
    pub fn with_schema(&self, schema: DatabaseSchema, introspected_at: DateTime<Utc>) -> Self {
        Self {
            schema,
            documentation: self.documentation.clone(),
            introspected_at: Some(introspected_at),
        }
    }

    /// New snapshot with replaced documentation, keeping the current schema.
    pub fn with_documentation(&self, documentation: Documentation) -> Self {
        Self {
            schema: self.schema.clone(),
            documentation,
            introspected_at: self.introspected_at,
        }
    }

    /// Whether a schema has been introspected for this snapshot.
    pub fn has_schema(&self) -> bool {
        self.introspected_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::docs::TableDoc;
    use crate::models::schema::TableSchema;

    #[test]
    fn test_schema_swap_keeps_documentation() {
        let mut docs = Documentation::new();
        docs.tables.insert(
            "users".to_string(),
            TableDoc {
                description: "App users".to_string(),
                ..Default::default()
            },
        );

        let base = SchemaSnapshot::empty().with_documentation(docs);
        let schema = DatabaseSchema::new().with_table(TableSchema::new("users"));
        let next = base.with_schema(schema, Utc::now());

        assert!(next.has_schema());
        assert_eq!(next.documentation.table_description("users"), Some("App users"));
    }

    #[test]
    fn test_documentation_swap_keeps_schema() {
        let schema = DatabaseSchema::new().with_table(TableSchema::new("orders"));
        let base = SchemaSnapshot::empty().with_schema(schema, Utc::now());
        let next = base.with_documentation(Documentation::new());

        assert_eq!(next.schema.len(), 1);
        assert_eq!(next.introspected_at, base.introspected_at);
    }
}
