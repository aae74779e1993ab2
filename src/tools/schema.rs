//! Schema exploration tools.
//!
//! `explore_schema` introspects the connected database and atomically
//! installs the result as the connection's current snapshot, carrying any
//! existing documentation forward. `schema_context` renders the current
//! snapshot as the text block used for query generation.

use crate::db::{ConnectionManager, SchemaInspector};
use crate::error::NlqResult;
use crate::models::DatabaseSchema;
use crate::nlq::render_schema_context;
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the explore_schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExploreSchemaInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
}

/// Output from the explore_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExploreSchemaOutput {
    /// The introspected schema: tables with columns, keys, samples and counts
    pub schema: DatabaseSchema,
    /// Number of tables discovered
    pub table_count: usize,
    /// When this introspection ran (RFC 3339)
    pub introspected_at: String,
}

/// Input for the schema_context tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SchemaContextInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
}

/// Output from the schema_context tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SchemaContextOutput {
    /// Rendered schema + documentation text block
    pub context: String,
    /// Number of tables in the rendered schema
    pub table_count: usize,
}

/// Handler for schema tools.
pub struct SchemaToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl SchemaToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Introspect the database and install the schema snapshot.
    pub async fn explore_schema(
        &self,
        input: ExploreSchemaInput,
    ) -> NlqResult<ExploreSchemaOutput> {
        let pool = self.connection_manager.get_pool(&input.connection_id).await?;

        let schema = SchemaInspector::introspect(&pool).await?;
        let snapshot = self
            .connection_manager
            .install_schema(&input.connection_id, schema)
            .await?;

        info!(
            connection_id = %input.connection_id,
            tables = snapshot.schema.len(),
            "Schema explored"
        );

        Ok(ExploreSchemaOutput {
            table_count: snapshot.schema.len(),
            schema: snapshot.schema.clone(),
            introspected_at: snapshot
                .introspected_at
                .unwrap_or_else(Utc::now)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// Render the current snapshot as generation context.
    pub async fn schema_context(
        &self,
        input: SchemaContextInput,
    ) -> NlqResult<SchemaContextOutput> {
        let snapshot = self.connection_manager.snapshot(&input.connection_id).await?;
        let context = render_schema_context(&snapshot.schema, &snapshot.documentation);
        Ok(SchemaContextOutput {
            context,
            table_count: snapshot.schema.len(),
        })
    }
}
