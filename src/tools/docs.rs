//! Documentation overlay tools.
//!
//! Users attach free-text descriptions to tables and columns; the overlay
//! feeds the rendered schema context. Setting documentation swaps the
//! connection snapshot while keeping the current schema, so the overlay
//! survives schema reloads and vice versa.

use crate::db::ConnectionManager;
use crate::error::NlqResult;
use crate::models::Documentation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the set_documentation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetDocumentationInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Documentation overlay: table name -> { description, columns: { column name -> description } }
    pub documentation: Documentation,
}

/// Output from the set_documentation tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SetDocumentationOutput {
    pub message: String,
    /// Number of documented tables in the overlay
    pub documented_tables: usize,
}

/// Input for the get_documentation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDocumentationInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
}

/// Output from the get_documentation tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetDocumentationOutput {
    pub documentation: Documentation,
}

/// Handler for documentation tools.
pub struct DocsToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl DocsToolHandler {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Replace the documentation overlay for a connection.
    pub async fn set_documentation(
        &self,
        input: SetDocumentationInput,
    ) -> NlqResult<SetDocumentationOutput> {
        let snapshot = self
            .connection_manager
            .install_documentation(&input.connection_id, input.documentation)
            .await?;

        let documented_tables = snapshot.documentation.tables.len();
        info!(
            connection_id = %input.connection_id,
            documented_tables,
            "Documentation saved"
        );

        Ok(SetDocumentationOutput {
            message: "Documentation saved successfully".to_string(),
            documented_tables,
        })
    }

    /// Fetch the current documentation overlay for a connection.
    pub async fn get_documentation(
        &self,
        input: GetDocumentationInput,
    ) -> NlqResult<GetDocumentationOutput> {
        let snapshot = self.connection_manager.snapshot(&input.connection_id).await?;
        Ok(GetDocumentationOutput {
            documentation: snapshot.documentation.clone(),
        })
    }
}
