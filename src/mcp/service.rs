//! MCP service implementation using rmcp.
//!
//! This module defines the NlqService struct with all tools exposed via the
//! MCP protocol using the rmcp framework's macros.

use crate::db::{ConnectionManager, ConnectionSummary};
use crate::error::NlqError;
use crate::nlq::CompletionClient;
use crate::tools::docs::{
    DocsToolHandler, GetDocumentationInput, GetDocumentationOutput, SetDocumentationInput,
    SetDocumentationOutput,
};
use crate::tools::generate::{
    GenerateQueryInput, GenerateQueryOutput, GenerateToolHandler, ValidateQueryInput,
    ValidateQueryOutput,
};
use crate::tools::query::{QueryInput, QueryOutput, QueryToolHandler};
use crate::tools::schema::{
    ExploreSchemaInput, ExploreSchemaOutput, SchemaContextInput, SchemaContextOutput,
    SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;

/// Output for the list_connections tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListConnectionsOutput {
    /// List of available database connections
    pub connections: Vec<ConnectionSummary>,
    /// Number of connections
    pub count: usize,
}

/// Per-connection status for the status tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ConnectionStatus {
    pub connection_id: String,
    pub connected: bool,
    /// True once explore_schema has run
    pub has_schema: bool,
    /// True when a documentation overlay is set
    pub has_documentation: bool,
}

/// Output for the status tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct StatusOutput {
    pub connections: Vec<ConnectionStatus>,
    /// True when the completion service is configured (generation may use "ai")
    pub ai_enabled: bool,
}

#[derive(Clone)]
pub struct NlqService {
    /// Shared connection manager for all database operations
    connection_manager: Arc<ConnectionManager>,
    /// Remote completion client; None when no API key is configured
    completion: Option<Arc<CompletionClient>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl NlqService {
    /// Create a new NlqService instance.
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        completion: Option<Arc<CompletionClient>>,
    ) -> Self {
        Self {
            connection_manager,
            completion,
            tool_router: Self::tool_router(),
        }
    }

    /// Validate connection ID - ensure it is provided and non-empty.
    ///
    /// Returns the trimmed connection ID if valid, otherwise returns an
    /// error guiding the user to call list_connections first.
    fn validate_connection_id(&self, provided: &str) -> Result<String, McpError> {
        let trimmed = provided.trim();
        if trimmed.is_empty() {
            Err(McpError::invalid_params(
                "connection_id is required. Call list_connections first to get available database IDs.",
                None,
            ))
        } else {
            Ok(trimmed.to_string())
        }
    }
}

#[tool_router]
impl NlqService {
    #[tool(
        description = "List all available database connections.\nReturns connection IDs, types (MySQL/PostgreSQL/SQLite), and whether each schema has been explored."
    )]
    async fn list_connections(&self) -> Json<ListConnectionsOutput> {
        let connections = self.connection_manager.list_connections_detail().await;
        let count = connections.len();
        Json(ListConnectionsOutput { connections, count })
    }

    #[tool(
        description = "Get the current server status.\nReports, per connection, whether a schema has been explored and documentation has been set, plus whether AI generation is available."
    )]
    async fn status(&self) -> Json<StatusOutput> {
        let summaries = self.connection_manager.list_connections_detail().await;
        let mut connections = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let (has_schema, has_documentation) =
                match self.connection_manager.snapshot(&summary.id).await {
                    Ok(snapshot) => (
                        snapshot.has_schema(),
                        !snapshot.documentation.is_empty(),
                    ),
                    Err(_) => (false, false),
                };
            connections.push(ConnectionStatus {
                connection_id: summary.id,
                connected: true,
                has_schema,
                has_documentation,
            });
        }
        Json(StatusOutput {
            connections,
            ai_enabled: self.completion.is_some(),
        })
    }

    #[tool(
        description = "Introspect the database schema.\nReturns tables with columns, primary/foreign keys, up to 5 sample rows and row counts, and makes the schema available to generate_query.\nRun this before generating queries, and again after schema changes."
    )]
    async fn explore_schema(
        &self,
        Parameters(input): Parameters<ExploreSchemaInput>,
    ) -> Result<Json<ExploreSchemaOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler = SchemaToolHandler::new(self.connection_manager.clone());
        handler
            .explore_schema(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(
        description = "Render the explored schema plus documentation as the text block used as query-generation context."
    )]
    async fn schema_context(
        &self,
        Parameters(input): Parameters<SchemaContextInput>,
    ) -> Result<Json<SchemaContextOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler = SchemaToolHandler::new(self.connection_manager.clone());
        handler
            .schema_context(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(
        description = "Save free-text documentation for tables and columns.\nThe overlay improves generation context and survives schema re-exploration.\nFormat: { \"table\": { \"description\": \"...\", \"columns\": { \"col\": \"...\" } } }"
    )]
    async fn set_documentation(
        &self,
        Parameters(input): Parameters<SetDocumentationInput>,
    ) -> Result<Json<SetDocumentationOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler = DocsToolHandler::new(self.connection_manager.clone());
        handler
            .set_documentation(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(description = "Get the current table/column documentation overlay.")]
    async fn get_documentation(
        &self,
        Parameters(input): Parameters<GetDocumentationInput>,
    ) -> Result<Json<GetDocumentationOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler = DocsToolHandler::new(self.connection_manager.clone());
        handler
            .get_documentation(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(
        description = "Generate a SQL SELECT query from a plain-language question.\nUses the explored schema (run explore_schema first) and the remote completion service when configured, with a deterministic pattern fallback.\nReturns the query, which strategy produced it (\"ai\" or \"pattern\"), and a validation with a 20-100 confidence score, issues and suggestions."
    )]
    async fn generate_query(
        &self,
        Parameters(input): Parameters<GenerateQueryInput>,
    ) -> Result<Json<GenerateQueryOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler =
            GenerateToolHandler::new(self.connection_manager.clone(), self.completion.clone());
        handler
            .generate_query(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(
        description = "Check how well a SQL query answers a plain-language question.\nReturns status (good/warning/error), a 20-100 confidence score, and any issues and suggestions."
    )]
    async fn validate_query(
        &self,
        Parameters(input): Parameters<ValidateQueryInput>,
    ) -> Result<Json<ValidateQueryOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler =
            GenerateToolHandler::new(self.connection_manager.clone(), self.completion.clone());
        handler
            .validate_query(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }

    #[tool(
        description = "Execute a SELECT query and return results.\nOnly statements beginning with SELECT are accepted; everything else is rejected.\nOutput format: json (default), table, or markdown."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<QueryOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        let handler = QueryToolHandler::new(self.connection_manager.clone());
        handler
            .query(input)
            .await
            .map(Json)
            .map_err(|e: NlqError| e.into())
    }
}

#[tool_handler]
impl ServerHandler for NlqService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nlq-mcp-server".to_owned(),
                title: Some("NLQ MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Ask plain-language questions about a SQL database and get candidate SELECT queries with a confidence assessment.\n\
                \n\
                ## Workflow\n\
                1. Call `list_connections` to get available database IDs\n\
                2. Call `explore_schema` once per connection to introspect tables\n\
                3. Optionally `set_documentation` to describe tables and columns\n\
                4. Call `generate_query` with a question; inspect the returned validation\n\
                5. Execute the candidate with `query` (SELECT-only)\n\
                \n\
                ## Notes\n\
                - `generate_query` uses the remote completion service when the server was\n\
                  started with an API key, and a deterministic keyword fallback otherwise;\n\
                  the `method` field tells you which one produced the query.\n\
                - The validation confidence is a heuristic in [20, 100]: >= 80 good,\n\
                  >= 60 warning, below that error. Issues list what is likely missing.\n\
                - Documentation survives `explore_schema`; re-explore after schema changes.\n\
                \n\
                ## Error: Missing connection_id\n\
                If you see \"connection_id is required\", call `list_connections` first."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> NlqService {
        let manager = Arc::new(ConnectionManager::new());
        NlqService::new(manager, None)
    }

    #[test]
    fn test_service_creation() {
        let _service = create_test_service();
    }

    #[test]
    fn test_validate_connection_id_with_valid() {
        let service = create_test_service();
        assert_eq!(service.validate_connection_id("mydb").unwrap(), "mydb");
    }

    #[test]
    fn test_validate_connection_id_trims_whitespace() {
        let service = create_test_service();
        assert_eq!(service.validate_connection_id("  mydb  ").unwrap(), "mydb");
    }

    #[test]
    fn test_validate_connection_id_rejects_empty() {
        let service = create_test_service();
        let err = service.validate_connection_id("").unwrap_err();
        assert!(err.to_string().contains("connection_id is required"));
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert!(!info.server_info.name.is_empty());
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_status_empty() {
        let service = create_test_service();
        let Json(status) = service.status().await;
        assert!(status.connections.is_empty());
        assert!(!status.ai_enabled);
    }
}
