//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `explore_schema` / `schema_context`: introspection and context rendering
//! - `set_documentation` / `get_documentation`: the documentation overlay
//! - `generate_query` / `validate_query`: NL-to-SQL translation and scoring
//! - `query`: read-only SELECT execution
//! - `guard`: SELECT-only statement validation
//! - `format`: tabular output rendering

pub mod docs;
pub mod format;
pub mod generate;
pub mod guard;
pub mod query;
pub mod schema;

pub use docs::{
    DocsToolHandler, GetDocumentationInput, GetDocumentationOutput, SetDocumentationInput,
    SetDocumentationOutput,
};
pub use generate::{
    GenerateQueryInput, GenerateQueryOutput, GenerateToolHandler, ValidateQueryInput,
    ValidateQueryOutput,
};
pub use query::{QueryInput, QueryOutput, QueryToolHandler};
pub use schema::{
    ExploreSchemaInput, ExploreSchemaOutput, SchemaContextInput, SchemaContextOutput,
    SchemaToolHandler,
};
