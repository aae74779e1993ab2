//! Query generation and validation tools.
//!
//! `generate_query` turns a plain-language question into a candidate SELECT
//! statement using the current snapshot, and always scores the generated
//! pair. `validate_query` scores a caller-supplied (question, SQL) pair.

use crate::db::ConnectionManager;
use crate::error::{NlqError, NlqResult};
use crate::nlq::{
    CompletionClient, GenerationMethod, Validation, generate_query, validate_query,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the generate_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateQueryInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Plain-language question about the data
    pub question: String,
}

/// Output from the generate_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GenerateQueryOutput {
    /// Candidate SELECT statement
    pub query: String,
    /// Strategy that produced it: "ai" or "pattern"
    pub method: GenerationMethod,
    /// Automated assessment of how well the query matches the question
    pub validation: Validation,
}

/// Input for the validate_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ValidateQueryInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// The question the query is supposed to answer
    pub question: String,
    /// The SQL statement to assess
    pub query: String,
}

/// Output from the validate_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ValidateQueryOutput {
    pub validation: Validation,
}

/// Handler for generation and validation tools.
pub struct GenerateToolHandler {
    connection_manager: Arc<ConnectionManager>,
    completion: Option<Arc<CompletionClient>>,
}

impl GenerateToolHandler {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        completion: Option<Arc<CompletionClient>>,
    ) -> Self {
        Self {
            connection_manager,
            completion,
        }
    }

    /// Generate a candidate query for a question and score it.
    pub async fn generate_query(
        &self,
        input: GenerateQueryInput,
    ) -> NlqResult<GenerateQueryOutput> {
        let question = input.question.trim();
        if question.is_empty() {
            return Err(NlqError::invalid_input("Question is required"));
        }

        let snapshot = self.connection_manager.snapshot(&input.connection_id).await?;

        let generated = generate_query(
            question,
            &snapshot.schema,
            &snapshot.documentation,
            self.completion.as_deref(),
        )
        .await;

        let validation = validate_query(question, &generated.query, &snapshot.schema);

        info!(
            connection_id = %input.connection_id,
            method = %generated.method,
            confidence = validation.confidence,
            "Query generated"
        );

        Ok(GenerateQueryOutput {
            query: generated.query,
            method: generated.method,
            validation,
        })
    }

    /// Score a caller-supplied (question, SQL) pair.
    pub async fn validate_query(
        &self,
        input: ValidateQueryInput,
    ) -> NlqResult<ValidateQueryOutput> {
        let question = input.question.trim();
        if question.is_empty() {
            return Err(NlqError::invalid_input("Question is required"));
        }
        if input.query.trim().is_empty() {
            return Err(NlqError::invalid_input("Query is required"));
        }

        let snapshot = self.connection_manager.snapshot(&input.connection_id).await?;
        let validation = validate_query(question, &input.query, &snapshot.schema);

        Ok(ValidateQueryOutput { validation })
    }
}
