//! Natural-language query core.
//!
//! This module contains the translation-and-assessment engine:
//! - `context`: renders a schema + documentation pair into prompt context
//! - `completion`: client for the remote completion service
//! - `generator`: question -> SQL, remote strategy with pattern fallback
//! - `validator`: heuristic confidence scoring of (question, SQL) pairs
//!
//! Everything here except the completion client is a pure, synchronous
//! computation over its inputs and can run concurrently without locking.

pub mod completion;
pub mod context;
pub mod generator;
pub mod validator;

pub use completion::{CompletionClient, CompletionConfig};
pub use context::render_schema_context;
pub use generator::{GeneratedQuery, GenerationMethod, generate_query, pattern_query};
pub use validator::{Validation, ValidationStatus, validate_query};
