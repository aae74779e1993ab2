//! NLQ MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for asking
//! plain-language questions about a SQL database (SQLite, PostgreSQL, MySQL)
//! and receiving candidate SELECT queries with an automated confidence score.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod nlq;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::NlqError;
pub use mcp::NlqService;
