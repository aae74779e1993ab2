//! MCP protocol service.

pub mod service;

pub use service::NlqService;
