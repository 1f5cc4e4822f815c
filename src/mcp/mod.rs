//! MCP (Model Context Protocol) server module.
//!
//! Provides a JSON-RPC 2.0 over STDIO interface for AI agents
//! to extract video IDs and download transcripts.

pub mod server;
pub mod tools;
pub mod types;

pub use server::McpServer;
