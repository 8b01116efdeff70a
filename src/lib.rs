#![deny(missing_docs)]

//! Core library for the thinkmcp sequential-thinking MCP server.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Reasoning-session data model, store, and lifecycle operations.
pub mod session;
