//! Model Context Protocol (MCP) integration for thinkmcp.
//!
//! This module wires the session store into an MCP server so agent hosts can
//! drive reasoning traces over stdio. The surface area consists of:
//!
//! - Tools: `start-thinking`, `continue-thinking` (append, revise, or branch),
//!   and `review-thinking`.
//! - Resources: `think://sessions` and a templated
//!   `think://sessions/{session_id}` for JSON exports.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to
//! make tests and reviews small and targeted.

mod format;
pub mod handlers;
mod schemas;
mod server;

pub use server::ThinkMcpServer;
