//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes the sequential-thinking tools and resources over
//! stdio. This mode is designed for editor/agent integrations; all session state lives in
//! memory and ends with the process.
use anyhow::{Context, Result};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;
use thinkmcp::{config, logging, mcp::ThinkMcpServer, session::store::SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing();

    let store = Arc::new(SessionStore::from_config());
    let server = ThinkMcpServer::new(store);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
