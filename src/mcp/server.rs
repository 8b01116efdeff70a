//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, collections::HashMap, future::Future, pin::Pin, sync::Arc};

use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, RawResource, RawResourceTemplate,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceTemplate,
        ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};

use crate::{
    mcp::{
        format::{json_resource_contents, serialize_json},
        handlers::thinking::{handle_continue, handle_review, handle_start, map_session_error},
        schemas,
    },
    session::{export, store::SessionStore},
};

const SESSIONS_URI: &str = "think://sessions";
const SESSION_TEMPLATE_URI: &str = "think://sessions/{session_id}";
const SESSION_PREFIX: &str = "think://sessions/";

type ResourceFuture = Pin<Box<dyn Future<Output = Result<ReadResourceResult, McpError>> + Send>>;
type ToolFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, McpError>> + Send>>;

type ResourceHandler = fn(&ThinkMcpServer, ReadResourceRequestParam) -> ResourceFuture;
type ToolHandler = fn(&ThinkMcpServer, CallToolRequestParam) -> ToolFuture;

/// MCP server implementation exposing the sequential-thinking operations.
#[derive(Clone)]
pub struct ThinkMcpServer {
    store: Arc<SessionStore>,
    tools: Arc<HashMap<&'static str, ToolHandler>>,
    resources: Arc<HashMap<&'static str, ResourceHandler>>,
}

impl ThinkMcpServer {
    /// Create a new MCP server around the supplied session store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        let tools: HashMap<&'static str, ToolHandler> = HashMap::from([
            ("start-thinking", tool_start as ToolHandler),
            ("continue-thinking", tool_continue as ToolHandler),
            ("review-thinking", tool_review as ToolHandler),
        ]);
        let resources: HashMap<&'static str, ResourceHandler> =
            HashMap::from([(SESSIONS_URI, resource_sessions as ResourceHandler)]);

        Self {
            store,
            tools: Arc::new(tools),
            resources: Arc::new(resources),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed("start-thinking"),
                title: Some("Start Thinking Session".to_string()),
                description: Some(Cow::Borrowed(
                    "Begin a structured reasoning session for a problem; returns the session id the other tools take.",
                )),
                input_schema: Arc::new(schemas::start_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Start Thinking Session")
                        .destructive(false)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("continue-thinking"),
                title: Some("Continue Thinking".to_string()),
                description: Some(Cow::Borrowed(
                    "Record the next thought in a session. Set revise_step to rewrite an earlier step, create_branch to fork an alternate path, and next_thought_needed=false when the answer is reached.",
                )),
                input_schema: Arc::new(schemas::continue_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Continue Thinking")
                        .destructive(false)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("review-thinking"),
                title: Some("Review Thinking".to_string()),
                description: Some(Cow::Borrowed(
                    "Render the full thought sequence of a session in order, with revision markers and branch ids.",
                )),
                input_schema: Arc::new(schemas::review_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Review Thinking")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut sessions = RawResource::new(SESSIONS_URI, "sessions");
        sessions.description = Some("JSON export of every thinking session".into());

        vec![sessions.no_annotation()]
    }

    fn describe_resource_templates(&self) -> Vec<ResourceTemplate> {
        let session_template = RawResourceTemplate {
            uri_template: SESSION_TEMPLATE_URI.into(),
            name: "session".into(),
            title: Some("Thinking Session".into()),
            description: Some(
                "Export one session: replace {session_id} and call readResource".into(),
            ),
            mime_type: Some(super::format::APPLICATION_JSON.into()),
        };

        vec![session_template.no_annotation()]
    }
}

fn resource_sessions(
    server: &ThinkMcpServer,
    _request: ReadResourceRequestParam,
) -> ResourceFuture {
    let store = server.store.clone();
    Box::pin(async move {
        let payload = export::export_all(&store).map_err(map_session_error)?;
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SESSIONS_URI,
                serialize_json(&payload, SESSIONS_URI),
            )],
        })
    })
}

fn tool_start(server: &ThinkMcpServer, request: CallToolRequestParam) -> ToolFuture {
    let store = server.store.clone();
    Box::pin(async move { handle_start(&store, request.arguments).await })
}

fn tool_continue(server: &ThinkMcpServer, request: CallToolRequestParam) -> ToolFuture {
    let store = server.store.clone();
    Box::pin(async move { handle_continue(&store, request.arguments).await })
}

fn tool_review(server: &ThinkMcpServer, request: CallToolRequestParam) -> ToolFuture {
    let store = server.store.clone();
    Box::pin(async move { handle_review(&store, request.arguments).await })
}

impl ServerHandler for ThinkMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "thinkmcp".to_string();
        implementation.title = Some("Sequential Thinking MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server for dynamic, reflective problem-solving: start a session, record one thought per step, revise or branch earlier thinking as understanding deepens, and stop only when a satisfactory answer is reached.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        let templates = self.describe_resource_templates();
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(templates)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        let store = self.store.clone();
        async move {
            let uri = request.uri.clone();
            if let Some(session_id) = uri.strip_prefix(SESSION_PREFIX) {
                if session_id.is_empty() {
                    return Err(McpError::invalid_params(
                        "Session identifier missing in resource URI",
                        None,
                    ));
                }
                let payload = export::export_session(&store, session_id)
                    .map_err(map_session_error)?;
                return Ok(ReadResourceResult {
                    contents: vec![json_resource_contents(&uri, serialize_json(&payload, &uri))],
                });
            }

            if let Some(handler) = self.resources.get(uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
