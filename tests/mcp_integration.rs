use std::sync::{Arc, Once};

use rmcp::{
    handler::client::ClientHandler,
    handler::server::ServerHandler,
    model::{self, CallToolRequestParam, ClientInfo, PaginatedRequestParam, ReadResourceRequestParam},
    service::{RoleClient, RoleServer, RunningService, serve_directly},
    transport::async_rw::AsyncRwTransport,
};
use serde_json::json;
use thinkmcp::{config, logging, mcp::ThinkMcpServer, session::store::SessionStore};
use tokio::io::split;

static INIT: Once = Once::new();

#[derive(Clone, Default)]
struct DummyClientHandler;

impl ClientHandler for DummyClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

struct TestHarness {
    service: RunningService<RoleClient, DummyClientHandler>,
    server: RunningService<RoleServer, ThinkMcpServer>,
}

impl TestHarness {
    async fn new() -> Self {
        INIT.call_once(|| {
            config::init_config();
            logging::init_tracing();
        });

        // Each harness gets its own store, so tests never share sessions.
        let store = Arc::new(SessionStore::new(64));
        let server = ThinkMcpServer::new(store);

        let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
        let (client_read, client_write) = split(client_stream);
        let (server_read, server_write) = split(server_stream);

        let client_transport = AsyncRwTransport::new_client(client_read, client_write);
        let server_transport = AsyncRwTransport::new_server(server_read, server_write);

        let server_info = server.get_info();
        let client_handler = DummyClientHandler;
        let client_info = ClientHandler::get_info(&client_handler);

        let server =
            serve_directly::<RoleServer, _, _, _, _>(server, server_transport, Some(client_info));

        let service = serve_directly::<RoleClient, _, _, _, _>(
            client_handler,
            client_transport,
            Some(server_info),
        );

        Self { service, server }
    }

    async fn shutdown(self) {
        let Self { service, server } = self;
        let _ = service.cancel().await;
        let _ = server.cancel().await;
    }
}

async fn call(
    harness: &TestHarness,
    name: &'static str,
    arguments: serde_json::Value,
) -> rmcp::model::CallToolResult {
    harness
        .service
        .call_tool(CallToolRequestParam {
            name: name.into(),
            arguments: Some(arguments.as_object().expect("object arguments").clone()),
        })
        .await
        .unwrap_or_else(|err| panic!("{name} call failed: {err:?}"))
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let harness = TestHarness::new().await;
    let service = &harness.service;

    let info = service
        .peer_info()
        .expect("server info should be initialized");
    assert_eq!(info.server_info.name, "thinkmcp");
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());

    let tools_result = service
        .list_tools(Some(PaginatedRequestParam { cursor: None }))
        .await
        .expect("list_tools");

    let names: Vec<_> = tools_result
        .tools
        .iter()
        .map(|tool| tool.name.as_ref())
        .collect();

    assert!(names.contains(&"start-thinking"));
    assert!(names.contains(&"continue-thinking"));
    assert!(names.contains(&"review-thinking"));

    harness.shutdown().await;
}

#[tokio::test]
async fn start_continue_review_round_trip() {
    let harness = TestHarness::new().await;

    let started = call(
        &harness,
        "start-thinking",
        json!({ "problem": "plan a trip", "estimated_steps": 3 }),
    )
    .await;
    assert_eq!(started.is_error, Some(false));
    let payload = started.structured_content.expect("structured payload");
    assert_eq!(payload["status"], "active");
    assert_eq!(payload["totalThoughts"], 3);
    let session_id = payload["sessionId"]
        .as_str()
        .expect("session id present")
        .to_string();

    let first = call(
        &harness,
        "continue-thinking",
        json!({
            "session_id": session_id,
            "thought": "pick destination",
            "next_thought_needed": true
        }),
    )
    .await;
    let payload = first.structured_content.expect("structured payload");
    assert_eq!(payload["thoughtNumber"], 1);
    assert_eq!(payload["nextThoughtNeeded"], true);
    assert_eq!(payload["status"], "active");

    let second = call(
        &harness,
        "continue-thinking",
        json!({
            "session_id": session_id,
            "thought": "book flight",
            "next_thought_needed": false
        }),
    )
    .await;
    let payload = second.structured_content.expect("structured payload");
    assert_eq!(payload["historyLength"], 2);
    assert_eq!(payload["status"], "completed");
    assert_eq!(payload["nextThoughtNeeded"], false);

    let review = call(
        &harness,
        "review-thinking",
        json!({ "session_id": session_id }),
    )
    .await;
    let text = review
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("review text");
    assert!(text.contains("1. pick destination"));
    assert!(text.contains("2. book flight"));
    assert!(!text.contains("[revised]"));

    harness.shutdown().await;
}

#[tokio::test]
async fn revision_and_branching_flow() {
    let harness = TestHarness::new().await;

    let started = call(
        &harness,
        "start-thinking",
        json!({ "problem": "choose an algorithm", "session_id": "algo" }),
    )
    .await;
    assert_eq!(
        started.structured_content.expect("payload")["sessionId"],
        "algo"
    );

    for thought in ["survey options", "try quicksort"] {
        call(
            &harness,
            "continue-thinking",
            json!({ "session_id": "algo", "thought": thought }),
        )
        .await;
    }

    let revised = call(
        &harness,
        "continue-thinking",
        json!({
            "session_id": "algo",
            "thought": "try mergesort for stability",
            "revise_step": 2
        }),
    )
    .await;
    let payload = revised.structured_content.expect("structured payload");
    assert_eq!(payload["revisedThought"], 2);
    assert_eq!(payload["historyLength"], 2);

    let branched = call(
        &harness,
        "continue-thinking",
        json!({
            "session_id": "algo",
            "thought": "what about a radix sort?",
            "create_branch": true
        }),
    )
    .await;
    let payload = branched.structured_content.expect("structured payload");
    assert_eq!(payload["sessionId"], "algo_branch_1");
    assert_eq!(payload["branchedFrom"], "algo");
    assert_eq!(payload["historyLength"], 3);

    let review = call(&harness, "review-thinking", json!({ "session_id": "algo" })).await;
    let text = review
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("review text");
    assert!(text.contains("[revised] try mergesort for stability"));
    assert!(text.contains("Branches: algo_branch_1"));

    harness.shutdown().await;
}

#[tokio::test]
async fn invalid_payload_returns_error() {
    let harness = TestHarness::new().await;

    let err = harness
        .service
        .call_tool(CallToolRequestParam {
            name: "start-thinking".into(),
            arguments: Some(json!({ "problem": "  " }).as_object().unwrap().clone()),
        })
        .await
        .expect_err("start should fail");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    let err = harness
        .service
        .call_tool(CallToolRequestParam {
            name: "continue-thinking".into(),
            arguments: Some(
                json!({ "session_id": "missing", "thought": "step" })
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
        })
        .await
        .expect_err("continue against unknown session should fail");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn blank_thought_with_create_branch_leaves_parent_untouched() {
    let harness = TestHarness::new().await;

    call(
        &harness,
        "start-thinking",
        json!({ "problem": "plan a trip", "session_id": "trip" }),
    )
    .await;

    let err = harness
        .service
        .call_tool(CallToolRequestParam {
            name: "continue-thinking".into(),
            arguments: Some(
                json!({ "session_id": "trip", "thought": "   ", "create_branch": true })
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
        })
        .await
        .expect_err("blank thought should fail before any write");
    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    // The parent was not forked and no child session appeared.
    let all = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "think://sessions".into(),
        })
        .await
        .expect("read all sessions");
    let text = match all.contents.first().expect("contents present") {
        model::ResourceContents::TextResourceContents { text, .. } => text.clone(),
        other => panic!("expected text contents, got {other:?}"),
    };
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON export");
    assert_eq!(value["count"], 1);
    assert_eq!(value["sessions"][0]["id"], "trip");
    assert_eq!(value["sessions"][0]["version"], 1);
    assert_eq!(
        value["sessions"][0]["branches"].as_array().map(Vec::len),
        Some(0)
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn session_resources_export_json() {
    let harness = TestHarness::new().await;

    call(
        &harness,
        "start-thinking",
        json!({ "problem": "plan a trip", "session_id": "trip" }),
    )
    .await;
    call(
        &harness,
        "continue-thinking",
        json!({ "session_id": "trip", "thought": "pick destination" }),
    )
    .await;

    let all = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "think://sessions".into(),
        })
        .await
        .expect("read all sessions");
    let text = match all.contents.first().expect("contents present") {
        model::ResourceContents::TextResourceContents { text, .. } => text.clone(),
        other => panic!("expected text contents, got {other:?}"),
    };
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON export");
    assert_eq!(value["count"], 1);
    assert_eq!(value["sessions"][0]["id"], "trip");

    let one = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "think://sessions/trip".into(),
        })
        .await
        .expect("read one session");
    let text = match one.contents.first().expect("contents present") {
        model::ResourceContents::TextResourceContents { text, .. } => text.clone(),
        other => panic!("expected text contents, got {other:?}"),
    };
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON export");
    assert_eq!(value["id"], "trip");
    assert_eq!(value["thoughts"].as_array().map(Vec::len), Some(1));

    let err = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "think://nope".into(),
        })
        .await
        .expect_err("unknown resource should fail");
    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    harness.shutdown().await;
}
