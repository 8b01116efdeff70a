//! Handlers for the sequential-thinking tools.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, JsonObject},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    mcp::format::{BannerKind, log_thought},
    session::{
        SessionError, SessionStatus, ThinkingSession, export,
        ops::{self, AppendRequest, ReviseRequest, StartRequest},
        store::SessionStore,
    },
};

use super::parse_arguments;

/// Request payload accepted by the `start-thinking` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct StartToolRequest {
    /// Problem statement the new session reasons about.
    pub(crate) problem: String,
    /// Optional explicit session id.
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    /// Optional initial estimate of steps.
    #[serde(default)]
    pub(crate) estimated_steps: Option<u32>,
}

/// Request payload accepted by the `continue-thinking` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct ContinueToolRequest {
    /// Session to extend, revise, or branch.
    pub(crate) session_id: String,
    /// The thinking step itself.
    pub(crate) thought: String,
    /// Whether further steps are expected; `false` completes the session.
    #[serde(default)]
    pub(crate) next_thought_needed: Option<bool>,
    /// When set, rewrite this earlier step instead of appending.
    #[serde(default)]
    pub(crate) revise_step: Option<u32>,
    /// When true, fork a branch and record the thought there.
    #[serde(default)]
    pub(crate) create_branch: Option<bool>,
    /// Updated estimate of total steps.
    #[serde(default)]
    pub(crate) estimated_total: Option<u32>,
}

/// Request payload accepted by the `review-thinking` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct ReviewToolRequest {
    /// Session to render.
    pub(crate) session_id: String,
}

/// Handle the `start-thinking` tool by registering a fresh session.
pub(crate) async fn handle_start(
    store: &Arc<SessionStore>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: StartToolRequest = parse_arguments(arguments)?;
    let session = ops::start(
        store,
        StartRequest {
            problem: args.problem,
            session_id: args.session_id,
            estimated_steps: args.estimated_steps,
        },
    )
    .map_err(map_session_error)?;

    Ok(CallToolResult::structured(json!({
        "sessionId": session.id,
        "status": session.status.label(),
        "totalThoughts": session.estimated_total,
        "version": session.version,
    })))
}

/// Handle the `continue-thinking` tool.
///
/// One tool multiplexes the three mutation paths: `revise_step` rewrites an
/// earlier thought, `create_branch` forks an alternate path and records the
/// thought there, and the default appends to the named session.
/// `next_thought_needed` and `estimated_total` apply only when a thought is
/// appended; a revision changes nothing but the target's content.
pub(crate) async fn handle_continue(
    store: &Arc<SessionStore>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ContinueToolRequest = parse_arguments(arguments)?;
    if args.revise_step.is_some() && args.create_branch == Some(true) {
        return Err(McpError::invalid_params(
            "`revise_step` and `create_branch` are mutually exclusive",
            None,
        ));
    }
    // Reject bad input before any store write; the branch path in particular
    // must not fork the parent and then fail on an empty thought.
    if args.thought.trim().is_empty() {
        return Err(McpError::invalid_params("`thought` must not be empty", None));
    }
    if args.estimated_total == Some(0) {
        return Err(McpError::invalid_params(
            "`estimated_total` must be greater than zero",
            None,
        ));
    }
    let next_needed = args.next_thought_needed.unwrap_or(true);

    if let Some(step) = args.revise_step {
        let session = ops::revise(
            store,
            ReviseRequest {
                session_id: args.session_id,
                step,
                thought: args.thought.clone(),
            },
        )
        .map_err(map_session_error)?;
        log_thought(
            &BannerKind::Revision { step },
            session.current_thought,
            session.estimated_total,
            &args.thought,
        );
        let mut payload = session_payload(&session);
        payload["revisedThought"] = json!(step);
        return Ok(CallToolResult::structured(payload));
    }

    if args.create_branch == Some(true) {
        let child = ops::branch(store, &args.session_id).map_err(map_session_error)?;
        let origin = (child.current_thought > 0).then_some(child.current_thought);
        let child = ops::append(
            store,
            AppendRequest {
                session_id: child.id,
                thought: args.thought.clone(),
                next_needed,
                estimated_total: args.estimated_total,
                parent_index: origin,
            },
        )
        .map_err(map_session_error)?;
        log_thought(
            &BannerKind::Branch {
                from: origin.unwrap_or(0),
                id: child.id.clone(),
            },
            child.current_thought,
            child.estimated_total,
            &args.thought,
        );
        let mut payload = session_payload(&child);
        payload["branchedFrom"] = json!(args.session_id);
        return Ok(CallToolResult::structured(payload));
    }

    let session = ops::append(
        store,
        AppendRequest {
            session_id: args.session_id,
            thought: args.thought.clone(),
            next_needed,
            estimated_total: args.estimated_total,
            parent_index: None,
        },
    )
    .map_err(map_session_error)?;
    log_thought(
        &BannerKind::Thought,
        session.current_thought,
        session.estimated_total,
        &args.thought,
    );
    Ok(CallToolResult::structured(session_payload(&session)))
}

/// Handle the `review-thinking` tool by rendering a snapshot of one session.
pub(crate) async fn handle_review(
    store: &Arc<SessionStore>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ReviewToolRequest = parse_arguments(arguments)?;
    let snapshot = store
        .snapshot(&args.session_id)
        .map_err(map_session_error)?;
    Ok(CallToolResult::success(vec![Content::text(
        export::render_review(&snapshot),
    )]))
}

/// Shared response body describing the session after a mutation.
fn session_payload(session: &ThinkingSession) -> Value {
    json!({
        "sessionId": session.id,
        "thoughtNumber": session.current_thought,
        "totalThoughts": session.estimated_total,
        "nextThoughtNeeded": session.status == SessionStatus::Active,
        "status": session.status.label(),
        "branches": session.branches,
        "historyLength": session.thoughts.len(),
        "version": session.version,
    })
}

/// Translate store/operation failures into MCP error codes.
pub(crate) fn map_session_error(err: SessionError) -> McpError {
    match err {
        SessionError::NotFound(_) | SessionError::InvalidArgument(_) => {
            McpError::invalid_params(err.to_string(), None)
        }
        SessionError::Conflict { .. } | SessionError::Serialization(_) => {
            McpError::internal_error(err.to_string(), None)
        }
    }
}
