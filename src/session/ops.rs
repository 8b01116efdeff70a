//! Stateless session lifecycle operations.
//!
//! Each operation validates its arguments, then either registers a new session
//! or submits a mutation closure to [`SessionStore::update`]. The operations
//! hold no state of their own; the store reference is injected by the caller.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::get_config;
use crate::session::store::SessionStore;
use crate::session::{SessionError, SessionStatus, ThinkingSession, Thought};

/// Arguments accepted by [`start`].
#[derive(Debug, Default)]
pub struct StartRequest {
    /// Problem statement the new session will reason about.
    pub problem: String,
    /// Explicit session id; a fresh UUID is generated when omitted.
    pub session_id: Option<String>,
    /// Initial estimate of steps needed; configuration default when omitted.
    pub estimated_steps: Option<u32>,
}

/// Arguments accepted by [`append`].
#[derive(Debug)]
pub struct AppendRequest {
    /// Session to extend.
    pub session_id: String,
    /// Content of the new thought.
    pub thought: String,
    /// Whether the caller expects further steps; `false` completes the session.
    pub next_needed: bool,
    /// Updated estimate of total steps, when the caller supplies one.
    pub estimated_total: Option<u32>,
    /// Branch origin recorded on the appended thought, set by the branch flow.
    pub parent_index: Option<u32>,
}

/// Arguments accepted by [`revise`].
#[derive(Debug)]
pub struct ReviseRequest {
    /// Session holding the thought to rewrite.
    pub session_id: String,
    /// 1-based index of the thought being reconsidered.
    pub step: u32,
    /// Replacement content.
    pub thought: String,
}

/// Create a new session and register it with the store.
pub fn start(store: &SessionStore, request: StartRequest) -> Result<ThinkingSession, SessionError> {
    if request.problem.trim().is_empty() {
        return Err(SessionError::InvalidArgument(
            "problem must not be empty".into(),
        ));
    }
    if request.estimated_steps == Some(0) {
        return Err(SessionError::InvalidArgument(
            "estimated_steps must be greater than zero".into(),
        ));
    }

    let id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let estimate = request
        .estimated_steps
        .unwrap_or(get_config().default_estimated_steps);

    let session = ThinkingSession::new(id, request.problem, estimate);
    tracing::debug!(session_id = %session.id, estimate, "Started thinking session");
    store.put(session.clone());
    Ok(session)
}

/// Append the next thought to a session.
///
/// The new thought's index is the sequence length plus one; `current_thought`
/// follows it. An estimate smaller than the new index is raised to match, and
/// `next_needed == false` transitions the session to `completed`.
pub fn append(
    store: &SessionStore,
    request: AppendRequest,
) -> Result<ThinkingSession, SessionError> {
    if request.thought.trim().is_empty() {
        return Err(SessionError::InvalidArgument(
            "thought must not be empty".into(),
        ));
    }
    if request.estimated_total == Some(0) {
        return Err(SessionError::InvalidArgument(
            "estimated_total must be greater than zero".into(),
        ));
    }

    store.update(&request.session_id, |mut session| {
        let index = session.thoughts.len() as u32 + 1;
        let now = OffsetDateTime::now_utc();
        session.thoughts.push(Thought {
            index,
            content: request.thought.clone(),
            created_at: now,
            revised: false,
            parent_index: request.parent_index,
        });
        session.current_thought = index;
        if let Some(estimate) = request.estimated_total {
            session.estimated_total = estimate;
        }
        if index > session.estimated_total {
            session.estimated_total = index;
        }
        if !request.next_needed {
            session.status = SessionStatus::Completed;
        }
        session.last_activity_at = now;
        Ok(session)
    })
}

/// Rewrite the content of an existing thought in place.
///
/// Out-of-range steps fail with `InvalidArgument` and leave the session
/// untouched. Revision stays legal on completed sessions.
pub fn revise(
    store: &SessionStore,
    request: ReviseRequest,
) -> Result<ThinkingSession, SessionError> {
    if request.thought.trim().is_empty() {
        return Err(SessionError::InvalidArgument(
            "thought must not be empty".into(),
        ));
    }

    store.update(&request.session_id, |mut session| {
        let count = session.thoughts.len() as u32;
        if request.step == 0 || request.step > count {
            return Err(SessionError::InvalidArgument(format!(
                "revise step {} is out of range 1..={count}",
                request.step
            )));
        }
        let slot = (request.step - 1) as usize;
        session.thoughts[slot].content = request.thought.clone();
        session.thoughts[slot].revised = true;
        session.last_activity_at = OffsetDateTime::now_utc();
        Ok(session)
    })
}

/// Fork a session into an independently evolving branch.
///
/// Two independent writes: a compare-and-swap on the parent records the
/// deterministic branch id (`{parent}_branch_{n}`), then the child (a value
/// copy of the parent's thoughts at that moment) is registered with `put`.
/// The writes are not atomic with each other: a failure between them leaves
/// the parent referencing a branch id with no session row.
pub fn branch(store: &SessionStore, parent_id: &str) -> Result<ThinkingSession, SessionError> {
    let mut branch_id = String::new();
    let parent = store.update(parent_id, |mut session| {
        branch_id = format!("{}_branch_{}", session.id, session.branches.len() + 1);
        session.branches.push(branch_id.clone());
        session.last_activity_at = OffsetDateTime::now_utc();
        Ok(session)
    })?;

    let now = OffsetDateTime::now_utc();
    let child = ThinkingSession {
        id: branch_id,
        problem: parent.problem.clone(),
        thoughts: parent.thoughts.clone(),
        current_thought: parent.thoughts.len() as u32,
        estimated_total: parent.estimated_total,
        status: SessionStatus::Active,
        created_at: now,
        last_activity_at: now,
        branches: Vec::new(),
        version: ThinkingSession::INITIAL_VERSION,
    };
    tracing::debug!(parent_id, branch_id = %child.id, "Forked thinking session");
    store.put(child.clone());
    Ok(child)
}
